//! Lexical path canonicalization.

/// Simplify a path without touching the disk: collapse `//`, drop `.`
/// components, and fold `..` into the preceding component when one exists.
/// Depfiles and command lines routinely contain paths like `src/../inc/x.h`.
pub fn canon_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                // "/.." is just "/".
                None if rooted => {}
                _ => parts.push(".."),
            },
            _ => parts.push(component),
        }
    }
    if parts.is_empty() {
        return if rooted { "/" } else { "." }.to_string();
    }
    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else {
        joined
    }
}
