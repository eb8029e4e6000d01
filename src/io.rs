//! Filesystem plumbing: project root discovery, directory enumeration, and
//! the depfile FIFO.

use crate::canon::canon_path;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Name of the manifest file marking the project root.
pub const UPDFILE_NAME: &str = "Updfile";

/// Directory under the root holding the persistent log and the depfile FIFO.
pub const CACHE_DIR_NAME: &str = ".upd";
pub const LOG_FILE_NAME: &str = "log";
pub const LOG_REWRITE_FILE_NAME: &str = "log_rewritten";
pub const DEPFILE_NAME: &str = "depfile";

/// Walk up from `from` to the nearest directory containing a regular file
/// named `Updfile`; all local paths are relative to that directory.
pub fn find_root_path_from(from: &Path) -> Result<PathBuf> {
    let mut dir = from;
    loop {
        let candidate = dir.join(UPDFILE_NAME);
        match std::fs::metadata(&candidate) {
            Ok(meta) if meta.is_file() => return Ok(dir.to_owned()),
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(Error::io(candidate)(err)),
        }
        dir = match dir.parent() {
            Some(parent) => parent,
            None => return Err(Error::RootNotFound),
        };
    }
}

/// Turn a path found on a command line or in a depfile into a local path:
/// lexically canonicalized, relative, and inside the project root.
pub fn localize_path(root: &Path, path: &str) -> Result<String> {
    let path = canon_path(path);
    let root_prefix = format!("{}/", root.display());
    if let Some(local) = path.strip_prefix(&root_prefix) {
        return Ok(local.to_string());
    }
    if path.starts_with('/') || path == ".." || path.starts_with("../") {
        return Err(Error::PathOutsideRoot { path });
    }
    Ok(path)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DirEntKind {
    Regular,
    Directory,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEnt {
    pub name: String,
    pub kind: DirEntKind,
}

/// Directory enumeration, indirected as a trait so the path-glob matcher can
/// run against synthetic trees in tests.  Implementations return entries in
/// name order and treat a missing directory as empty.
pub trait DirReader {
    fn read_dir(&self, path: &Path) -> Result<Vec<DirEnt>>;
}

pub struct FsDirReader;

impl DirReader for FsDirReader {
    fn read_dir(&self, path: &Path) -> Result<Vec<DirEnt>> {
        let entries = match std::fs::read_dir(path) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Error::io(path)(err)),
        };
        let mut result = Vec::new();
        for entry in entries {
            let entry = entry.map_err(Error::io(path))?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                // Non-UTF-8 names cannot appear in the manifest anyway.
                Err(_) => continue,
            };
            let file_type = entry.file_type().map_err(Error::io(path))?;
            let kind = if file_type.is_dir() {
                DirEntKind::Directory
            } else if file_type.is_file() {
                DirEntKind::Regular
            } else {
                DirEntKind::Other
            };
            result.push(DirEnt { name, kind });
        }
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }
}

/// Create the named pipe through which external tools stream their depfile.
/// The pipe persists across runs; an existing one is reused.
pub fn ensure_fifo(path: &Path) -> Result<()> {
    use std::os::unix::ffi::OsStrExt;
    let c_path = std::ffi::CString::new(path.as_os_str().as_bytes())
        .map_err(|_| Error::InternalInvariant("depfile path contains a NUL byte".to_string()))?;
    let ret = unsafe { libc::mkfifo(c_path.as_ptr(), 0o644) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EEXIST) {
            return Err(Error::io(path)(err));
        }
    }
    Ok(())
}
