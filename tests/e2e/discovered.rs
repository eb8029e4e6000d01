//! Dependencies discovered through the depfile FIFO.

use crate::*;

/// The "compiler" concatenates the source with `src/foo.h` and reports the
/// header through the depfile, the way `-MMD -MF` would.
const HEADER_MANIFEST: &str = r#"{
    "source_patterns": ["src/(*).c"],
    "command_line_templates": [
        {
            "binary_path": "/bin/sh",
            "parts": [
                {
                    "literal_args": [
                        "-c",
                        "cat \"$2\" src/foo.h > \"$3\"; printf '%s: %s\n' \"$3\" src/foo.h > \"$1\"",
                        "compile"
                    ],
                    "variable_args": ["depfile", "input_files", "output_files"]
                }
            ]
        }
    ],
    "rules": [
        { "command_line_ix": 0, "inputs": [{ "source_ix": 0 }], "output": "dist/($1).o" }
    ]
}"#;

#[test]
fn discovered_header_is_recorded_and_tracked() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("Updfile", HEADER_MANIFEST)?;
    space.write("src/foo.c", "body\n")?;
    space.write("src/foo.h", "header v1\n")?;

    let out = space.run_expect(&mut upd_command(vec!["--all"]))?;
    assert_output_contains(&out, "updating dist/foo.o");
    assert_eq!(space.read("dist/foo.o")?, b"body\nheader v1\n");
    let log = String::from_utf8(space.read(".upd/log")?)?;
    assert!(log.contains("src/foo.h"), "log should record the header: {log}");

    // Nothing changed: the header does not trigger a rebuild by itself.
    let out = space.run_expect(&mut upd_command(vec!["--all"]))?;
    assert_output_not_contains(&out, "updating");

    // Editing the discovered header invalidates the imprint.
    space.write("src/foo.h", "header v2\n")?;
    let out = space.run_expect(&mut upd_command(vec!["--all"]))?;
    assert_output_contains(&out, "updating dist/foo.o");
    assert_eq!(space.read("dist/foo.o")?, b"body\nheader v2\n");
    Ok(())
}

#[test]
fn depfile_dependency_outside_root_is_rejected() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write(
        "Updfile",
        r#"{
            "source_patterns": ["src/(*).c"],
            "command_line_templates": [
                {
                    "binary_path": "/bin/sh",
                    "parts": [
                        {
                            "literal_args": [
                                "-c",
                                "cp \"$2\" \"$3\"; printf '%s: %s\n' \"$3\" /etc/hostname > \"$1\"",
                                "compile"
                            ],
                            "variable_args": ["depfile", "input_files", "output_files"]
                        }
                    ]
                }
            ],
            "rules": [
                { "command_line_ix": 0, "inputs": [{ "source_ix": 0 }], "output": "dist/($1).o" }
            ]
        }"#,
    )?;
    space.write("src/foo.c", "body\n")?;
    let out = space.run(&mut upd_command(vec!["--all"]))?;
    assert_eq!(out.status.code(), Some(2));
    assert_stderr_contains(&out, "outside the project root");
    Ok(())
}
