use crate::*;

#[test]
fn cold_build_then_noop() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("Updfile", COPY_AND_LINK_MANIFEST)?;
    space.write("src/foo.c", "int main() {}\n")?;

    let out = space.run_expect(&mut upd_command(vec!["--all"]))?;
    assert_output_contains(&out, "updating dist/foo.o");
    assert_output_contains(&out, "updating dist/app");
    assert_eq!(space.read("dist/app")?, b"int main() {}\n");
    let log = String::from_utf8(space.read(".upd/log")?)?;
    assert_eq!(log.lines().count(), 2);

    // Immediately rebuilding runs nothing.
    let out = space.run_expect(&mut upd_command(vec!["--all"]))?;
    assert_output_not_contains(&out, "updating");
    assert_output_contains(&out, "no work to do");
    let rewritten = String::from_utf8(space.read(".upd/log")?)?;
    assert_eq!(rewritten.lines().count(), 2);
    Ok(())
}

#[test]
fn source_edit_rebuilds_downstream() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("Updfile", COPY_AND_LINK_MANIFEST)?;
    space.write("src/foo.c", "before\n")?;
    space.write("src/bar.c", "other\n")?;
    space.run_expect(&mut upd_command(vec!["--all"]))?;

    space.write("src/foo.c", "after\n")?;
    let out = space.run_expect(&mut upd_command(vec!["--all"]))?;
    assert_output_contains(&out, "updating dist/foo.o");
    assert_output_contains(&out, "updating dist/app");
    // The untouched sibling is left alone.
    assert_output_not_contains(&out, "updating dist/bar.o");
    assert_eq!(space.read("dist/foo.o")?, b"after\n");
    Ok(())
}

#[test]
fn explicit_target_updates_only_its_closure() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("Updfile", COPY_AND_LINK_MANIFEST)?;
    space.write("src/foo.c", "content\n")?;

    let out = space.run_expect(&mut upd_command(vec!["dist/foo.o"]))?;
    assert_output_contains(&out, "updating dist/foo.o");
    assert_output_not_contains(&out, "updating dist/app");
    assert!(!space.exists("dist/app"));

    // A later full run picks up where the partial one stopped, the way a
    // crashed run resumes: the recorded object is already up to date.
    let out = space.run_expect(&mut upd_command(vec!["--all"]))?;
    assert_output_not_contains(&out, "updating dist/foo.o");
    assert_output_contains(&out, "updating dist/app");
    Ok(())
}

#[test]
fn modified_artifact_is_rebuilt() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("Updfile", COPY_AND_LINK_MANIFEST)?;
    space.write("src/foo.c", "content\n")?;
    space.run_expect(&mut upd_command(vec!["--all"]))?;

    // Someone tampers with the generated file; its content hash no longer
    // matches the record.
    space.write("dist/foo.o", "tampered\n")?;
    let out = space.run_expect(&mut upd_command(vec!["--all"]))?;
    assert_output_contains(&out, "updating dist/foo.o");
    assert_eq!(space.read("dist/foo.o")?, b"content\n");
    Ok(())
}

#[test]
fn output_collision_fails_before_running_anything() -> anyhow::Result<()> {
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
                            "literal_args": ["-c", "cp \"$1\" \"$2\"", "compile"],
                            "variable_args": ["input_files", "output_files"]
                        }
                    ]
                }
            ],
            "rules": [
                { "command_line_ix": 0, "inputs": [{ "source_ix": 0 }], "output": "dist/x.o" },
                { "command_line_ix": 0, "inputs": [{ "source_ix": 0 }], "output": "dist/x.o" }
            ]
        }"#,
    )?;
    space.write("src/a.c", "a\n")?;
    let out = space.run(&mut upd_command(vec!["--all"]))?;
    assert_eq!(out.status.code(), Some(2));
    assert_stderr_contains(&out, "same output");
    assert_output_not_contains(&out, "updating");
    assert!(!space.exists("dist"));
    Ok(())
}

#[test]
fn failing_command_aborts_the_run() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write(
        "Updfile",
        r#"{
            "source_patterns": ["src/(*).c"],
            "command_line_templates": [
                {
                    "binary_path": "/bin/sh",
                    "parts": [
                        { "literal_args": ["-c", "exit 3", "broken"], "variable_args": [] }
                    ]
                }
            ],
            "rules": [
                { "command_line_ix": 0, "inputs": [{ "source_ix": 0 }], "output": "dist/($1).o" }
            ]
        }"#,
    )?;
    space.write("src/a.c", "a\n")?;
    let out = space.run(&mut upd_command(vec!["--all"]))?;
    assert_eq!(out.status.code(), Some(2));
    assert_stderr_contains(&out, "failed");
    // Nothing was recorded for the failed target.
    assert_eq!(space.read(".upd/log")?, b"");
    Ok(())
}

#[test]
fn unknown_target_is_a_runtime_error() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("Updfile", COPY_AND_LINK_MANIFEST)?;
    space.write("src/foo.c", "content\n")?;
    let out = space.run(&mut upd_command(vec!["dist/nope.o"]))?;
    assert_eq!(out.status.code(), Some(2));
    assert_stderr_contains(&out, "unknown target");
    Ok(())
}

#[test]
fn target_outside_root_is_rejected() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("Updfile", COPY_AND_LINK_MANIFEST)?;
    let out = space.run(&mut upd_command(vec!["../elsewhere"]))?;
    assert_eq!(out.status.code(), Some(2));
    assert_stderr_contains(&out, "outside the project root");
    Ok(())
}

#[test]
fn corrupted_log_tells_the_operator() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("Updfile", COPY_AND_LINK_MANIFEST)?;
    space.write("src/foo.c", "content\n")?;
    space.write(".upd/log", "garbage\n")?;
    let out = space.run(&mut upd_command(vec!["--all"]))?;
    assert_eq!(out.status.code(), Some(2));
    assert_stderr_contains(&out, "corrupted");
    assert_stderr_contains(&out, "delete");
    Ok(())
}

#[test]
fn missing_updfile_is_a_fatal_error() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    let out = space.run(&mut upd_command(vec!["--all"]))?;
    assert_eq!(out.status.code(), Some(2));
    assert_stderr_contains(&out, "cannot find Updfile");
    Ok(())
}
