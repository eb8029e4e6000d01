//! CLI surface: flags, exit codes, diagnostics.

use crate::*;

#[test]
fn version_flag() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    let out = space.run_expect(&mut upd_command(vec!["--version"]))?;
    assert_output_contains(&out, "upd 0.1.0");
    Ok(())
}

#[test]
fn help_flag_exits_zero() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    let out = space.run_expect(&mut upd_command(vec!["--help"]))?;
    assert_output_contains(&out, "Usage");
    Ok(())
}

#[test]
fn unknown_flag_is_an_argument_error() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    let out = space.run(&mut upd_command(vec!["--bogus"]))?;
    assert_eq!(out.status.code(), Some(1));
    Ok(())
}

#[test]
fn no_targets_is_an_argument_error() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("Updfile", COPY_AND_LINK_MANIFEST)?;
    let out = space.run(&mut upd_command(vec![]))?;
    assert_eq!(out.status.code(), Some(1));
    assert_stderr_contains(&out, "--all");
    Ok(())
}

#[test]
fn all_and_explicit_targets_are_mutually_exclusive() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("Updfile", COPY_AND_LINK_MANIFEST)?;
    let out = space.run(&mut upd_command(vec!["--all", "dist/app"]))?;
    assert_eq!(out.status.code(), Some(1));
    Ok(())
}

#[test]
fn root_flag_prints_the_discovered_root() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("Updfile", COPY_AND_LINK_MANIFEST)?;
    space.write("src/deep/nested.c", "x\n")?;
    let out = space.run_expect(&mut upd_command(vec!["--root"]))?;
    let printed = String::from_utf8(out.stdout)?;
    let printed = printed.trim_end();
    // The tempdir may be reached through a symlink; compare canonicalized.
    assert_eq!(
        std::fs::canonicalize(printed)?,
        std::fs::canonicalize(space.path())?
    );
    Ok(())
}

#[test]
fn dot_graph_prints_edges_instead_of_executing() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("Updfile", COPY_AND_LINK_MANIFEST)?;
    space.write("src/foo.c", "x\n")?;
    let out = space.run_expect(&mut upd_command(vec!["--dot-graph"]))?;
    assert_output_contains(&out, "digraph upd {");
    assert_output_contains(&out, "\"src/foo.c\" -> \"dist/foo.o\";");
    assert_output_contains(&out, "\"dist/foo.o\" -> \"dist/app\";");
    assert!(!space.exists("dist"));
    Ok(())
}

#[test]
fn double_dash_ends_option_parsing() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("Updfile", COPY_AND_LINK_MANIFEST)?;
    space.write("src/foo.c", "x\n")?;
    let out = space.run_expect(&mut upd_command(vec!["--", "dist/foo.o"]))?;
    assert_output_contains(&out, "updating dist/foo.o");
    Ok(())
}

#[test]
fn color_diagnostics_wraps_fatal_errors_in_sgr() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    let out = space.run(&mut upd_command(vec!["--color-diagnostics", "--all"]))?;
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("\x1b[1;31m"), "no SGR in {stderr:?}");
    Ok(())
}
