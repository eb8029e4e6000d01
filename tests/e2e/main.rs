//! Support code for e2e tests, which run upd as a binary inside a scratch
//! project directory.

mod basic;
mod discovered;
mod flags;

use std::path::PathBuf;

pub fn upd_binary() -> PathBuf {
    std::env::current_exe()
        .expect("test binary path")
        .parent()
        .expect("test binary directory")
        .parent()
        .expect("binary directory")
        .join("upd")
}

pub fn upd_command(args: Vec<&str>) -> std::process::Command {
    let mut cmd = std::process::Command::new(upd_binary());
    cmd.args(args);
    cmd
}

fn print_output(out: &std::process::Output) {
    // Gross: use print! instead of writing to stdout so the Rust test
    // framework can capture it.
    print!("{}", String::from_utf8_lossy(&out.stdout));
    print!("{}", String::from_utf8_lossy(&out.stderr));
}

pub fn assert_output_contains(out: &std::process::Output, text: &str) {
    let stdout = String::from_utf8_lossy(&out.stdout);
    if !stdout.contains(text) {
        panic!(
            "assertion failed; expected output to contain {:?} but got:\n{}",
            text, stdout
        );
    }
}

pub fn assert_output_not_contains(out: &std::process::Output, text: &str) {
    let stdout = String::from_utf8_lossy(&out.stdout);
    if stdout.contains(text) {
        panic!(
            "assertion failed; expected output to not contain {:?} but got:\n{}",
            text, stdout
        );
    }
}

pub fn assert_stderr_contains(out: &std::process::Output, text: &str) {
    let stderr = String::from_utf8_lossy(&out.stderr);
    if !stderr.contains(text) {
        panic!(
            "assertion failed; expected stderr to contain {:?} but got:\n{}",
            text, stderr
        );
    }
}

/// Manages a temporary project directory for invoking upd.
pub struct TestSpace {
    dir: tempfile::TempDir,
}

impl TestSpace {
    pub fn new() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        Ok(TestSpace { dir })
    }

    /// Write a file into the working space, creating parent directories.
    pub fn write(&self, path: &str, content: &str) -> std::io::Result<()> {
        let path = self.dir.path().join(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
    }

    /// Read a file from the working space.
    pub fn read(&self, path: &str) -> std::io::Result<Vec<u8>> {
        std::fs::read(self.dir.path().join(path))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.dir.path().join(path).exists()
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Invoke upd, returning process output.
    pub fn run(&self, cmd: &mut std::process::Command) -> std::io::Result<std::process::Output> {
        cmd.current_dir(self.dir.path()).output()
    }

    /// Like run, but also print output if the invocation failed.
    pub fn run_expect(
        &self,
        cmd: &mut std::process::Command,
    ) -> anyhow::Result<std::process::Output> {
        let out = self.run(cmd)?;
        if !out.status.success() {
            print_output(&out);
            anyhow::bail!("run failed, status {}", out.status);
        }
        Ok(out)
    }
}

/// A manifest that "compiles" every `src/**/*.c` by copying it to
/// `dist/*.o`, then "links" the objects by concatenation into `dist/app`.
pub const COPY_AND_LINK_MANIFEST: &str = r#"{
    "source_patterns": ["src/(**/*).c"],
    "command_line_templates": [
        {
            "binary_path": "/bin/sh",
            "parts": [
                {
                    "literal_args": ["-c", "cp \"$1\" \"$2\"", "compile"],
                    "variable_args": ["input_files", "output_files"]
                }
            ]
        },
        {
            "binary_path": "/bin/sh",
            "parts": [
                {
                    "literal_args": ["-c", "out=\"$1\"; shift; cat \"$@\" > \"$out\"", "link"],
                    "variable_args": ["output_files", "input_files"]
                }
            ]
        }
    ],
    "rules": [
        { "command_line_ix": 0, "inputs": [{ "source_ix": 0 }], "output": "dist/($1).o" },
        { "command_line_ix": 1, "inputs": [{ "rule_ix": 0 }], "output": "dist/app" }
    ]
}"#;
