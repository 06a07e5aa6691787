// tests/common/mod.rs
// Shared test utilities for integration tests
#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

/// Command for the built binary, isolated from the user's configuration files
/// and color environment
pub fn logmerge_command(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_logmerge"));
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("FORCE_COLOR")
        .env_remove("NO_COLOR")
        .env("NO_EMOJI", "1");
    cmd
}

fn collect(output: std::process::Output) -> (String, String, i32) {
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

/// Run logmerge with the given arguments and input via stdin
pub fn run_logmerge_with_input(args: &[&str], input: &str) -> (String, String, i32) {
    let home = tempfile::tempdir().expect("Failed to create temp home");
    let mut child = logmerge_command(home.path())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start logmerge");

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .expect("Failed to write to stdin");
    }

    collect(child.wait_with_output().expect("Failed to read output"))
}

/// Run logmerge with files as positional arguments; stdin is empty
pub fn run_logmerge_with_files(args: &[&str], files: &[&str]) -> (String, String, i32) {
    let home = tempfile::tempdir().expect("Failed to create temp home");
    let output = logmerge_command(home.path())
        .args(args)
        .args(files)
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute logmerge");
    collect(output)
}

/// Write `content` to a fresh temporary file
pub fn temp_log(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

pub fn path_str(file: &NamedTempFile) -> &str {
    file.path().to_str().expect("temp path is not UTF-8")
}
