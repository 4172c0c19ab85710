//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};

/// Run the threadkeep binary in `dir` with a clean environment for the
/// variables that change its behavior.
pub fn run_threadkeep_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_threadkeep"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("THREADKEEP_STORAGE")
        .env_remove("THREADKEEP_DATABASE")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute threadkeep binary")
}

/// Run threadkeep with `--json` and parse stdout, asserting success.
pub fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let output = run_threadkeep_in_dir(dir, &full);
    assert!(
        output.status.success(),
        "threadkeep {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not valid JSON")
}

/// Create a post through the CLI and return its id.
pub fn create_post(dir: &Path, title: &str, closed: bool) -> String {
    let mut args = vec![
        "post", "create", "--title", title, "--author", "ann", "--content", "body",
    ];
    if closed {
        args.push("--closed");
    }
    let post = run_json(dir, &args);
    post["id"].as_str().expect("post id").to_string()
}
