//! Integration tests for coderoom
//!
//! These tests drive real toolchains (gcc, javac, pdflatex, ...) through the
//! embedded default configuration.
//! Run with: cargo test -p coderoom --features integration-tests
//!
//! A test whose toolchain is not on PATH prints a note and passes.

#![cfg(feature = "integration-tests")]

use std::fs;
use std::path::Path;

use coderoom::{Config, Executor};
use tempfile::TempDir;

mod compiled_languages;
mod config_loading;
mod interpreted_languages;
mod java;
mod workspace_cleanup;

const FIXTURES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Helper to get fixture file content
pub(crate) fn fixture_source(name: &str) -> String {
    let path = format!("{FIXTURES_PATH}/sources/{name}");
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read fixture {path}: {e}"))
}

/// Check that every tool is on PATH, printing a note otherwise
pub(crate) fn has_tools(tools: &[&str]) -> bool {
    match tools.iter().find(|tool| which::which(tool).is_err()) {
        Some(missing) => {
            eprintln!("skipping: {missing} not found on PATH");
            false
        }
        None => true,
    }
}

/// Executor with the default languages and a private workspace root
pub(crate) fn test_executor() -> (TempDir, Executor) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = Config::default();
    config.temp_dir = dir.path().join("workspaces");
    let executor = Executor::new(config).expect("Failed to create executor");
    (dir, executor)
}

/// Names left behind in a workspace root
pub(crate) fn leftovers(root: &Path) -> Vec<String> {
    fs::read_dir(root)
        .expect("Failed to read workspace root")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}
