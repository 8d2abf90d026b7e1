//! A library for compiling and running code snippets.
//!
//! Coderoom takes source text, a language identifier and optional stdin,
//! compiles the code where the language needs it, runs it in a per-request
//! workspace and returns captured output (or a rendered document) in one
//! uniform result shape.
//!
//! # Features
//!
//! - **Data-driven languages**: every toolchain is a set of shell templates in TOML.
//! - **Per-request workspaces**: unique file names and guaranteed cleanup.
//! - **Bounded execution**: wall clock and output limits, whole process groups killed.
//! - **Document rendering**: multi-pass markup processors returning a base64 artifact.
//! - **Normalized failures**: compile and run errors come back as ordinary results.

pub use config::{Config, ConfigError, EXAMPLE_CONFIG, Language};
pub use process::{FailureReason, ProcessError, ProcessFailure, ProcessOutput, ShellCommand};
pub use runner::{ExecuteError, Executor, public_class_name};
pub use types::{EXECUTION_TIME_PLACEHOLDER, ExecutionRequest, ExecutionResult, Limits};
pub use workspace::{Workspace, WorkspaceRoot};

pub mod config;
pub mod process;
pub mod runner;
pub mod types;
pub mod workspace;
