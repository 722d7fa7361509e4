use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;

/// Which download mechanism the provisioner should use.
///
/// - `Auto`: prefer the external tool when it is on `PATH`, falling back to
///   the built-in HTTP client (default behaviour).
/// - `External`: only the external tool; fails if it is missing.
/// - `Builtin`: only the built-in HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    Auto,
    External,
    Builtin,
}

impl Default for FetcherKind {
    fn default() -> Self {
        FetcherKind::Auto
    }
}

/// Lifecycle of the single process a [`Supervisor`](crate::supervise::Supervisor)
/// manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    Terminated,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::NotStarted => "not-started",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Terminated => "terminated",
            RunState::Failed => "failed",
        };
        f.write_str(s)
    }
}
