// src/errors.rs

//! Crate-wide error types.
//!
//! Every variant of [`LaunchError`] is fatal: it propagates up to `main`,
//! which prints it and exits non-zero. A miner that exits non-zero or an
//! operator interrupt are *not* errors; see
//! [`SupervisorOutcome`](crate::supervise::SupervisorOutcome).

use std::path::PathBuf;

use thiserror::Error;

/// Failure to acquire the release archive.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("{tool} exited with code {code:?} while fetching {url}")]
    Tool {
        tool: String,
        url: String,
        code: Option<i32>,
    },

    #[error("download tool '{0}' not found on PATH")]
    ToolUnavailable(String),

    #[error("writing archive {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to unpack the release archive.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unpacking {archive:?}: {source}")]
    Io {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive {archive:?} does not contain directory '{dir}'")]
    MissingDirectory { archive: PathBuf, dir: String },
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Failed to download: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to extract: {0}")]
    Extract(#[from] ExtractError),

    #[error("executable not found at {0:?}")]
    ExecutableMissing(PathBuf),

    #[error("supervisor already launched a process")]
    AlreadyStarted,

    #[error("spawning {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("waiting for miner process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("sending termination request to pid {pid}: {reason}")]
    Signal { pid: u32, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LaunchError>;
