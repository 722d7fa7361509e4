// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::FetcherKind;

/// Command-line arguments for `minerlaunch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "minerlaunch",
    version,
    about = "Download, unpack and supervise a mining executable.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Minerlaunch.toml` in the current working directory if it
    /// exists, built-in settings otherwise.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Download mechanism, overriding `[fetch].preferred`.
    #[arg(long, value_enum, value_name = "KIND")]
    pub fetcher: Option<FetcherKind>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MINERLAUNCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load + validate config, print what would run, but don't download or
    /// launch anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
