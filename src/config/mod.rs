// src/config/mod.rs

//! Configuration loading and validation for minerlaunch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, or fall back to built-in defaults
//!   (`loader.rs`).
//! - Validate paths, URLs and miner flags (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{ArtifactSection, ConfigFile, FetchSection, MinerSection, RawConfigFile};
