// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for the
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the configuration for a run.
///
/// - An explicit path must exist and be valid.
/// - Without one, [`default_config_path`] is used if it exists.
/// - Otherwise the built-in defaults apply.
pub fn load_or_default(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return load_and_validate(path);
    }

    let fallback = default_config_path();
    if fallback.is_file() {
        debug!(path = ?fallback, "loading config from default location");
        return load_and_validate(&fallback);
    }

    debug!("no config file found; using built-in defaults");
    ConfigFile::try_from(RawConfigFile::default())
}

/// `Minerlaunch.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Minerlaunch.toml")
}
