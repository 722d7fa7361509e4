// src/config/validate.rs

use std::path::{Component, Path};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{LaunchError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = LaunchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.artifact, raw.fetch, raw.miner))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_artifact(cfg)?;
    validate_fetch(cfg)?;
    validate_miner(cfg)?;
    Ok(())
}

fn validate_artifact(cfg: &RawConfigFile) -> Result<()> {
    let artifact = &cfg.artifact;

    let url = artifact.archive_url.trim();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(LaunchError::ConfigError(format!(
            "[artifact].archive_url must be an http(s) URL (got '{}')",
            artifact.archive_url
        )));
    }

    match artifact.archive_file_name() {
        None => {
            return Err(LaunchError::ConfigError(format!(
                "[artifact].archive_name is required: cannot derive a file name from '{}'",
                artifact.archive_url
            )));
        }
        Some(name) => ensure_bare_file_name("[artifact].archive_name", &name)?,
    }

    ensure_relative("[artifact].extract_dir", &artifact.extract_dir)?;
    ensure_relative("[artifact].executable", &artifact.executable)?;
    ensure_relative("[artifact].bundled_config", &artifact.bundled_config)?;

    Ok(())
}

fn validate_fetch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.fetch.external_tool.trim().is_empty() {
        return Err(LaunchError::ConfigError(
            "[fetch].external_tool must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_miner(cfg: &RawConfigFile) -> Result<()> {
    let miner = &cfg.miner;

    if miner.url.trim().is_empty() {
        return Err(LaunchError::ConfigError(
            "[miner].url must not be empty".to_string(),
        ));
    }
    if miner.user.trim().is_empty() {
        return Err(LaunchError::ConfigError(
            "[miner].user must not be empty".to_string(),
        ));
    }
    if miner.donate_level > 100 {
        return Err(LaunchError::ConfigError(format!(
            "[miner].donate_level must be between 0 and 100 (got {})",
            miner.donate_level
        )));
    }
    if let Some(fp) = miner.fingerprint() {
        if fp.len() != 64 || !fp.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LaunchError::ConfigError(format!(
                "[miner].tls_fingerprint must be 64 hex characters (got '{fp}')"
            )));
        }
    }

    Ok(())
}

fn ensure_relative(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LaunchError::ConfigError(format!("{field} must not be empty")));
    }

    let path = Path::new(value);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    let names_something = path.components().any(|c| matches!(c, Component::Normal(_)));
    if escapes || !names_something {
        return Err(LaunchError::ConfigError(format!(
            "{field} must be a relative path without '..' (got '{value}')"
        )));
    }
    Ok(())
}

fn ensure_bare_file_name(field: &str, value: &str) -> Result<()> {
    let path = Path::new(value);
    let is_bare = matches!(
        path.components().collect::<Vec<_>>().as_slice(),
        [Component::Normal(_)]
    );
    if !is_bare {
        return Err(LaunchError::ConfigError(format!(
            "{field} must be a plain file name (got '{value}')"
        )));
    }
    Ok(())
}
