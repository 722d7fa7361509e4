// src/provision/mod.rs

//! Artifact provisioning: make sure the miner executable exists on disk.
//!
//! - [`fetch`] downloads the release archive (external tool or built-in
//!   HTTP client).
//! - [`extract`] unpacks it.
//! - [`Provisioner`] sequences the two, stages the extraction so a failure
//!   never leaves a half-unpacked tree in place, and strips the bundled
//!   config file.

pub mod extract;
pub mod fetch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ArtifactSection;
use crate::errors::{ExtractError, LaunchError, Result};
use crate::fs::FileSystem;

pub use extract::{ArchiveExtractor, TarGzExtractor};
pub use fetch::{probe_fetchers, ArtifactFetcher, ExternalToolFetcher, HttpFetcher};

/// Scratch directory, inside `work_dir`, that archives are unpacked into
/// before being moved into place.
pub const STAGING_DIR: &str = ".minerlaunch-staging";

/// A provisioned, ready-to-run miner on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub source_url: String,
    /// Directory the archive unpacked into; the miner runs from here.
    pub dir: PathBuf,
    pub executable: PathBuf,
    /// True when this call downloaded and extracted the archive.
    pub provisioned: bool,
}

pub struct Provisioner {
    artifact: ArtifactSection,
    fetchers: Vec<Box<dyn ArtifactFetcher>>,
    extractor: Arc<dyn ArchiveExtractor>,
    fs: Arc<dyn FileSystem>,
}

impl Provisioner {
    /// `fetchers` are tried in order until one succeeds.
    pub fn new(
        artifact: ArtifactSection,
        fetchers: Vec<Box<dyn ArtifactFetcher>>,
        extractor: Arc<dyn ArchiveExtractor>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            artifact,
            fetchers,
            extractor,
            fs,
        }
    }

    pub fn is_present(&self) -> bool {
        self.fs.is_file(&self.artifact.executable_path())
    }

    /// Return the artifact, downloading and unpacking it first if the
    /// executable is not already on disk.
    ///
    /// Already present: no network or extraction work happens; only the
    /// bundled config is (re)checked and removed.
    pub async fn ensure_present(&self) -> Result<Artifact> {
        if self.is_present() {
            info!(
                path = ?self.artifact.executable_path(),
                "miner already exists; skipping download and extraction"
            );
            self.remove_bundled_config()?;
            return Ok(self.artifact_record(false));
        }

        self.fs.create_dir_all(&self.artifact.work_dir)?;

        let archive = self.fetch_archive().await?;
        self.unpack(&archive).await?;
        self.remove_bundled_config()?;

        let executable = self.artifact.executable_path();
        if !self.is_present() {
            return Err(LaunchError::ExecutableMissing(executable));
        }

        Ok(self.artifact_record(true))
    }

    /// Delete the config file shipped inside the archive, if any.
    ///
    /// Returns whether a file was removed.
    pub fn remove_bundled_config(&self) -> Result<bool> {
        let path = self.artifact.bundled_config_path();
        if !self.fs.is_file(&path) {
            debug!(path = ?path, "no bundled config to remove");
            return Ok(false);
        }

        info!(path = ?path, "removing bundled config");
        self.fs.remove_file(&path)?;
        Ok(true)
    }

    fn artifact_record(&self, provisioned: bool) -> Artifact {
        Artifact {
            source_url: self.artifact.archive_url.clone(),
            dir: self.artifact.extract_path(),
            executable: self.artifact.executable_path(),
            provisioned,
        }
    }

    async fn fetch_archive(&self) -> Result<PathBuf> {
        let url = self.artifact.archive_url.as_str();
        let archive = self.artifact.archive_path();
        let partial = partial_path(&archive);

        let mut last_err = None;
        for (idx, fetcher) in self.fetchers.iter().enumerate() {
            self.discard_file(&partial);
            info!(fetcher = fetcher.name(), url, "downloading");

            match fetcher.fetch(url, &partial).await {
                Ok(()) => {
                    self.fs.rename(&partial, &archive)?;
                    info!(path = ?archive, "download completed");
                    return Ok(archive);
                }
                Err(err) => {
                    self.discard_file(&partial);
                    if idx + 1 < self.fetchers.len() {
                        warn!(
                            fetcher = fetcher.name(),
                            error = %err,
                            "download failed; falling back to next fetcher"
                        );
                    }
                    last_err = Some(err);
                }
            }
        }

        match last_err {
            Some(err) => Err(err.into()),
            None => Err(LaunchError::ConfigError(
                "no download mechanism available".to_string(),
            )),
        }
    }

    async fn unpack(&self, archive: &Path) -> Result<()> {
        let staging = self.artifact.work_dir.join(STAGING_DIR);
        if self.fs.exists(&staging) {
            self.fs.remove_dir_all(&staging)?;
        }
        self.fs.create_dir_all(&staging)?;

        info!(archive = ?archive, "extracting");

        let staged = staging.join(&self.artifact.extract_dir);
        if let Err(err) = self.extract_into(archive, &staging, &staged).await {
            warn!(error = %err, "extraction failed; discarding archive and staging dir");
            self.discard_dir(&staging);
            self.discard_file(archive);
            return Err(err);
        }

        let target = self.artifact.extract_path();
        if self.fs.exists(&target) {
            warn!(path = ?target, "replacing incomplete miner directory");
            self.fs.remove_dir_all(&target)?;
        }
        if let Some(parent) = target.parent() {
            self.fs.create_dir_all(parent)?;
        }
        self.fs.rename(&staged, &target)?;
        self.fs.remove_dir_all(&staging)?;

        info!(path = ?target, "extraction completed");
        Ok(())
    }

    async fn extract_into(&self, archive: &Path, staging: &Path, staged: &Path) -> Result<()> {
        let extractor = Arc::clone(&self.extractor);
        let archive_owned = archive.to_path_buf();
        let staging_owned = staging.to_path_buf();

        tokio::task::spawn_blocking(move || extractor.extract(&archive_owned, &staging_owned))
            .await
            .map_err(anyhow::Error::from)??;

        if !self.fs.is_dir(staged) {
            return Err(ExtractError::MissingDirectory {
                archive: archive.to_path_buf(),
                dir: self.artifact.extract_dir.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn discard_file(&self, path: &Path) {
        if self.fs.exists(path) {
            if let Err(e) = self.fs.remove_file(path) {
                warn!(path = ?path, error = %e, "failed to remove leftover file");
            }
        }
    }

    fn discard_dir(&self, path: &Path) {
        if self.fs.exists(path) {
            if let Err(e) = self.fs.remove_dir_all(path) {
                warn!(path = ?path, error = %e, "failed to remove leftover directory");
            }
        }
    }
}

/// `<archive>.part`: where fetchers write until the download completes.
fn partial_path(archive: &Path) -> PathBuf {
    let mut name = archive
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    archive.with_file_name(name)
}
