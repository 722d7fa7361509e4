// src/provision/fetch.rs

//! Release archive acquisition.
//!
//! The provisioner talks to an [`ArtifactFetcher`] rather than a concrete
//! HTTP client, so tests can swap in a fake and production can prefer an
//! external download tool when the host has one:
//!
//! - [`ExternalToolFetcher`] shells out to `wget` (or `curl`).
//! - [`HttpFetcher`] streams the body with `reqwest`, chunk by chunk.
//!
//! [`probe_fetchers`] decides which of them are available, in preference
//! order.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::FetchError;
use crate::types::FetcherKind;

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<(), FetchError>> + Send + 'a>>;

/// Trait abstracting how the release archive is downloaded.
///
/// Contract: download `url` into the file `dest`, creating or truncating it.
/// Any non-success condition is a [`FetchError`]; the caller owns cleanup of
/// a partially written `dest`.
pub trait ArtifactFetcher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn fetch<'a>(&'a self, url: &'a str, dest: &'a Path) -> FetchFuture<'a>;
}

/// Built-in fetcher backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "builtin"
    }

    fn fetch<'a>(&'a self, url: &'a str, dest: &'a Path) -> FetchFuture<'a> {
        Box::pin(async move {
            let bytes = stream_to_file(&self.client, url, dest).await?;
            debug!(url, path = ?dest, bytes, "download finished");
            Ok(())
        })
    }
}

async fn stream_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<u64, FetchError> {
    let http_err = |source: reqwest::Error| FetchError::Http {
        url: url.to_string(),
        source,
    };
    let io_err = |source: std::io::Error| FetchError::Io {
        path: dest.to_path_buf(),
        source,
    };

    let mut response = client.get(url).send().await.map_err(http_err)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mut file = tokio::fs::File::create(dest).await.map_err(io_err)?;
    let mut written: u64 = 0;

    while let Some(chunk) = response.chunk().await.map_err(http_err)? {
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(io_err)?;
    Ok(written)
}

/// Fetcher that runs an external download tool.
///
/// `curl` gets `-fL -o <dest> <url>`; anything else is assumed to take
/// wget-style `-O <dest> <url>`. The tool's own progress output goes
/// straight to the console.
#[derive(Debug, Clone)]
pub struct ExternalToolFetcher {
    program: PathBuf,
    name: String,
}

impl ExternalToolFetcher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let name = program
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.display().to_string());
        Self { program, name }
    }

    fn command(&self, url: &str, dest: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        if self.name == "curl" {
            cmd.arg("-fL").arg("-o").arg(dest).arg(url);
        } else {
            cmd.arg("-O").arg(dest).arg(url);
        }
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }
}

impl ArtifactFetcher for ExternalToolFetcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch<'a>(&'a self, url: &'a str, dest: &'a Path) -> FetchFuture<'a> {
        Box::pin(async move {
            info!(tool = %self.name, url, "downloading with external tool");

            let status = self
                .command(url, dest)
                .status()
                .await
                .map_err(|source| FetchError::Io {
                    path: self.program.clone(),
                    source,
                })?;

            if !status.success() {
                return Err(FetchError::Tool {
                    tool: self.name.clone(),
                    url: url.to_string(),
                    code: status.code(),
                });
            }
            Ok(())
        })
    }
}

/// Build the fetcher chain for `kind`, in preference order.
///
/// - `Auto`: the external tool if found on `PATH`, then the built-in client.
/// - `External`: the external tool only; missing tool is an error.
/// - `Builtin`: the built-in client only.
pub fn probe_fetchers(
    kind: FetcherKind,
    external_tool: &str,
) -> Result<Vec<Box<dyn ArtifactFetcher>>, FetchError> {
    let tool = which::which(external_tool).ok();
    let mut chain: Vec<Box<dyn ArtifactFetcher>> = Vec::new();

    match kind {
        FetcherKind::Auto => {
            match tool {
                Some(path) => {
                    debug!(tool = ?path, "external download tool available");
                    chain.push(Box::new(ExternalToolFetcher::new(path)));
                }
                None => info!(
                    tool = external_tool,
                    "{external_tool} not found, using the built-in HTTP client instead"
                ),
            }
            chain.push(Box::new(HttpFetcher::new()));
        }
        FetcherKind::External => {
            let path =
                tool.ok_or_else(|| FetchError::ToolUnavailable(external_tool.to_string()))?;
            chain.push(Box::new(ExternalToolFetcher::new(path)));
        }
        FetcherKind::Builtin => chain.push(Box::new(HttpFetcher::new())),
    }

    Ok(chain)
}
