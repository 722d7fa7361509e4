#![allow(dead_code)]

use std::path::Path;

use minerlaunch::config::{
    ArtifactSection, ConfigFile, FetchSection, MinerSection, RawConfigFile,
};
use minerlaunch::types::FetcherKind;

pub const TEST_ARCHIVE_URL: &str = "https://downloads.example.invalid/miner-1.0-linux-x64.tar.gz";
pub const TEST_EXTRACT_DIR: &str = "miner-1.0";
pub const TEST_EXECUTABLE: &str = "miner";

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from a small fake release rooted at `work_dir`, with a local pool
/// endpoint and TLS off.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(work_dir: impl AsRef<Path>) -> Self {
        Self {
            config: RawConfigFile {
                artifact: ArtifactSection {
                    work_dir: work_dir.as_ref().to_path_buf(),
                    archive_url: TEST_ARCHIVE_URL.to_string(),
                    archive_name: None,
                    extract_dir: TEST_EXTRACT_DIR.to_string(),
                    executable: TEST_EXECUTABLE.to_string(),
                    bundled_config: "config.json".to_string(),
                },
                fetch: FetchSection {
                    preferred: FetcherKind::Builtin,
                    external_tool: "wget".to_string(),
                },
                miner: MinerSection {
                    url: "127.0.0.1:3333".to_string(),
                    user: "test-wallet".to_string(),
                    pass: "x".to_string(),
                    donate_level: 0,
                    tls: false,
                    tls_fingerprint: None,
                    extra_args: Vec::new(),
                },
            },
        }
    }

    pub fn archive_url(mut self, url: &str) -> Self {
        self.config.artifact.archive_url = url.to_string();
        self
    }

    pub fn extract_dir(mut self, dir: &str) -> Self {
        self.config.artifact.extract_dir = dir.to_string();
        self
    }

    pub fn executable(mut self, exe: &str) -> Self {
        self.config.artifact.executable = exe.to_string();
        self
    }

    pub fn fetcher(mut self, kind: FetcherKind) -> Self {
        self.config.fetch.preferred = kind;
        self
    }

    pub fn tls(mut self, fingerprint: Option<&str>) -> Self {
        self.config.miner.tls = true;
        self.config.miner.tls_fingerprint = fingerprint.map(str::to_string);
        self
    }

    pub fn extra_arg(mut self, arg: &str) -> Self {
        self.config.miner.extra_args.push(arg.to_string());
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    /// Render as TOML, for tests that drive the binary through `--config`.
    pub fn to_toml(&self) -> String {
        let a = &self.config.artifact;
        let f = &self.config.fetch;
        let m = &self.config.miner;
        let fetcher = match f.preferred {
            FetcherKind::Auto => "auto",
            FetcherKind::External => "external",
            FetcherKind::Builtin => "builtin",
        };
        let extra: Vec<String> = m.extra_args.iter().map(|s| format!("{s:?}")).collect();

        format!(
            r#"[artifact]
work_dir = {work_dir:?}
archive_url = {url:?}
extract_dir = {extract:?}
executable = {exe:?}
bundled_config = {bundled:?}

[fetch]
preferred = "{fetcher}"
external_tool = {tool:?}

[miner]
url = {pool:?}
user = {user:?}
pass = {pass:?}
donate_level = {donate}
tls = {tls}
tls_fingerprint = {fp:?}
extra_args = [{extra}]
"#,
            work_dir = path_str(&a.work_dir),
            url = a.archive_url,
            extract = a.extract_dir,
            exe = a.executable,
            bundled = a.bundled_config,
            tool = f.external_tool,
            pool = m.url,
            user = m.user,
            pass = m.pass,
            donate = m.donate_level,
            tls = m.tls,
            fp = m.tls_fingerprint.clone().unwrap_or_default(),
            extra = extra.join(", "),
        )
    }
}

fn path_str(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}
