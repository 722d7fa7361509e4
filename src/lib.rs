// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod provision;
pub mod supervise;
pub mod types;

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile, MinerSection};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::provision::{probe_fetchers, Provisioner, TarGzExtractor};
use crate::supervise::{LaunchSpec, Supervisor, SupervisorOutcome};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (+ CLI overrides)
/// - fetcher probing and provisioning
/// - the supervisor, with Ctrl-C / SIGTERM as its shutdown trigger
///
/// Returns `None` for `--dry-run`, otherwise how the miner run ended.
pub async fn run(args: CliArgs) -> Result<Option<SupervisorOutcome>> {
    let mut cfg = load_or_default(args.config.as_deref())?;
    if let Some(kind) = args.fetcher {
        cfg.fetch.preferred = kind;
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(None);
    }

    println!("Miner setup and launch");
    println!("{}", "=".repeat(40));

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let fetchers = probe_fetchers(cfg.fetch.preferred, &cfg.fetch.external_tool)?;
    let provisioner = Provisioner::new(
        cfg.artifact.clone(),
        fetchers,
        Arc::new(TarGzExtractor),
        Arc::clone(&fs),
    );
    let artifact = provisioner.ensure_present().await?;
    info!(
        path = ?artifact.executable,
        provisioned = artifact.provisioned,
        "miner ready"
    );

    let spec = LaunchSpec::for_artifact(&artifact, &cfg.miner)?;
    print_launch_banner(&cfg.miner);

    let shutdown = shutdown_signal()?;
    let mut supervisor = Supervisor::new(spec, fs);
    let mut console = std::io::stdout();
    let outcome = supervisor.run(&mut console, shutdown).await?;

    debug!(
        ?outcome,
        state = %supervisor.state(),
        lines = supervisor.lines_forwarded(),
        "supervisor finished"
    );
    Ok(Some(outcome))
}

/// Install the Ctrl-C (and, on Unix, SIGTERM) listeners now and return a
/// future that resolves on the first of them.
///
/// Listeners are registered before the miner is spawned, so a signal that
/// arrives before the supervisor first polls the future is still caught.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => debug!("received SIGINT"),
            _ = terminate.recv() => debug!("received SIGTERM"),
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut ctrl_c = tokio::signal::windows::ctrl_c()?;
    Ok(async move {
        ctrl_c.recv().await;
    })
}

fn print_launch_banner(miner: &MinerSection) {
    println!("Starting miner with the following configuration:");
    println!("URL: {}", miner.url);
    println!("User: {}", miner.user);
    println!("Password: {}", miner.pass);
    println!("Donate Level: {}", miner.donate_level);
    println!("TLS: {}", if miner.tls { "Enabled" } else { "Disabled" });
    println!("{}", "=".repeat(50));
}

/// Simple dry-run output: paths, fetch settings and the miner command line.
fn print_dry_run(cfg: &ConfigFile) {
    println!("minerlaunch dry-run");
    println!("  artifact.archive_url = {}", cfg.artifact.archive_url);
    println!("  artifact.archive = {}", cfg.artifact.archive_path().display());
    println!("  artifact.dir = {}", cfg.artifact.extract_path().display());
    println!(
        "  artifact.executable = {}",
        cfg.artifact.executable_path().display()
    );
    println!(
        "  artifact.bundled_config = {}",
        cfg.artifact.bundled_config_path().display()
    );
    println!("  fetch.preferred = {:?}", cfg.fetch.preferred);
    println!("  fetch.external_tool = {}", cfg.fetch.external_tool);
    println!();

    println!("command:");
    println!("  {}", cfg.artifact.executable_path().display());
    for arg in cfg.miner.to_args() {
        println!("    {arg}");
    }

    debug!("dry-run complete (no download, no launch)");
}
