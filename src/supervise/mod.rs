// src/supervise/mod.rs

//! Process supervision: run the miner, stream its output, stop it on request.
//!
//! - [`output`] merges stdout and stderr into one line stream.
//! - [`terminate`] delivers the termination request on shutdown.
//! - [`Supervisor`] owns the single child process and its lifecycle
//!   (`NotStarted → Running → Completed | Terminated | Failed`).

pub mod output;
pub mod terminate;

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::MinerSection;
use crate::errors::{LaunchError, Result};
use crate::fs::FileSystem;
use crate::provision::Artifact;
use crate::types::RunState;

/// Mode applied to the executable before launch: `rwxr-xr-x`.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// How long to keep forwarding output after the child has exited on
/// shutdown.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything needed to start the miner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub executable: PathBuf,
    /// The child's working directory. The supervisor's own working directory
    /// is never changed.
    pub working_dir: PathBuf,
    pub args: Vec<String>,
}

impl LaunchSpec {
    pub fn new(
        executable: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
        args: Vec<String>,
    ) -> Self {
        Self {
            executable: executable.into(),
            working_dir: working_dir.into(),
            args,
        }
    }

    /// Launch spec for a provisioned artifact.
    ///
    /// Paths are made absolute so the executable resolves the same way
    /// regardless of the child's working directory.
    pub fn for_artifact(artifact: &Artifact, miner: &MinerSection) -> Result<Self> {
        Ok(Self {
            executable: std::path::absolute(&artifact.executable)?,
            working_dir: std::path::absolute(&artifact.dir)?,
            args: miner.to_args(),
        })
    }

    /// File name of the executable, for messages.
    pub fn display_name(&self) -> String {
        self.executable
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.executable.display().to_string())
    }
}

/// How a supervised run ended. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorOutcome {
    /// Exit status 0.
    Completed,
    /// Non-zero exit; `-1` when no code is available (killed by a signal).
    Failed(i32),
    /// Shutdown was requested and the child has exited; carries its exit
    /// code if it had one.
    Terminated(Option<i32>),
}

impl SupervisorOutcome {
    pub fn state(self) -> RunState {
        match self {
            SupervisorOutcome::Completed => RunState::Completed,
            SupervisorOutcome::Failed(_) => RunState::Failed,
            SupervisorOutcome::Terminated(_) => RunState::Terminated,
        }
    }
}

enum Step {
    Line(Option<String>),
    Shutdown,
}

/// Owns at most one miner process for its whole lifetime.
pub struct Supervisor {
    spec: LaunchSpec,
    fs: Arc<dyn FileSystem>,
    state: RunState,
    lines_forwarded: usize,
}

impl Supervisor {
    pub fn new(spec: LaunchSpec, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            spec,
            fs,
            state: RunState::NotStarted,
            lines_forwarded: 0,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn lines_forwarded(&self) -> usize {
        self.lines_forwarded
    }

    /// Launch the miner and supervise it until it exits or `shutdown`
    /// resolves.
    ///
    /// Every output line is written to `console` and flushed immediately.
    /// When `shutdown` fires, the child gets a termination request and this
    /// waits, without a timeout, for it to exit.
    ///
    /// Errors (missing executable, spawn/wait/signal failures, console write
    /// failures) are fatal to the caller; a non-zero exit is not an error.
    pub async fn run<W, F>(&mut self, console: &mut W, shutdown: F) -> Result<SupervisorOutcome>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        if self.state != RunState::NotStarted {
            return Err(LaunchError::AlreadyStarted);
        }

        let mut child = self.launch()?;
        self.state = RunState::Running;

        let mut lines = output::merge_output(child.stdout.take(), child.stderr.take());
        tokio::pin!(shutdown);

        // Forward output until both pipes close.
        loop {
            let step = tokio::select! {
                line = lines.recv() => Step::Line(line),
                () = &mut shutdown => Step::Shutdown,
            };
            match step {
                Step::Line(Some(line)) => self.forward(console, &line)?,
                Step::Line(None) => break,
                Step::Shutdown => return self.shut_down(child, lines, console).await,
            }
        }

        debug!("miner output closed; waiting for exit");
        let status = tokio::select! {
            status = child.wait() => Some(status.map_err(LaunchError::Wait)?),
            () = &mut shutdown => None,
        };

        match status {
            Some(status) => self.finish(status, console),
            None => self.shut_down(child, lines, console).await,
        }
    }

    fn launch(&self) -> Result<Child> {
        let spec = &self.spec;

        if !self.fs.is_file(&spec.executable) {
            return Err(LaunchError::ExecutableMissing(spec.executable.clone()));
        }

        self.fs.set_mode(&spec.executable, EXECUTABLE_MODE)?;

        info!(
            path = ?spec.executable,
            cwd = ?spec.working_dir,
            "starting miner process"
        );

        let child = Command::new(&spec.executable)
            .args(&spec.args)
            .current_dir(&spec.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                path: spec.executable.clone(),
                source,
            })?;

        debug!(pid = child.id(), "miner process spawned");
        Ok(child)
    }

    fn forward<W: Write>(&mut self, console: &mut W, line: &str) -> Result<()> {
        writeln!(console, "{line}")?;
        console.flush()?;
        self.lines_forwarded += 1;
        Ok(())
    }

    fn finish<W: Write>(&mut self, status: ExitStatus, console: &mut W) -> Result<SupervisorOutcome> {
        let outcome = if status.success() {
            info!("miner exited successfully");
            SupervisorOutcome::Completed
        } else {
            let code = status.code().unwrap_or(-1);
            warn!(exit_code = code, "miner exited with failure status");
            writeln!(
                console,
                "\n{} exited with code: {}",
                self.spec.display_name(),
                code
            )?;
            console.flush()?;
            SupervisorOutcome::Failed(code)
        };

        self.state = outcome.state();
        Ok(outcome)
    }

    async fn shut_down<W: Write>(
        &mut self,
        mut child: Child,
        mut lines: mpsc::Receiver<String>,
        console: &mut W,
    ) -> Result<SupervisorOutcome> {
        writeln!(console, "\n\nInterrupted by user. Shutting down...")?;
        console.flush()?;
        info!(pid = child.id(), "shutdown requested; asking miner to terminate");

        terminate::request_termination(&mut child)?;

        // Keep draining output while waiting so the child never blocks on a
        // full pipe during its own shutdown.
        let mut open = true;
        let status = loop {
            tokio::select! {
                status = child.wait() => break status.map_err(LaunchError::Wait)?,
                line = lines.recv(), if open => match line {
                    Some(line) => self.forward(console, &line)?,
                    None => open = false,
                },
            }
        };

        // Forward what the child printed while stopping, until both pipes
        // close. A grandchild may keep a pipe open, hence the timeout.
        if open {
            let drain = async {
                while let Some(line) = lines.recv().await {
                    self.forward(console, &line)?;
                }
                Ok::<(), LaunchError>(())
            };
            match tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, drain).await {
                Ok(res) => res?,
                Err(_) => debug!("miner output still open after exit; stopped forwarding"),
            }
        }

        info!(exit_code = ?status.code(), "miner terminated");
        self.state = RunState::Terminated;
        Ok(SupervisorOutcome::Terminated(status.code()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::fs::mock::MockFileSystem;

    #[tokio::test]
    async fn missing_executable_fails_before_spawn() {
        let fs = MockFileSystem::new();
        let spec = LaunchSpec::new("work/miner-1.0/miner", "work/miner-1.0", vec![]);
        let mut supervisor = Supervisor::new(spec, Arc::new(fs));
        let mut console = Vec::new();

        match supervisor.run(&mut console, std::future::pending()).await {
            Err(LaunchError::ExecutableMissing(path)) => {
                assert_eq!(path, Path::new("work/miner-1.0/miner"))
            }
            other => panic!("expected ExecutableMissing, got {other:?}"),
        }
        assert_eq!(supervisor.state(), RunState::NotStarted);
        assert!(console.is_empty());
    }

    #[test]
    fn outcome_maps_to_terminal_state() {
        assert_eq!(SupervisorOutcome::Completed.state(), RunState::Completed);
        assert_eq!(SupervisorOutcome::Failed(7).state(), RunState::Failed);
        assert_eq!(
            SupervisorOutcome::Terminated(Some(0)).state(),
            RunState::Terminated
        );
    }

    #[test]
    fn launch_spec_for_artifact_is_absolute() {
        let artifact = Artifact {
            source_url: "https://example.com/miner.tar.gz".into(),
            dir: PathBuf::from("miner-1.0"),
            executable: PathBuf::from("miner-1.0/miner"),
            provisioned: false,
        };
        let spec = LaunchSpec::for_artifact(&artifact, &MinerSection::default()).unwrap();

        assert!(spec.executable.is_absolute());
        assert!(spec.working_dir.is_absolute());
        assert!(spec.executable.ends_with("miner-1.0/miner"));
        assert_eq!(spec.args[0], "--url");
        assert_eq!(spec.display_name(), "miner");
    }
}
