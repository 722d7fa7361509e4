// tests/supervisor.rs

#![cfg(unix)]

mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use minerlaunch::errors::LaunchError;
use minerlaunch::fs::RealFileSystem;
use minerlaunch::supervise::{LaunchSpec, Supervisor, SupervisorOutcome, EXECUTABLE_MODE};
use minerlaunch::types::RunState;

use common::{init_tracing, mode_of, wait_for_file, with_timeout, write_script};

fn supervisor_for(exe: &Path, working_dir: &Path, args: Vec<String>) -> Supervisor {
    Supervisor::new(
        LaunchSpec::new(exe, working_dir, args),
        Arc::new(RealFileSystem),
    )
}

fn console_lines(console: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(console)
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn forwards_lines_in_order_and_completes() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let exe = write_script(
        tmp.path(),
        "miner",
        "for i in 1 2 3 4 5; do echo \"line $i\"; done",
        0o644,
    );
    let mut sup = supervisor_for(&exe, tmp.path(), vec![]);
    let mut console = Vec::new();

    let outcome = with_timeout(sup.run(&mut console, std::future::pending()))
        .await
        .unwrap();

    assert_eq!(outcome, SupervisorOutcome::Completed);
    assert_eq!(sup.state(), RunState::Completed);
    assert_eq!(sup.lines_forwarded(), 5);
    assert_eq!(
        console_lines(&console),
        vec!["line 1", "line 2", "line 3", "line 4", "line 5"]
    );
    assert_eq!(mode_of(&exe), EXECUTABLE_MODE);
}

#[tokio::test]
async fn stderr_is_merged_into_the_console() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let exe = write_script(tmp.path(), "miner", "echo to-stdout\necho to-stderr 1>&2", 0o755);
    let mut sup = supervisor_for(&exe, tmp.path(), vec![]);
    let mut console = Vec::new();

    with_timeout(sup.run(&mut console, std::future::pending()))
        .await
        .unwrap();

    let lines = console_lines(&console);
    assert!(lines.contains(&"to-stdout".to_string()), "{lines:?}");
    assert!(lines.contains(&"to-stderr".to_string()), "{lines:?}");
}

#[tokio::test]
async fn child_runs_in_the_given_working_directory() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let run_dir = tmp.path().join("run");
    std::fs::create_dir_all(&run_dir).unwrap();
    let exe = write_script(&tmp.path().join("bin"), "miner", "pwd -P", 0o755);
    let mut sup = supervisor_for(&exe, &run_dir, vec![]);
    let mut console = Vec::new();

    with_timeout(sup.run(&mut console, std::future::pending()))
        .await
        .unwrap();

    let expected = std::fs::canonicalize(&run_dir).unwrap();
    assert_eq!(console_lines(&console), vec![expected.display().to_string()]);
}

#[tokio::test]
async fn arguments_are_passed_through_verbatim() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let exe = write_script(tmp.path(), "miner", "for a in \"$@\"; do echo \"$a\"; done", 0o755);
    let args: Vec<String> = ["--url", "pool:443", "--pass", "with space"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut sup = supervisor_for(&exe, tmp.path(), args.clone());
    let mut console = Vec::new();

    with_timeout(sup.run(&mut console, std::future::pending()))
        .await
        .unwrap();

    assert_eq!(console_lines(&console), args);
}

#[tokio::test]
async fn non_zero_exit_is_reported_not_raised() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let exe = write_script(tmp.path(), "miner", "echo giving up\nexit 7", 0o755);
    let mut sup = supervisor_for(&exe, tmp.path(), vec![]);
    let mut console = Vec::new();

    let outcome = with_timeout(sup.run(&mut console, std::future::pending()))
        .await
        .unwrap();

    assert_eq!(outcome, SupervisorOutcome::Failed(7));
    assert_eq!(sup.state(), RunState::Failed);
    let text = String::from_utf8_lossy(&console);
    assert!(text.contains("giving up"));
    assert!(text.contains("miner exited with code: 7"), "{text}");
}

#[tokio::test]
async fn shutdown_sends_termination_and_waits_for_exit() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let exe = write_script(
        tmp.path(),
        "miner",
        "trap 'echo stopping; touch terminated; exit 0' TERM\n\
         touch ready\n\
         echo hashing\n\
         while true; do sleep 0.1; done",
        0o755,
    );
    let ready = tmp.path().join("ready");
    let mut sup = supervisor_for(&exe, tmp.path(), vec![]);
    let mut console = Vec::new();

    let shutdown = async { wait_for_file(&ready, Duration::from_secs(5)).await };
    let outcome = with_timeout(sup.run(&mut console, shutdown)).await.unwrap();

    assert_eq!(outcome, SupervisorOutcome::Terminated(Some(0)));
    assert_eq!(sup.state(), RunState::Terminated);
    assert!(tmp.path().join("terminated").exists(), "child never saw SIGTERM");

    let text = String::from_utf8_lossy(&console);
    assert!(text.contains("Interrupted by user. Shutting down..."), "{text}");
    assert!(text.contains("stopping"), "output from the TERM handler was lost: {text}");
}

#[tokio::test]
async fn output_printed_while_stopping_is_forwarded() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let exe = write_script(
        tmp.path(),
        "miner",
        "trap 'for i in 1 2 3 4 5 6 7 8 9 10; do echo \"bye$i\"; done; exit 0' TERM\n\
         touch ready\n\
         while true; do sleep 0.1; done",
        0o755,
    );
    let ready = tmp.path().join("ready");
    let mut sup = supervisor_for(&exe, tmp.path(), vec![]);
    let mut console = Vec::new();

    let shutdown = async { wait_for_file(&ready, Duration::from_secs(5)).await };
    let outcome = with_timeout(sup.run(&mut console, shutdown)).await.unwrap();

    assert_eq!(outcome, SupervisorOutcome::Terminated(Some(0)));
    let farewell: Vec<String> = console_lines(&console)
        .into_iter()
        .filter(|l| l.starts_with("bye"))
        .collect();
    let expected: Vec<String> = (1..=10).map(|i| format!("bye{i}")).collect();
    assert_eq!(farewell, expected);
}

#[tokio::test]
async fn missing_executable_is_fatal_before_spawn() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let exe = tmp.path().join("miner-1.0").join("miner");
    let mut sup = supervisor_for(&exe, tmp.path(), vec![]);
    let mut console = Vec::new();

    match sup.run(&mut console, std::future::pending()).await {
        Err(LaunchError::ExecutableMissing(path)) => assert_eq!(path, exe),
        other => panic!("expected ExecutableMissing, got {other:?}"),
    }
    assert_eq!(sup.state(), RunState::NotStarted);
    assert!(console.is_empty());
}

#[tokio::test]
async fn a_supervisor_launches_at_most_once() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let exe = write_script(tmp.path(), "miner", "echo once", 0o755);
    let mut sup = supervisor_for(&exe, tmp.path(), vec![]);
    let mut console = Vec::new();

    with_timeout(sup.run(&mut console, std::future::pending()))
        .await
        .unwrap();
    let again = sup.run(&mut console, std::future::pending()).await;

    assert!(matches!(again, Err(LaunchError::AlreadyStarted)), "{again:?}");
    assert_eq!(console_lines(&console), vec!["once"]);
}
