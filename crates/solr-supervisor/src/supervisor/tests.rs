//! Unit tests for the supervisor module.
//!
//! Workers are `/bin/sh` scripts standing in for the Java process.

#![cfg(unix)]

use super::*;
use solr_log_collection::CircularBufferOutputSink;
use solr_process::process_exists;
use solr_process_state::SupervisorPhase;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

fn test_config(attempts: u32) -> SupervisorConfig {
    SupervisorConfig::new("/tmp", "8983")
        .with_id("test-worker")
        .with_startup_wait_attempts(attempts)
        .with_grace_period(Duration::from_millis(500))
}

fn sh(script: &str) -> WorkerCommand {
    WorkerCommand::new("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

fn always_ready() -> Arc<dyn ReadinessProbe> {
    Arc::new(|| true)
}

fn never_ready() -> Arc<dyn ReadinessProbe> {
    Arc::new(|| false)
}

fn buffer() -> Arc<CircularBufferOutputSink> {
    Arc::new(CircularBufferOutputSink::new(100))
}

/// Poll `predicate` every 10ms. Panics after `timeout`.
async fn wait_until(what: &str, timeout: Duration, predicate: impl Fn() -> bool) {
    let result = tokio::time::timeout(timeout, async {
        while !predicate() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    if result.is_err() {
        panic!("timed out after {:?} waiting for {}", timeout, what);
    }
}

fn read_pid(path: &Path) -> u32 {
    std::fs::read_to_string(path)
        .unwrap()
        .trim()
        .parse()
        .unwrap()
}

#[tokio::test]
async fn test_pid_present_while_running_and_absent_after_shutdown() {
    let supervisor = Supervisor::launch(
        test_config(5),
        sh("exec sleep 30"),
        always_ready(),
        buffer(),
    )
    .await
    .unwrap();

    let pid = supervisor.get_process_id().await.expect("pid while running");
    assert!(pid > 0);
    assert!(process_exists(pid).unwrap());
    assert_eq!(supervisor.phase().await.unwrap(), SupervisorPhase::Running);

    supervisor.shutdown().await.unwrap();

    assert_eq!(supervisor.get_process_id().await, None);
    assert_eq!(supervisor.phase().await.unwrap(), SupervisorPhase::Stopped);
    assert_eq!(supervisor.stopped().await.unwrap(), StopReason::Normal);

    wait_until("worker exit", Duration::from_secs(5), || {
        !process_exists(pid).unwrap_or(false)
    })
    .await;
}

#[tokio::test]
async fn test_double_shutdown_is_noop() {
    let supervisor = Supervisor::launch(
        test_config(5),
        sh("exec sleep 30"),
        always_ready(),
        buffer(),
    )
    .await
    .unwrap();

    supervisor.shutdown().await.unwrap();
    supervisor.shutdown().await.unwrap();

    assert_eq!(supervisor.phase().await.unwrap(), SupervisorPhase::Stopped);
    assert_eq!(supervisor.stop_reason(), Some(StopReason::Normal));
}

#[tokio::test]
async fn test_nonzero_exit_while_running_crashes() {
    let supervisor = Supervisor::launch(
        test_config(5),
        sh("sleep 0.3; exit 3"),
        always_ready(),
        buffer(),
    )
    .await
    .unwrap();

    let reason = tokio::time::timeout(Duration::from_secs(5), supervisor.stopped())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(reason, StopReason::AbnormalExit(ExitCause::Status(3)));
    assert_eq!(
        supervisor.phase().await.unwrap(),
        SupervisorPhase::CrashedStopped
    );
    assert_eq!(supervisor.get_process_id().await, None);

    // Shutdown after a crash is answered harmlessly.
    supervisor.shutdown().await.unwrap();
    assert_eq!(
        supervisor.phase().await.unwrap(),
        SupervisorPhase::CrashedStopped
    );
    supervisor.wait_for_exit().await.unwrap();
}

#[tokio::test]
async fn test_killed_by_signal_while_running_crashes() {
    let supervisor = Supervisor::launch(
        test_config(5),
        sh("sleep 0.3; kill -9 $$"),
        always_ready(),
        buffer(),
    )
    .await
    .unwrap();

    let reason = tokio::time::timeout(Duration::from_secs(5), supervisor.stopped())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(reason, StopReason::AbnormalExit(ExitCause::Signal(9)));
}

#[tokio::test]
async fn test_zero_exit_while_running_crashes() {
    let supervisor = Supervisor::launch(
        test_config(5),
        sh("sleep 0.3; exit 0"),
        always_ready(),
        buffer(),
    )
    .await
    .unwrap();

    let reason = tokio::time::timeout(Duration::from_secs(5), supervisor.stopped())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(reason, StopReason::AbnormalExit(ExitCause::Status(0)));
    assert!(reason.is_failure());
    assert_eq!(
        supervisor.phase().await.unwrap(),
        SupervisorPhase::CrashedStopped
    );
}

#[tokio::test]
async fn test_wait_for_exit_lets_term_handler_finish() {
    let dir = tempfile::tempdir().unwrap();
    let ready = dir.path().join("ready");
    let marker = dir.path().join("stopped");
    let script = format!(
        "trap 'sleep 1; echo done > {}; exit 0' TERM; touch {}; while true; do sleep 0.1; done",
        marker.display(),
        ready.display()
    );
    let ready_file = ready.clone();
    let probe: Arc<dyn ReadinessProbe> = Arc::new(move || ready_file.exists());
    let config = test_config(10).with_grace_period(Duration::from_secs(5));

    let supervisor = Supervisor::launch(config, sh(&script), probe, buffer())
        .await
        .unwrap();
    let pid = supervisor.get_process_id().await.unwrap();

    supervisor.shutdown().await.unwrap();
    supervisor.wait_for_exit().await.unwrap();

    assert_eq!(std::fs::read_to_string(&marker).unwrap().trim(), "done");
    assert!(!process_exists(pid).unwrap());
}

#[tokio::test]
async fn test_shutdown_after_unreported_exit() {
    // The exit report goes to a channel the actor never reads, so the
    // actor is still Running when the shutdown arrives.
    let (watcher_tx, _watcher_rx) = mpsc::unbounded_channel();
    let config = test_config(5);
    let handle = ProcessHandle::spawn(
        &config.id,
        &sh("exec sleep 30"),
        config.grace_period,
        watcher_tx,
    )
    .unwrap();
    let pid = handle.process_id().unwrap();

    let status = std::process::Command::new("kill")
        .args(["-9", &pid.to_string()])
        .status()
        .unwrap();
    assert!(status.success());
    tokio::time::timeout(Duration::from_secs(5), handle.wait_released())
        .await
        .unwrap();
    assert_eq!(handle.process_id(), None);

    let mut state_machine = SupervisorStateMachine::new(&config.id);
    state_machine.transition_to_running().unwrap();
    let monitor = ExitMonitor::new(config.id.as_str(), buffer());
    let (_events_tx, events_rx) = mpsc::unbounded_channel();

    let supervisor = Supervisor::spawn_actor(config, handle, state_machine, monitor, events_rx);
    assert_eq!(supervisor.phase().await.unwrap(), SupervisorPhase::Running);
    assert_eq!(supervisor.get_process_id().await, None);

    assert_eq!(supervisor.shutdown().await, Ok(()));
    assert_eq!(supervisor.phase().await.unwrap(), SupervisorPhase::Stopped);
    assert_eq!(supervisor.stopped().await.unwrap(), StopReason::Normal);
    supervisor.wait_for_exit().await.unwrap();
}

#[tokio::test]
async fn test_readiness_timeout_terminates_worker() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("worker.pid");
    let script = format!("echo $$ > {}; exec sleep 30", pid_file.display());

    let err = Supervisor::launch(test_config(2), sh(&script), never_ready(), buffer())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SupervisorError::readiness_timed_out("test-worker", 2)
    );

    let pid = read_pid(&pid_file);
    wait_until("timed out worker to exit", Duration::from_secs(5), || {
        !process_exists(pid).unwrap_or(false)
    })
    .await;
}

#[tokio::test]
async fn test_exit_during_startup_fails_fast() {
    let start = std::time::Instant::now();

    let err = Supervisor::launch(test_config(30), sh("exit 7"), never_ready(), buffer())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SupervisorError::exited_during_startup("test-worker", ExitCause::Status(7))
    );
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_readiness_waits_for_probe() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let probe: Arc<dyn ReadinessProbe> =
        Arc::new(move || counter.fetch_add(1, Ordering::SeqCst) >= 1);

    let supervisor = Supervisor::launch(test_config(5), sh("exec sleep 30"), probe, buffer())
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    supervisor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_spawn_failure() {
    let command = WorkerCommand::new("/nonexistent/bin/java", vec![]);
    let err = Supervisor::launch(test_config(5), command, always_ready(), buffer())
        .await
        .unwrap_err();

    assert!(matches!(err, SupervisorError::SpawnFailed { .. }));
}

#[tokio::test]
async fn test_output_reaches_sink() {
    let sink = buffer();
    let supervisor = Supervisor::launch(
        test_config(5),
        sh("echo 'Started SocketConnector'; echo 'warming caches' >&2; exec sleep 30"),
        always_ready(),
        sink.clone(),
    )
    .await
    .unwrap();

    wait_until("two output lines", Duration::from_secs(5), || {
        sink.entries().len() == 2
    })
    .await;

    let lines = sink.lines();
    assert!(lines.contains(&"Started SocketConnector".to_string()));
    assert!(lines.contains(&"warming caches".to_string()));

    let info = supervisor.info().await.unwrap();
    assert_eq!(info.output_lines, 2);
    assert_eq!(info.listen_port, "8983");

    supervisor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_info_reports_history() {
    let supervisor = Supervisor::launch(
        test_config(5),
        sh("exec sleep 30"),
        always_ready(),
        buffer(),
    )
    .await
    .unwrap();
    supervisor.shutdown().await.unwrap();

    let info = supervisor.info().await.unwrap();
    assert_eq!(info.id, "test-worker");
    assert_eq!(info.phase, SupervisorPhase::Stopped);
    assert_eq!(info.pid, None);
    assert_eq!(info.stop_reason, Some(StopReason::Normal));

    let phases: Vec<_> = info.transitions.iter().map(|t| t.to_phase).collect();
    assert_eq!(
        phases,
        vec![
            SupervisorPhase::Running,
            SupervisorPhase::Terminating,
            SupervisorPhase::Stopped
        ]
    );
}

#[tokio::test]
async fn test_dropping_all_handles_shuts_down_worker() {
    let supervisor = Supervisor::launch(
        test_config(5),
        sh("exec sleep 30"),
        always_ready(),
        buffer(),
    )
    .await
    .unwrap();

    let pid = supervisor.get_process_id().await.unwrap();
    let clone = supervisor.clone();
    drop(supervisor);
    assert_eq!(clone.get_process_id().await, Some(pid));
    drop(clone);

    wait_until("orphaned worker to exit", Duration::from_secs(5), || {
        !process_exists(pid).unwrap_or(false)
    })
    .await;
}
