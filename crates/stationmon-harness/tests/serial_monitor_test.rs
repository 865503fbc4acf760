//! Serial monitor loop under scripted input.
//!
//! Runs on tokio's paused clock. Reads from a drained source wait out their
//! poll timeout, so the virtual time of every restart is exact.

use std::time::Duration;

use stationmon_app::{MonitorError, SerialMonitor};
use stationmon_core::{Command, MonitorConfig, RestartSignal};
use stationmon_harness::{
    InvariantRegistry, RecordingRestarter, ScriptedSource, SerialSnapshot, SimEnv, SimError,
    SystemSnapshot,
};
use tokio::time::Instant;

type Monitor = SerialMonitor<ScriptedSource, RecordingRestarter, SimEnv>;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn monitor(
    source: &ScriptedSource,
    restarter: &RecordingRestarter,
    config: MonitorConfig,
) -> (Monitor, RestartSignal) {
    let signal = RestartSignal::new();
    let monitor =
        SerialMonitor::new(source.clone(), restarter.clone(), SimEnv::new(), config, signal.clone());
    (monitor, signal)
}

#[tokio::test(start_paused = true)]
async fn keyword_split_across_reads_restarts_after_grace() {
    let source = ScriptedSource::new();
    source.push_chunk(b"hello\nREB".to_vec());
    source.push_chunk(b"OOT now\n".to_vec());
    let restarter = RecordingRestarter::new();
    let (monitor, signal) = monitor(&source, &restarter, MonitorConfig::default());

    let start = Instant::now();
    monitor.run().await.unwrap();

    // Second read happens after one idle interval, restart after the grace delay
    assert_eq!(restarter.restarts(), vec![start + ms(10) + ms(200)]);
    assert_eq!(signal.request_count(), 1);
    assert!(source.is_drained());
}

#[tokio::test(start_paused = true)]
async fn unrecognized_lines_never_restart() {
    let source = ScriptedSource::new();
    source.push_chunk(b"status\n".to_vec());
    source.push_chunk(b"\n\n  \r\n".to_vec());
    source.push_chunk(b"reboot\n".to_vec());
    let restarter = RecordingRestarter::new();
    let (monitor, signal) = monitor(&source, &restarter, MonitorConfig::default());

    let result = tokio::time::timeout(Duration::from_secs(5), monitor.run()).await;

    assert!(result.is_err(), "monitor must keep running");
    assert!(restarter.restarts().is_empty());
    assert!(!signal.is_requested());
    assert!(source.is_drained());
}

#[tokio::test(start_paused = true)]
async fn read_failure_does_not_stop_the_loop() {
    let source = ScriptedSource::new();
    source.push_failure("uart framing error");
    source.push_chunk(b"REBOOT\n".to_vec());
    let restarter = RecordingRestarter::new();
    let (monitor, _signal) = monitor(&source, &restarter, MonitorConfig::default());

    let start = Instant::now();
    monitor.run().await.unwrap();

    assert_eq!(restarter.restarts(), vec![start + ms(210)]);
}

#[tokio::test(start_paused = true)]
async fn restart_failure_is_reported() {
    let source = ScriptedSource::new();
    source.push_chunk(b"REBOOT\n".to_vec());
    let restarter = RecordingRestarter::failing("watchdog refused");
    let (monitor, _signal) = monitor(&source, &restarter, MonitorConfig::default());

    let result = monitor.run().await;

    assert!(matches!(
        result,
        Err(MonitorError::Restart(SimError(ref reason))) if reason == "watchdog refused"
    ));
    assert_eq!(restarter.restarts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn restart_requested_elsewhere_is_performed_by_the_loop() {
    let source = ScriptedSource::new();
    let restarter = RecordingRestarter::new();
    let (monitor, signal) = monitor(&source, &restarter, MonitorConfig::default());

    signal.request();
    let start = Instant::now();
    monitor.run().await.unwrap();

    // One idle read (poll timeout), then the grace delay
    assert_eq!(restarter.restarts(), vec![start + ms(100) + ms(200)]);
}

#[tokio::test(start_paused = true)]
async fn overflow_discards_partial_line_and_recovers() {
    let source = ScriptedSource::new();
    source.push_chunk(vec![b'x'; 40]);
    source.push_chunk(b"\n".to_vec());
    source.push_chunk(b"REBOOT\n".to_vec());
    let restarter = RecordingRestarter::new();
    let config = MonitorConfig { line_capacity: 16, ..MonitorConfig::default() };
    let (mut monitor, signal) = monitor(&source, &restarter, config);
    let invariants = InvariantRegistry::standard();

    assert!(monitor.poll_once().await.is_empty());
    assert_eq!(monitor.framer().overflow_resets(), 1);
    assert!(monitor.framer().is_empty());
    invariants.assert_all(
        &SystemSnapshot::empty().with_serial(SerialSnapshot::capture(monitor.framer(), &signal)),
        "after overflow",
    );

    // Nothing of the flood survives to be framed by the next terminator
    assert!(monitor.poll_once().await.is_empty());
    assert!(!signal.is_requested());

    assert_eq!(monitor.poll_once().await, vec![Command::Restart]);
    assert!(signal.is_requested());
    assert!(monitor.framer().is_empty());
    assert!(restarter.restarts().is_empty(), "dispatch never restarts inline");
}

#[tokio::test(start_paused = true)]
async fn configured_keyword_replaces_default() {
    let source = ScriptedSource::new();
    source.push_chunk(b"REBOOT\nplease RESET\n".to_vec());
    let restarter = RecordingRestarter::new();
    let config = MonitorConfig { restart_keyword: "RESET".to_string(), ..MonitorConfig::default() };
    let (mut monitor, signal) = monitor(&source, &restarter, config);

    let commands = monitor.poll_once().await;

    assert_eq!(commands, vec![Command::Unrecognized, Command::Restart]);
    assert_eq!(signal.request_count(), 1);
}
