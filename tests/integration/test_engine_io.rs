//! Integration Tests for Engine I/O
//!
//! Stream tagging and ordering of engine output, and command delivery, with
//! the `mock-engine` binary on the other end of the pipes.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use engine_console::events;
use engine_console::{Channel, Supervisor};
use std::time::Duration;
use test_utils::{mock_engine_path, EventCollector};

async fn running_engine() -> (Supervisor, EventCollector) {
    let (emitter, events) = events::channel();
    let supervisor = Supervisor::new(emitter);
    supervisor.start(&mock_engine_path()).await.unwrap();
    let mut events = EventCollector::new(events);
    events
        .wait_for_line(Channel::Stdout, "mock engine ready")
        .await
        .unwrap();
    (supervisor, events)
}

#[tokio::test]
async fn test_stderr_lines_are_tagged() {
    let (supervisor, mut events) = running_engine().await;

    supervisor.send("ERR table not found").await.unwrap();
    let event = events
        .wait_for(|e| e.text == "table not found")
        .await
        .expect("stderr line relayed");
    assert_eq!(event.channel, Channel::Stderr);
    assert_eq!(event.to_string(), "[ERR] table not found");

    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn test_per_channel_order_is_preserved() {
    let (supervisor, mut events) = running_engine().await;

    for i in 0..50 {
        supervisor.send(&format!("ECHO out {i}")).await.unwrap();
        supervisor.send(&format!("ERR err {i}")).await.unwrap();
    }
    // The two pipes race, so either last line may already be in `seen`
    events
        .wait_for_seen(|e| e.channel == Channel::Stdout && e.text == "out 49")
        .await
        .expect("last stdout line");
    events
        .wait_for_seen(|e| e.channel == Channel::Stderr && e.text == "err 49")
        .await
        .expect("last stderr line");
    supervisor.stop().await.unwrap();

    let stdout: Vec<String> = events
        .texts(Channel::Stdout)
        .into_iter()
        .filter(|t| t.starts_with("out "))
        .map(str::to_string)
        .collect();
    let stderr: Vec<String> = events
        .texts(Channel::Stderr)
        .into_iter()
        .map(str::to_string)
        .collect();
    assert_eq!(stdout, (0..50).map(|i| format!("out {i}")).collect::<Vec<_>>());
    assert_eq!(stderr, (0..50).map(|i| format!("err {i}")).collect::<Vec<_>>());

    assert!(events.seen.windows(2).all(|w| w[0].sequence < w[1].sequence));
}

#[tokio::test]
async fn test_commands_are_written_verbatim() {
    let (supervisor, mut events) = running_engine().await;

    // Inner whitespace and punctuation pass through untouched
    supervisor
        .send("INSERT INTO t VALUES ('a  b', \"c\");")
        .await
        .unwrap();
    events
        .wait_for_line(Channel::Stdout, "ok: INSERT INTO t VALUES ('a  b', \"c\");")
        .await
        .expect("verbatim command");

    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn test_output_before_exit_is_delivered_before_exit_event() {
    let (supervisor, mut events) = running_engine().await;

    for i in 0..20 {
        supervisor.send(&format!("ECHO last words {i}")).await.unwrap();
    }
    supervisor.send("CRASH").await.unwrap();

    let exited = events
        .wait_for(|e| e.text == "Engine exited.")
        .await
        .expect("exit event");
    events.settle(Duration::from_millis(200)).await;

    let last_line = events
        .seen
        .iter()
        .find(|e| e.text == "last words 19")
        .expect("final output relayed");
    assert!(last_line.sequence < exited.sequence);
}
