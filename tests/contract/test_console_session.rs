//! Contract Tests for the Console Session
//!
//! The session is what a host drives: locate, start, send with history,
//! stop and close. The engine here is the `mock-engine` binary installed
//! under the real engine file name.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use engine_console::{
    Channel, ConsoleConfig, ConsoleSession, ExecutableLocator, LocatorConfig, Notice, OutputEvent,
    SupervisorState,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use test_utils::{session_with_engine, temp_dir, EventCollector};

#[tokio::test]
async fn test_send_records_history_and_echoes() {
    let temp = temp_dir();
    let (mut session, events, _engine) = session_with_engine(temp.path());
    let mut events = EventCollector::new(events);

    assert!(session.start().await);
    assert!(session.send("  PING  ").await);

    let sent = events
        .wait_for_notice(|n| *n == Notice::Sent)
        .await
        .expect("command echo");
    assert_eq!(sent.text, "> PING");
    events.wait_for_line(Channel::Stdout, "PONG").await.unwrap();
    assert_eq!(session.history().entries(), ["PING"]);

    session.close().await;
    assert_eq!(session.state(), SupervisorState::Stopped);
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_write_is_neither_echoed_nor_recorded() {
    let temp = temp_dir();
    let (mut session, events, _engine) = session_with_engine(temp.path());
    let mut events = EventCollector::new(events);

    assert!(session.start().await);
    assert!(session.send("DEAF").await);
    events.wait_for_line(Channel::Stdout, "deaf").await.unwrap();

    assert!(!session.send("PING").await);
    assert!(session.is_running());
    events
        .wait_for_notice(|n| *n == Notice::WriteFailed)
        .await
        .expect("write failure reported");

    // Echoes only follow writes that reached the engine
    assert_eq!(session.history().entries(), ["DEAF"]);
    let echoes: Vec<&str> = events
        .seen
        .iter()
        .filter(|e| e.notice == Some(Notice::Sent))
        .map(|e| e.text.as_str())
        .collect();
    assert_eq!(echoes, ["> DEAF"]);

    session.close().await;
    assert_eq!(session.state(), SupervisorState::Stopped);
}

#[tokio::test]
async fn test_blank_send_produces_nothing() {
    let temp = temp_dir();
    let (mut session, events, _engine) = session_with_engine(temp.path());
    let mut events = EventCollector::new(events);

    assert!(session.start().await);
    events
        .wait_for_line(Channel::Stdout, "mock engine ready")
        .await
        .unwrap();
    let before = events.seen.len();

    assert!(!session.send("   ").await);
    assert!(!session.send("\t").await);

    events.settle(Duration::from_millis(200)).await;
    assert_eq!(events.seen.len(), before);
    assert!(session.history().is_empty());

    session.close().await;
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let temp = temp_dir();
    let (session, events, _engine) = session_with_engine(temp.path());
    let mut events = EventCollector::new(events);

    assert!(session.start().await);
    let pid = session.process().and_then(|p| p.pid);
    assert!(session.start().await);
    assert!(session.start_if_stopped().await);
    assert_eq!(session.process().and_then(|p| p.pid), pid);

    session.close().await;
    events.settle(Duration::from_millis(200)).await;
    assert_eq!(events.count_notices(|n| *n == Notice::Started), 1);
}

#[tokio::test]
async fn test_engine_runs_in_its_own_directory() {
    let temp = temp_dir();
    let (mut session, events, engine) = session_with_engine(temp.path());
    let mut events = EventCollector::new(events);

    assert!(session.start().await);
    let process = session.process().unwrap();
    assert_eq!(process.executable, engine);

    session.send("CWD").await;
    let expected = temp.path().canonicalize().unwrap();
    let cwd = events
        .wait_for(|e| e.channel == Channel::Stdout && e.text.starts_with('/'))
        .await;
    #[cfg(unix)]
    assert_eq!(
        std::path::PathBuf::from(cwd.unwrap().text).canonicalize().unwrap(),
        expected
    );
    #[cfg(not(unix))]
    let _ = (cwd, expected);

    session.close().await;
}

#[tokio::test]
async fn test_missing_engine_reports_remedy() {
    let temp = temp_dir();
    let locator = LocatorConfig {
        max_parent_levels: 1,
        base_dir: Some(temp.path().to_path_buf()),
        ..LocatorConfig::default()
    };
    let mut session =
        ConsoleSession::with_locator(ConsoleConfig::default(), ExecutableLocator::new(locator));
    let mut events = EventCollector::new(session.take_events().unwrap());

    assert!(!session.start().await);
    assert_eq!(session.state(), SupervisorState::Stopped);

    events.settle(Duration::from_millis(100)).await;
    assert_eq!(events.seen[0].text, "Error: engine executable not found");
    assert!(events
        .seen
        .iter()
        .any(|e| e.text.contains("Build the 'Db engine' project first.")));
    assert!(events.seen.iter().all(|e| e.notice == Some(Notice::NotFound)));
}

#[tokio::test]
async fn test_stop_in_background_returns_immediately() {
    let temp = temp_dir();
    let (mut session, events, _engine) = session_with_engine(temp.path());
    let mut events = EventCollector::new(events);

    assert!(session.start().await);
    session.send("HANG").await;
    events.wait_for_line(Channel::Stdout, "hanging").await.unwrap();

    let started = Instant::now();
    let handle = session.stop_in_background();
    assert!(started.elapsed() < Duration::from_millis(500));

    handle.await.unwrap();
    assert_eq!(session.state(), SupervisorState::Stopped);
    events
        .wait_for_notice(|n| *n == Notice::Stopped)
        .await
        .expect("stop completed in the background");
}

#[tokio::test]
async fn test_output_sink_receives_everything() {
    let temp = temp_dir();
    let (session, events, _engine) = session_with_engine(temp.path());
    drop(events);

    // A second session owns its queue, so hand the sink that one
    let locator = session.locator().clone();
    let mut session = ConsoleSession::with_locator(ConsoleConfig::default(), locator);
    let received: Arc<Mutex<Vec<OutputEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let dispatcher = session
        .on_output(move |event: OutputEvent| sink.lock().unwrap().push(event))
        .unwrap();

    assert!(session.start().await);
    session.send("ECHO hello").await;

    let deadline = Instant::now() + Duration::from_secs(10);
    while !received.lock().unwrap().iter().any(|e| e.text == "hello") {
        assert!(Instant::now() < deadline, "sink never saw the engine reply");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    session.close().await;
    drop(session);
    tokio::time::timeout(Duration::from_secs(5), dispatcher)
        .await
        .unwrap()
        .unwrap();

    let received = received.lock().unwrap();
    assert!(received.windows(2).all(|w| w[0].sequence < w[1].sequence));
    assert!(received.iter().any(|e| e.notice == Some(Notice::Stopped)));
}

#[tokio::test]
async fn test_close_when_idle_only_warns() {
    let temp = temp_dir();
    let (session, events, _engine) = session_with_engine(temp.path());
    let mut events = EventCollector::new(events);

    session.close().await;
    events.settle(Duration::from_millis(100)).await;
    assert_eq!(events.seen.len(), 1);
    assert_eq!(events.seen[0].notice, Some(Notice::NotRunning));
}

#[tokio::test]
async fn test_auto_start_follows_config() {
    let temp = temp_dir();
    let (session, _events, _engine) = session_with_engine(temp.path());
    let locator = session.locator().clone();

    let console = ConsoleConfig {
        auto_start: true,
        ..ConsoleConfig::default()
    };
    let session = ConsoleSession::with_locator(console, locator);
    assert!(session.auto_start().await);
    assert!(session.is_running());
    session.close().await;
}
