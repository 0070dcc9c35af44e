use super::*;
use crate::log::message_log;

const CADENCE: RevealCadence = RevealCadence {
    assistant: Duration::from_millis(40),
    autonomous: Duration::from_millis(80),
};

fn drain(rx: &mut broadcast::Receiver<NodeEvent>) -> Vec<NodeEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event);
    }
    seen
}

fn revealed_chars(events: &[NodeEvent]) -> String {
    events
        .iter()
        .filter_map(|event| match event {
            NodeEvent::CharRevealed { ch, .. } => Some(*ch),
            _ => None,
        })
        .collect()
}

#[test]
fn reveal_state_tracks_a_prefix_of_the_target() {
    let mut state = RevealState::new();
    state.retarget("héllo");
    let mut steps = 0;
    while state.advance().is_some() {
        steps += 1;
        assert!(state.target().starts_with(state.revealed()));
        assert!(state.cursor() <= state.target().chars().count());
    }
    assert_eq!(steps, 5);
    assert!(state.is_complete());
    assert_eq!(state.revealed(), "héllo");
    assert_eq!(state.advance(), None);
    assert_eq!(state.cursor(), 5);
}

#[test]
fn retarget_resets_cursor_and_revealed_text() {
    let mut state = RevealState::new();
    state.retarget("Scanning flows...");
    state.advance();
    state.advance();
    state.retarget("BB");
    assert_eq!(state.cursor(), 0);
    assert_eq!(state.revealed(), "");
    assert_eq!(state.target(), "BB");
}

#[test]
fn empty_target_is_immediately_complete() {
    let mut state = RevealState::new();
    state.retarget("");
    assert!(state.is_complete());
    assert_eq!(state.advance(), None);
}

#[tokio::test(start_paused = true)]
async fn reveals_one_unit_per_tick_then_stops_ticking() {
    let (mut writer, reader) = message_log();
    let (_mode_tx, mode_rx) = watch::channel(Mode::Assistant);
    let (events, mut rx) = broadcast::channel(256);
    let typewriter = spawn_typewriter(reader, mode_rx, CADENCE, events);

    writer.append("Ready to assist.").await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(typewriter.is_ticking());

    tokio::time::sleep(Duration::from_millis(40 * 3)).await;
    assert_eq!(typewriter.revealed().await, "Rea");

    tokio::time::sleep(Duration::from_millis(40 * 13)).await;
    assert_eq!(typewriter.revealed().await, "Ready to assist.");
    assert!(!typewriter.is_ticking());

    let events = drain(&mut rx);
    assert_eq!(revealed_chars(&events), "Ready to assist.");
    assert!(matches!(
        events.last(),
        Some(NodeEvent::RevealCompleted { text }) if text == "Ready to assist."
    ));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(drain(&mut rx).is_empty());
    assert!(!typewriter.is_ticking());
}

#[tokio::test(start_paused = true)]
async fn newer_whisper_abandons_the_reveal_in_progress() {
    let (mut writer, reader) = message_log();
    let (_mode_tx, mode_rx) = watch::channel(Mode::Assistant);
    let (events, mut rx) = broadcast::channel(256);
    let typewriter = spawn_typewriter(reader, mode_rx, CADENCE, events);

    writer.append("Scanning system flows.").await;
    tokio::time::sleep(Duration::from_millis(40 * 4 + 1)).await;
    assert_eq!(typewriter.revealed().await, "Scan");

    writer.append("BB").await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    let state = typewriter.state().await;
    assert_eq!(state.target(), "BB");
    assert_eq!(state.revealed(), "");

    tokio::time::sleep(Duration::from_millis(40 * 2)).await;
    assert_eq!(typewriter.revealed().await, "BB");
    assert!(!typewriter.is_ticking());

    let events = drain(&mut rx);
    let started: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            NodeEvent::RevealStarted { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec!["Scanning system flows.", "BB"]);
    assert_eq!(revealed_chars(&events), "ScanBB");
}

#[tokio::test(start_paused = true)]
async fn cadence_follows_mode_at_reveal_start() {
    let (mut writer, reader) = message_log();
    let (mode_tx, mode_rx) = watch::channel(Mode::Autonomous);
    let (events, _rx) = broadcast::channel(256);
    let typewriter = spawn_typewriter(reader, mode_rx, CADENCE, events);

    writer.append("Analyzing anomalies.").await;
    tokio::time::sleep(Duration::from_millis(80 * 2 + 1)).await;
    assert_eq!(typewriter.revealed().await, "An");

    mode_tx.send_replace(Mode::Assistant);
    writer.append("Ready to assist.").await;
    tokio::time::sleep(Duration::from_millis(40 * 2 + 1)).await;
    assert_eq!(typewriter.revealed().await, "Re");
}

#[tokio::test(start_paused = true)]
async fn existing_entries_are_not_replayed() {
    let (mut writer, reader) = message_log();
    writer.append("history").await;

    let (_mode_tx, mode_rx) = watch::channel(Mode::Assistant);
    let (events, mut rx) = broadcast::channel(64);
    let typewriter = spawn_typewriter(reader, mode_rx, CADENCE, events);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(typewriter.revealed().await, "");
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn stopped_typewriter_reveals_nothing_more() {
    let (mut writer, reader) = message_log();
    let (_mode_tx, mode_rx) = watch::channel(Mode::Assistant);
    let (events, mut rx) = broadcast::channel(256);
    let typewriter = spawn_typewriter(reader, mode_rx, CADENCE, events);

    writer.append("Connection established.").await;
    tokio::time::sleep(Duration::from_millis(40 * 2 + 1)).await;
    typewriter.stop().await;
    drain(&mut rx);

    writer.append("Neural pathways online.").await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(drain(&mut rx).is_empty());
}
