use super::*;

const ACK_DELAY: Duration = Duration::from_secs(1);

fn tray() -> (CommandTray, ActivityLog, broadcast::Receiver<NodeEvent>) {
    let (events, rx) = broadcast::channel(64);
    let activity = ActivityLog::new(events.clone());
    let tray = CommandTray::new(ACK_DELAY, activity.clone(), events).expect("tray");
    (tray, activity, rx)
}

#[test]
fn rejects_zero_ack_delay() {
    let (events, _) = broadcast::channel(4);
    let activity = ActivityLog::new(events.clone());
    assert!(matches!(
        CommandTray::new(Duration::ZERO, activity, events),
        Err(ConfigError::NonPositivePeriod {
            field: "command_ack_delay_ms"
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn acknowledges_after_the_delay() {
    let (tray, activity, mut rx) = tray();

    assert!(tray.invoke("  scan realms ").await);
    assert_eq!(tray.output().await, vec!["> scan realms"]);
    assert_eq!(
        activity.entries().await[0].message,
        "[USER]: Issued command - scan realms"
    );

    tokio::time::sleep(ACK_DELAY - Duration::from_millis(1)).await;
    assert_eq!(tray.output().await.len(), 1);

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(
        tray.output().await,
        vec![
            "> scan realms",
            "[NODE]: Command \"scan realms\" executed. Result: Success."
        ]
    );
    assert_eq!(tray.pending_acks().await, 0);

    let lines: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
        .filter_map(|event| match event {
            NodeEvent::CommandOutput { line } => Some(line),
            _ => None,
        })
        .collect();
    assert_eq!(lines.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn blank_commands_are_ignored() {
    let (tray, activity, _rx) = tray();
    assert!(!tray.invoke("   ").await);
    assert!(!tray.invoke("").await);

    tokio::time::sleep(ACK_DELAY * 2).await;
    assert!(tray.output().await.is_empty());
    assert!(activity.entries().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn close_cancels_pending_acknowledgements() {
    let (tray, _activity, _rx) = tray();
    tray.invoke("first").await;
    tray.invoke("second").await;
    assert_eq!(tray.pending_acks().await, 2);

    tray.close().await;
    assert!(tray.output().await.is_empty());
    assert_eq!(tray.pending_acks().await, 0);

    tokio::time::sleep(ACK_DELAY * 3).await;
    assert!(tray.output().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn trigger_logs_the_action_label() {
    let (tray, activity, _rx) = tray();
    tray.trigger(Action::AutoPatch).await;
    tray.trigger(Action::ActivityLog).await;

    let messages: Vec<_> = activity
        .entries()
        .await
        .into_iter()
        .map(|entry| entry.message)
        .collect();
    assert_eq!(
        messages,
        vec![
            "[NODE]: Triggered action - AUTO-PATCH",
            "[NODE]: Triggered action - ACTIVITY_LOG"
        ]
    );
    assert!(tray.output().await.is_empty());
}
