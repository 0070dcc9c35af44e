//! Away-from-keyboard detection: idle long enough and the node takes over.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use shared::domain::Mode;
use tokio::sync::Notify;
use tracing::info;

use crate::timer::TimerHandle;

#[async_trait]
pub trait ModeControl: Send + Sync + 'static {
    fn current(&self) -> Mode;

    /// Returns false when `mode` was already active.
    async fn apply(&self, mode: Mode) -> bool;
}

pub struct PresenceMonitor {
    touched: Arc<Notify>,
    away: Arc<AtomicBool>,
    timer: TimerHandle,
}

impl PresenceMonitor {
    pub fn spawn(idle_timeout: Duration, control: Arc<dyn ModeControl>) -> Self {
        let touched = Arc::new(Notify::new());
        let away = Arc::new(AtomicBool::new(false));
        let timer = TimerHandle::spawn(watch_presence(
            idle_timeout,
            control,
            Arc::clone(&touched),
            Arc::clone(&away),
        ));
        Self {
            touched,
            away,
            timer,
        }
    }

    /// Records user activity and restarts the idle countdown.
    pub fn touch(&self) {
        self.touched.notify_one();
    }

    /// Forgets an idle handover after an explicit mode choice, without
    /// restoring assistant mode, and restarts the countdown.
    pub fn reset(&self) {
        self.away.store(false, Ordering::SeqCst);
        self.touched.notify_one();
    }

    pub fn is_away(&self) -> bool {
        self.away.load(Ordering::SeqCst)
    }

    pub async fn stop(self) {
        self.timer.cancel().await;
    }
}

async fn watch_presence(
    idle_timeout: Duration,
    control: Arc<dyn ModeControl>,
    touched: Arc<Notify>,
    away: Arc<AtomicBool>,
) {
    loop {
        let idle = !away.load(Ordering::SeqCst);
        tokio::select! {
            biased;
            _ = touched.notified() => {
                if away.swap(false, Ordering::SeqCst) {
                    info!("presence: user returned");
                    control.apply(Mode::Assistant).await;
                }
            }
            _ = tokio::time::sleep(idle_timeout), if idle => {
                // A manual switch to autonomous is not ours to undo later.
                if control.current() == Mode::Assistant {
                    info!(idle_ms = idle_timeout.as_millis() as u64, "presence: user away");
                    away.store(true, Ordering::SeqCst);
                    control.apply(Mode::Autonomous).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    const IDLE: Duration = Duration::from_secs(10);

    #[derive(Default)]
    struct RecordingControl {
        mode: Mutex<Mode>,
        applied: Mutex<Vec<Mode>>,
    }

    impl RecordingControl {
        fn applied(&self) -> Vec<Mode> {
            self.applied.lock().expect("applied").clone()
        }
    }

    #[async_trait]
    impl ModeControl for RecordingControl {
        fn current(&self) -> Mode {
            *self.mode.lock().expect("mode")
        }

        async fn apply(&self, mode: Mode) -> bool {
            let mut current = self.mode.lock().expect("mode");
            if *current == mode {
                return false;
            }
            *current = mode;
            self.applied.lock().expect("applied").push(mode);
            true
        }
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timeout_switches_to_autonomous_and_touch_restores() {
        let control = Arc::new(RecordingControl::default());
        let monitor = PresenceMonitor::spawn(IDLE, control.clone());

        tokio::time::sleep(IDLE - Duration::from_millis(1)).await;
        assert!(control.applied().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(control.applied(), vec![Mode::Autonomous]);
        assert!(monitor.is_away());

        tokio::time::sleep(IDLE * 3).await;
        assert_eq!(control.applied(), vec![Mode::Autonomous]);

        monitor.touch();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(control.applied(), vec![Mode::Autonomous, Mode::Assistant]);
        assert!(!monitor.is_away());
    }

    #[tokio::test(start_paused = true)]
    async fn touches_restart_the_countdown() {
        let control = Arc::new(RecordingControl::default());
        let monitor = PresenceMonitor::spawn(IDLE, control.clone());

        for _ in 0..5 {
            tokio::time::sleep(IDLE / 2).await;
            monitor.touch();
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(control.applied().is_empty());
        assert!(!monitor.is_away());

        monitor.stop().await;
        tokio::time::sleep(IDLE * 2).await;
        assert!(control.applied().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_rearms_the_idle_countdown() {
        let control = Arc::new(RecordingControl::default());
        let monitor = PresenceMonitor::spawn(IDLE, control.clone());

        tokio::time::sleep(IDLE + Duration::from_millis(1)).await;
        assert!(monitor.is_away());

        // The user picks assistant mode by hand instead of touching.
        control.apply(Mode::Assistant).await;
        monitor.reset();
        assert!(!monitor.is_away());

        tokio::time::sleep(IDLE + Duration::from_millis(1)).await;
        assert_eq!(
            control.applied(),
            vec![Mode::Autonomous, Mode::Assistant, Mode::Autonomous]
        );
        assert!(monitor.is_away());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_autonomous_mode_is_left_alone() {
        let control = Arc::new(RecordingControl::default());
        *control.mode.lock().expect("mode") = Mode::Autonomous;
        let monitor = PresenceMonitor::spawn(IDLE, control.clone());

        tokio::time::sleep(IDLE * 2).await;
        monitor.touch();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(control.applied().is_empty());
        assert!(!monitor.is_away());
    }
}
