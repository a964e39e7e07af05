//! Process Monitor - periodic target process polling
//!
//! Publishes a `TargetProcessStatus` on a watch channel so displays can show
//! whether the game is up without calling the detector themselves.

use crate::application::shutdown::ShutdownToken;
use crate::domain::TargetProcessStatus;
use crate::port::{ProcessDetector, TimeProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info};

pub struct ProcessMonitor {
    target_process: String,
    detector: Arc<dyn ProcessDetector>,
    time_provider: Arc<dyn TimeProvider>,
    interval: Duration,
    status: watch::Sender<TargetProcessStatus>,
}

impl ProcessMonitor {
    pub fn new(
        target_process: impl Into<String>,
        detector: Arc<dyn ProcessDetector>,
        time_provider: Arc<dyn TimeProvider>,
        interval: Duration,
    ) -> Self {
        let (status, _) = watch::channel(TargetProcessStatus::unknown());
        Self {
            target_process: target_process.into(),
            detector,
            time_provider,
            interval,
            status,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TargetProcessStatus> {
        self.status.subscribe()
    }

    pub fn current(&self) -> TargetProcessStatus {
        *self.status.borrow()
    }

    /// Poll once and publish. Logs only when the running flag flips.
    pub async fn poll_once(&self) -> TargetProcessStatus {
        let running = self.detector.is_running(&self.target_process).await;
        let status = TargetProcessStatus::new(running, self.time_provider.now_millis());

        let previous = self.status.send_replace(status);
        if previous.running != running || previous.checked_at_millis == 0 {
            info!(process = %self.target_process, running, "Target process status changed");
        } else {
            debug!(process = %self.target_process, running, "Target process polled");
        }
        status
    }

    /// Poll on the configured interval until shutdown
    pub async fn run(&self, mut shutdown: ShutdownToken) {
        info!(
            process = %self.target_process,
            interval_ms = self.interval.as_millis() as u64,
            "Process monitor started"
        );
        loop {
            if shutdown.is_shutdown() {
                break;
            }
            self.poll_once().await;

            tokio::select! {
                _ = sleep(self.interval) => {},
                _ = shutdown.wait() => break,
            }
        }
        info!(process = %self.target_process, "Process monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::shutdown::shutdown_channel;
    use crate::port::process_detector::mocks::MockProcessDetector;
    use crate::port::time_provider::mocks::FixedTimeProvider;

    fn monitor(detector: Arc<MockProcessDetector>) -> ProcessMonitor {
        monitor_with_clock(detector, Arc::new(FixedTimeProvider::new(1_000)))
    }

    fn monitor_with_clock(
        detector: Arc<MockProcessDetector>,
        clock: Arc<FixedTimeProvider>,
    ) -> ProcessMonitor {
        ProcessMonitor::new("Hearthstone", detector, clock, Duration::from_secs(2))
    }

    #[tokio::test]
    async fn test_poll_once_publishes() {
        let detector = Arc::new(MockProcessDetector::new(true));
        let monitor = monitor(detector.clone());
        let rx = monitor.subscribe();

        assert!(!monitor.current().running);
        let status = monitor.poll_once().await;

        assert!(status.running);
        assert_eq!(status.checked_at_millis, 1_000);
        assert!(rx.borrow().running);
        assert_eq!(detector.last_hint().as_deref(), Some("Hearthstone"));
    }

    #[tokio::test]
    async fn test_poll_once_stamps_current_clock() {
        let detector = Arc::new(MockProcessDetector::new(true));
        let clock = Arc::new(FixedTimeProvider::new(1_000));
        let monitor = monitor_with_clock(detector.clone(), clock.clone());

        assert_eq!(monitor.poll_once().await.checked_at_millis, 1_000);

        clock.advance(2_000);
        detector.set_running(false);
        let status = monitor.poll_once().await;

        assert!(!status.running);
        assert_eq!(status.checked_at_millis, 3_000);
        assert_eq!(monitor.current().checked_at_millis, 3_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_tracks_changes_until_shutdown() {
        let detector = Arc::new(MockProcessDetector::new(false));
        let monitor = Arc::new(monitor(detector.clone()));
        let mut rx = monitor.subscribe();
        let (tx, token) = shutdown_channel();

        let handle = {
            let monitor = Arc::clone(&monitor);
            tokio::spawn(async move { monitor.run(token).await })
        };

        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().running);

        detector.set_running(true);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(rx.borrow_and_update().running);
        assert!(detector.call_count() >= 2);

        tx.shutdown();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor stops")
            .unwrap();
    }
}
