// Disruption Cycle Controller - bounded network disruption orchestration

pub mod constants;

use constants::*;

use crate::domain::{BlockDuration, DisruptionSession, DomainError, SessionId, StatusSnapshot};
use crate::port::{
    BlockerEvent, BlockerEvents, IdProvider, NetworkBlocker, ProcessDetector, SecretStore,
    TimeProvider,
};
use futures::StreamExt;
use secrecy::SecretString;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Result of a trigger request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Preconditions held and the blocker is running
    Started { session_id: SessionId },
    /// A cycle is already active; nothing happened
    Ignored,
    /// The cycle ended before blocking (precondition or spawn failure)
    Rejected { reason: String },
}

/// What woke the cycle loop
enum CycleStep {
    Event(Option<BlockerEvent>),
    Tick,
}

/// Disruption Cycle Controller
///
/// Owns the single `DisruptionSession`. All mutations happen under one mutex
/// and each one publishes an immutable `StatusSnapshot`:
/// - `subscribe()` yields every transition in order
/// - `watch()` / `snapshot()` yield the latest state only
pub struct DisruptionController {
    target_process: String,
    detector: Arc<dyn ProcessDetector>,
    blocker: Arc<dyn NetworkBlocker>,
    secret_store: Arc<dyn SecretStore>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    session: Mutex<DisruptionSession>,
    transitions: broadcast::Sender<StatusSnapshot>,
    latest: watch::Sender<StatusSnapshot>,
}

impl DisruptionController {
    /// Create a controller in `Idle`
    ///
    /// # Example
    /// ```ignore
    /// let controller = Arc::new(DisruptionController::new(
    ///     "Hearthstone",
    ///     Arc::new(PgrepDetector::new()),
    ///     Arc::new(ScriptBlocker::new(...)),
    ///     Arc::new(KeyringSecretStore::default()),
    ///     Arc::new(UuidProvider),
    ///     Arc::new(SystemTimeProvider),
    /// ));
    /// controller.trigger(BlockDuration::default()).await;
    /// ```
    pub fn new(
        target_process: impl Into<String>,
        detector: Arc<dyn ProcessDetector>,
        blocker: Arc<dyn NetworkBlocker>,
        secret_store: Arc<dyn SecretStore>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        let session = DisruptionSession::idle(BlockDuration::default());
        let initial = session.snapshot(time_provider.now_millis());
        let (transitions, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        let (latest, _) = watch::channel(initial);

        Self {
            target_process: target_process.into(),
            detector,
            blocker,
            secret_store,
            id_provider,
            time_provider,
            session: Mutex::new(session),
            transitions,
            latest,
        }
    }

    pub fn target_process(&self) -> &str {
        &self.target_process
    }

    /// Every transition from now on, in order
    pub fn subscribe(&self) -> broadcast::Receiver<StatusSnapshot> {
        self.transitions.subscribe()
    }

    /// Latest-value view (for progress displays)
    pub fn watch(&self) -> watch::Receiver<StatusSnapshot> {
        self.latest.subscribe()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.latest.borrow().clone()
    }

    pub fn is_idle(&self) -> bool {
        self.lock_session().status().is_idle()
    }

    /// Request one disruption cycle
    ///
    /// Preconditions, in order:
    /// 1. no active cycle (otherwise `Ignored`, silently)
    /// 2. target process running
    /// 3. administrator credential present
    ///
    /// On success the blocker runs in a background task and this returns
    /// immediately with `Started`.
    pub async fn trigger(self: &Arc<Self>, duration: BlockDuration) -> TriggerOutcome {
        let session_id = {
            let mut session = self.lock_session();
            if !session.status().is_idle() {
                debug!(status = %session.status(), "Trigger ignored: cycle already active");
                return TriggerOutcome::Ignored;
            }
            let id = self.id_provider.generate_id();
            if let Err(e) = session.begin(id.clone(), duration, MSG_VALIDATING) {
                error!(error = %e, "Failed to begin disruption cycle");
                return TriggerOutcome::Ignored;
            }
            self.publish(&session);
            id
        };

        // From here on a dropped trigger future must not strand the session
        let guard = ValidationGuard::arm(self);

        info!(
            session_id = %session_id,
            duration_secs = duration.as_secs(),
            process = %self.target_process,
            "Disruption cycle requested"
        );

        let credential = match self.check_preconditions().await {
            Ok(credential) => credential,
            Err(reason) => return guard.reject(reason),
        };

        let events = match self.blocker.block(duration, &credential).await {
            Ok(events) => events,
            Err(e) => return guard.reject(format!("failed to start network blocker: {}", e)),
        };
        drop(credential);

        guard.disarm();
        self.spawn_cycle(session_id.clone(), events);
        TriggerOutcome::Started { session_id }
    }

    /// Detector first, credential second. The credential is only read when
    /// the target is running.
    async fn check_preconditions(&self) -> std::result::Result<SecretString, String> {
        if !self.detector.is_running(&self.target_process).await {
            return Err(MSG_TARGET_NOT_RUNNING.to_string());
        }

        match self.secret_store.load().await {
            Ok(Some(credential)) => Ok(credential),
            Ok(None) => Err(MSG_CREDENTIAL_MISSING.to_string()),
            Err(e) => Err(format!("administrator credential unavailable: {}", e)),
        }
    }

    /// Drive the cycle in its own task. A panic or cancellation of that task
    /// still settles the session back to Idle.
    fn spawn_cycle(self: &Arc<Self>, session_id: SessionId, events: BlockerEvents) {
        let controller = Arc::clone(self);
        let handle = tokio::spawn(async move { controller.drive_cycle(events).await });

        let supervisor = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(join_err) = handle.await {
                if join_err.is_panic() {
                    error!(session_id = %session_id, "Disruption cycle panicked: {:?}", join_err);
                } else {
                    error!(session_id = %session_id, "Disruption cycle cancelled");
                }
                supervisor.finish_with_error(MSG_CYCLE_ABORTED);
            }
        });
    }

    /// Event loop for one cycle
    ///
    /// Blocker events and timer ticks are consumed from a single select loop,
    /// so they are applied strictly in observation order. Markers win ties
    /// against the timer.
    async fn drive_cycle(self: Arc<Self>, mut events: BlockerEvents) {
        let mut ticker: Option<Interval> = None;

        loop {
            let step = tokio::select! {
                biased;
                event = events.next() => CycleStep::Event(event),
                _ = next_tick(&mut ticker) => CycleStep::Tick,
            };

            match step {
                CycleStep::Tick => self.on_tick(),
                CycleStep::Event(Some(BlockerEvent::Engaged)) => {
                    if self.apply(|s| s.engage(MSG_ENGAGED)) {
                        info!(process = %self.target_process, "Network block engaged");
                        ticker = Some(progress_ticker());
                    }
                }
                CycleStep::Event(Some(BlockerEvent::Restored))
                | CycleStep::Event(Some(BlockerEvent::Exited(Some(0)))) => {
                    self.finish_with_success();
                    break;
                }
                CycleStep::Event(Some(BlockerEvent::Error(reason))) => {
                    let reason = if reason.trim().is_empty() {
                        MSG_BLOCKER_ERROR_FALLBACK.to_string()
                    } else {
                        reason
                    };
                    self.finish_with_error(&reason);
                    break;
                }
                CycleStep::Event(Some(BlockerEvent::Exited(Some(code)))) => {
                    self.finish_with_error(&format!(
                        "network blocker exited with status {}",
                        code
                    ));
                    break;
                }
                CycleStep::Event(Some(BlockerEvent::Exited(None))) => {
                    self.finish_with_error("network blocker terminated by a signal");
                    break;
                }
                CycleStep::Event(None) => {
                    self.finish_with_error(MSG_STREAM_CLOSED);
                    break;
                }
            }
        }
    }

    fn on_tick(&self) {
        let mut session = self.lock_session();
        match session.tick() {
            Ok(true) => self.publish(&session),
            Ok(false) => {}
            Err(e) => debug!(error = %e, "Progress tick outside blocking"),
        }
    }

    /// Apply one transition and publish it. Out-of-order events are logged
    /// and dropped.
    fn apply<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut DisruptionSession) -> std::result::Result<(), DomainError>,
    {
        let mut session = self.lock_session();
        match f(&mut session) {
            Ok(()) => {
                self.publish(&session);
                true
            }
            Err(e) => {
                warn!(error = %e, "Ignoring out-of-order cycle event");
                false
            }
        }
    }

    /// -> Restoring -> Idle, under one lock
    fn finish_with_success(&self) {
        let mut session = self.lock_session();
        match session.restore(MSG_RESTORED) {
            Ok(()) => {
                info!(
                    session_id = ?session.id(),
                    duration_secs = session.duration().as_secs(),
                    "Network restored, cycle complete"
                );
                self.publish(&session);
            }
            Err(e) => warn!(error = %e, "Unexpected restore"),
        }
        self.settle(&mut session);
    }

    /// -> Error -> Idle, under one lock
    fn finish_with_error(&self, reason: &str) {
        let mut session = self.lock_session();
        match session.fail(reason) {
            Ok(()) => {
                warn!(
                    session_id = ?session.id(),
                    elapsed_secs = session.elapsed_secs(),
                    reason = %reason,
                    "Disruption cycle failed"
                );
                self.publish(&session);
            }
            Err(e) => debug!(error = %e, "Cycle already past error handling"),
        }
        self.settle(&mut session);
    }

    fn settle(&self, session: &mut DisruptionSession) {
        if session.settle().is_ok() {
            self.publish(session);
        }
    }

    fn publish(&self, session: &DisruptionSession) {
        let snapshot = session.snapshot(self.time_provider.now_millis());
        let previous = self.latest.send_replace(snapshot.clone());
        if previous.status != snapshot.status {
            info!(
                session_id = ?snapshot.session_id,
                status = %snapshot.status,
                elapsed_secs = snapshot.elapsed_secs,
                "Cycle status changed"
            );
        } else {
            debug!(
                session_id = ?snapshot.session_id,
                status = %snapshot.status,
                elapsed_secs = snapshot.elapsed_secs,
                "Progress published"
            );
        }
        // No subscribers is fine
        let _ = self.transitions.send(snapshot);
    }

    fn lock_session(&self) -> MutexGuard<'_, DisruptionSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Settles a session left in `Validating` when `trigger` is cancelled
///
/// Armed right after `begin`; every exit path of `trigger` either disarms it
/// or rejects through it.
struct ValidationGuard<'a> {
    controller: &'a DisruptionController,
    armed: bool,
}

impl<'a> ValidationGuard<'a> {
    fn arm(controller: &'a DisruptionController) -> Self {
        Self {
            controller,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }

    fn reject(mut self, reason: String) -> TriggerOutcome {
        self.armed = false;
        self.controller.finish_with_error(&reason);
        TriggerOutcome::Rejected { reason }
    }
}

impl Drop for ValidationGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Trigger cancelled during validation");
            self.controller.finish_with_error(MSG_CYCLE_ABORTED);
        }
    }
}

fn progress_ticker() -> Interval {
    let mut ticker = interval_at(
        Instant::now() + PROGRESS_TICK_INTERVAL,
        PROGRESS_TICK_INTERVAL,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Pending forever until the ticker exists (before `Engaged`)
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
