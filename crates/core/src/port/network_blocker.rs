// Privileged Network Blocker Port
// Abstraction over the elevated helper that installs, holds and removes the
// outbound block rule

use crate::domain::BlockDuration;
use async_trait::async_trait;
use futures::stream::BoxStream;
use secrecy::SecretString;
use thiserror::Error;

/// Typed phase events decoded from the helper's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockerEvent {
    /// Rule installed, traffic is blocked
    Engaged,
    /// Rule removed, traffic flows again
    Restored,
    /// Helper reported a failure (auth denied, pfctl failure, ...)
    Error(String),
    /// Helper terminated. `None` when killed by a signal.
    Exited(Option<i32>),
}

/// Event stream of one helper run. Ends after `Exited`.
pub type BlockerEvents = BoxStream<'static, BlockerEvent>;

/// Blocker invocation errors (before any event is produced)
#[derive(Error, Debug)]
pub enum BlockerError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Network Blocker trait
///
/// Contract for implementations:
/// - authenticate with `credential`, never pass it on a command line
/// - install the block, emit `Engaged`, hold for exactly `duration`
/// - remove the block unconditionally, emit `Restored`, then `Exited(Some(0))`
/// - on any failure emit `Error(reason)` before a non-zero `Exited`
///
/// The returned stream may be dropped early by the caller; the helper process
/// must still run to completion so the block is always lifted.
#[async_trait]
pub trait NetworkBlocker: Send + Sync {
    /// Start one block/hold/restore run
    ///
    /// # Errors
    /// - BlockerError::SpawnFailed if the helper cannot be started
    /// - BlockerError::Io if its output cannot be attached
    async fn block(
        &self,
        duration: BlockDuration,
        credential: &SecretString,
    ) -> Result<BlockerEvents, BlockerError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use futures::StreamExt;
    use secrecy::ExposeSecret;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// One scripted step: wait `delay`, then emit `event`
    #[derive(Debug, Clone)]
    pub struct ScriptStep {
        pub delay: Duration,
        pub event: BlockerEvent,
    }

    impl ScriptStep {
        pub fn after_secs(secs: u64, event: BlockerEvent) -> Self {
            Self {
                delay: Duration::from_secs(secs),
                event,
            }
        }
    }

    #[derive(Debug, Clone)]
    enum MockBehavior {
        Script(Vec<ScriptStep>),
        SpawnFailure(String),
    }

    /// Mock blocker replaying a fixed event script on tokio time
    pub struct ScriptedBlocker {
        behavior: MockBehavior,
        call_count: Arc<Mutex<usize>>,
        last_duration: Arc<Mutex<Option<BlockDuration>>>,
        last_credential_len: Arc<Mutex<Option<usize>>>,
    }

    impl ScriptedBlocker {
        fn with_behavior(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                call_count: Arc::new(Mutex::new(0)),
                last_duration: Arc::new(Mutex::new(None)),
                last_credential_len: Arc::new(Mutex::new(None)),
            }
        }

        pub fn new(steps: Vec<ScriptStep>) -> Self {
            Self::with_behavior(MockBehavior::Script(steps))
        }

        /// Engaged at t=0, Restored at t=duration, exit 0
        pub fn new_success(duration_secs: u64) -> Self {
            Self::new(vec![
                ScriptStep::after_secs(0, BlockerEvent::Engaged),
                ScriptStep::after_secs(duration_secs, BlockerEvent::Restored),
                ScriptStep::after_secs(0, BlockerEvent::Exited(Some(0))),
            ])
        }

        pub fn new_spawn_failure(message: impl Into<String>) -> Self {
            Self::with_behavior(MockBehavior::SpawnFailure(message.into()))
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }

        pub fn last_duration(&self) -> Option<BlockDuration> {
            *self.last_duration.lock().unwrap()
        }

        pub fn last_credential_len(&self) -> Option<usize> {
            *self.last_credential_len.lock().unwrap()
        }
    }

    #[async_trait]
    impl NetworkBlocker for ScriptedBlocker {
        async fn block(
            &self,
            duration: BlockDuration,
            credential: &SecretString,
        ) -> Result<BlockerEvents, BlockerError> {
            *self.call_count.lock().unwrap() += 1;
            *self.last_duration.lock().unwrap() = Some(duration);
            *self.last_credential_len.lock().unwrap() = Some(credential.expose_secret().len());

            let steps: VecDeque<ScriptStep> = match &self.behavior {
                MockBehavior::Script(steps) => steps.iter().cloned().collect(),
                MockBehavior::SpawnFailure(msg) => {
                    return Err(BlockerError::SpawnFailed(msg.clone()))
                }
            };

            let stream = futures::stream::unfold(steps, |mut steps| async move {
                let step = steps.pop_front()?;
                if !step.delay.is_zero() {
                    tokio::time::sleep(step.delay).await;
                }
                Some((step.event, steps))
            });

            Ok(stream.boxed())
        }
    }
}
