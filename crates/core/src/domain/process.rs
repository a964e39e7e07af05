// Target process snapshot

use serde::{Deserialize, Serialize};

/// Point-in-time answer to "is the target application running?"
///
/// Never persisted; recomputed on demand or by the process monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetProcessStatus {
    pub running: bool,
    pub checked_at_millis: i64, // epoch ms
}

impl TargetProcessStatus {
    pub fn new(running: bool, checked_at_millis: i64) -> Self {
        Self {
            running,
            checked_at_millis,
        }
    }

    /// Status before the first poll completes
    pub fn unknown() -> Self {
        Self::new(false, 0)
    }
}
