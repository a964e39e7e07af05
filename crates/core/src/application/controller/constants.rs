// Controller constants (no magic values)
use std::time::Duration;

/// Resolution of the display-only progress timer (1s)
pub const PROGRESS_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Capacity of the transition broadcast channel
/// Slow subscribers see `Lagged` instead of blocking the controller
pub const STATUS_CHANNEL_CAPACITY: usize = 64;

/// Default polling interval of the process monitor (2s)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Process name hint used when none is configured
pub const DEFAULT_TARGET_PROCESS: &str = "Hearthstone";

pub const MSG_VALIDATING: &str = "checking preconditions";
pub const MSG_TARGET_NOT_RUNNING: &str = "target application not running";
pub const MSG_CREDENTIAL_MISSING: &str = "administrator credential not configured";
pub const MSG_ENGAGED: &str = "network blocked";
pub const MSG_RESTORED: &str = "network restored";
pub const MSG_STREAM_CLOSED: &str = "network blocker output closed unexpectedly";
pub const MSG_BLOCKER_ERROR_FALLBACK: &str = "network blocker reported an error";
pub const MSG_CYCLE_ABORTED: &str = "disruption cycle aborted unexpectedly";
