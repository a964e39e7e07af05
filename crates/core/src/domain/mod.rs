// Domain Layer - Disruption session state machine and value types

pub mod error;
pub mod process;
pub mod session;

// Re-exports
pub use error::DomainError;
pub use process::TargetProcessStatus;
pub use session::{
    BlockDuration, CycleStatus, DisruptionSession, SessionId, StatusSnapshot,
    DEFAULT_BLOCK_DURATION_SECS, MAX_BLOCK_DURATION_SECS,
};
