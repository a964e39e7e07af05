// Disruption Session Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session ID (UUID v4)
pub type SessionId = String;

/// Default block duration when the user does not pick one (seconds)
pub const DEFAULT_BLOCK_DURATION_SECS: u32 = 20;

/// Upper bound for a single block (1 hour)
pub const MAX_BLOCK_DURATION_SECS: u32 = 3600;

/// Cycle status
///
/// Success path: Idle -> Validating -> Blocking -> Restoring -> Idle.
/// `Error` is a pseudo-state that always settles back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleStatus {
    Idle,
    Validating,
    Blocking,
    Restoring,
    Error,
}

impl CycleStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, CycleStatus::Idle)
    }

    /// Whether `self -> to` is a legal edge of the state machine
    pub fn can_transition_to(&self, to: CycleStatus) -> bool {
        use CycleStatus::*;
        matches!(
            (self, to),
            (Idle, Validating)
                | (Validating, Blocking)
                | (Validating, Restoring)
                | (Validating, Error)
                | (Blocking, Restoring)
                | (Blocking, Error)
                | (Restoring, Idle)
                | (Error, Idle)
        )
    }
}

impl std::fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleStatus::Idle => write!(f, "IDLE"),
            CycleStatus::Validating => write!(f, "VALIDATING"),
            CycleStatus::Blocking => write!(f, "BLOCKING"),
            CycleStatus::Restoring => write!(f, "RESTORING"),
            CycleStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Requested block duration in whole seconds (1..=MAX_BLOCK_DURATION_SECS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct BlockDuration(u32);

impl BlockDuration {
    pub fn new(secs: u32) -> Result<Self> {
        if secs == 0 {
            return Err(DomainError::InvalidDuration(
                "duration must be at least 1 second".to_string(),
            ));
        }
        if secs > MAX_BLOCK_DURATION_SECS {
            return Err(DomainError::InvalidDuration(format!(
                "duration {}s exceeds maximum of {}s",
                secs, MAX_BLOCK_DURATION_SECS
            )));
        }
        Ok(Self(secs))
    }

    pub fn as_secs(&self) -> u32 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl Default for BlockDuration {
    fn default() -> Self {
        Self(DEFAULT_BLOCK_DURATION_SECS)
    }
}

impl TryFrom<u32> for BlockDuration {
    type Error = DomainError;

    fn try_from(secs: u32) -> Result<Self> {
        Self::new(secs)
    }
}

impl From<BlockDuration> for u32 {
    fn from(d: BlockDuration) -> Self {
        d.0
    }
}

impl std::fmt::Display for BlockDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Immutable view of the session, published on every transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub session_id: Option<SessionId>,
    pub status: CycleStatus,
    pub requested_duration_secs: u32,
    pub elapsed_secs: u32,
    pub last_message: String,
    pub at_millis: i64, // epoch ms
}

impl StatusSnapshot {
    /// elapsed / requested, clamped to 0.0..=1.0
    pub fn progress(&self) -> f64 {
        if self.requested_duration_secs == 0 {
            return 0.0;
        }
        (f64::from(self.elapsed_secs) / f64::from(self.requested_duration_secs)).clamp(0.0, 1.0)
    }

    pub fn remaining_secs(&self) -> u32 {
        self.requested_duration_secs
            .saturating_sub(self.elapsed_secs)
    }
}

/// One run of the disruption cycle
///
/// Mutated only by the controller. Every mutator enforces the state machine
/// and reports whether anything observable changed.
#[derive(Debug, Clone)]
pub struct DisruptionSession {
    id: Option<SessionId>,
    status: CycleStatus,
    duration: BlockDuration,
    elapsed_secs: u32,
    last_message: String,
}

impl DisruptionSession {
    /// Fresh idle session
    pub fn idle(duration: BlockDuration) -> Self {
        Self {
            id: None,
            status: CycleStatus::Idle,
            duration,
            elapsed_secs: 0,
            last_message: "ready".to_string(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn status(&self) -> CycleStatus {
        self.status
    }

    pub fn duration(&self) -> BlockDuration {
        self.duration
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn last_message(&self) -> &str {
        &self.last_message
    }

    fn transition(&mut self, to: CycleStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }

    /// Idle -> Validating
    pub fn begin(
        &mut self,
        id: SessionId,
        duration: BlockDuration,
        message: impl Into<String>,
    ) -> Result<()> {
        self.transition(CycleStatus::Validating)?;
        self.id = Some(id);
        self.duration = duration;
        self.elapsed_secs = 0;
        self.last_message = message.into();
        Ok(())
    }

    /// Validating -> Blocking
    pub fn engage(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition(CycleStatus::Blocking)?;
        self.last_message = message.into();
        Ok(())
    }

    /// Advance the display timer by one second while blocking.
    ///
    /// Returns false once the elapsed counter already reached the requested
    /// duration (the counter never overshoots).
    pub fn tick(&mut self) -> Result<bool> {
        if self.status != CycleStatus::Blocking {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: "TICK".to_string(),
            });
        }
        if self.elapsed_secs >= self.duration.as_secs() {
            return Ok(false);
        }
        self.elapsed_secs += 1;
        self.last_message = format!(
            "network blocked ({}s / {}s)",
            self.elapsed_secs,
            self.duration.as_secs()
        );
        Ok(true)
    }

    /// Validating | Blocking -> Restoring (elapsed pinned to the full duration)
    pub fn restore(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition(CycleStatus::Restoring)?;
        self.elapsed_secs = self.duration.as_secs();
        self.last_message = message.into();
        Ok(())
    }

    /// Validating | Blocking -> Error (elapsed frozen)
    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition(CycleStatus::Error)?;
        self.last_message = message.into();
        Ok(())
    }

    /// Restoring | Error -> Idle. Keeps `last_message` visible.
    pub fn settle(&mut self) -> Result<()> {
        self.transition(CycleStatus::Idle)?;
        self.id = None;
        self.elapsed_secs = 0;
        Ok(())
    }

    pub fn snapshot(&self, at_millis: i64) -> StatusSnapshot {
        StatusSnapshot {
            session_id: self.id.clone(),
            status: self.status,
            requested_duration_secs: self.duration.as_secs(),
            elapsed_secs: self.elapsed_secs,
            last_message: self.last_message.clone(),
            at_millis,
        }
    }
}
