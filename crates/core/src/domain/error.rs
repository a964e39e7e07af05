// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid cycle state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid block duration: {0}")]
    InvalidDuration(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
