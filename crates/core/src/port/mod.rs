// Port Layer - Interfaces for external collaborators

pub mod id_provider; // For deterministic testing
pub mod network_blocker;
pub mod process_detector;
pub mod secret_store;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use network_blocker::{BlockerError, BlockerEvent, BlockerEvents, NetworkBlocker};
pub use process_detector::ProcessDetector;
pub use secret_store::{SecretStore, SecretStoreError};
pub use time_provider::TimeProvider;
