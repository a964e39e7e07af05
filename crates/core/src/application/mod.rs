// Application Layer - Use Cases

pub mod controller;
pub mod monitor;
pub mod shutdown;

// Re-exports
pub use controller::{DisruptionController, TriggerOutcome};
pub use monitor::ProcessMonitor;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
