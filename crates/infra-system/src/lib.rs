// Unplug Infrastructure - System Adapters
// Implements: ProcessDetector, NetworkBlocker, SecretStore

pub mod keyring_store;
pub mod markers;
pub mod pgrep_detector;
pub mod script_blocker;
pub mod sysinfo_detector;

pub use keyring_store::KeyringSecretStore;
pub use pgrep_detector::PgrepDetector;
pub use script_blocker::ScriptBlocker;
pub use sysinfo_detector::SysinfoDetector;
