// In-process process detector
// reason: sysinfo for cross-platform process table scanning, no external tool needed
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use sysinfo::System;
use tracing::{debug, warn};

use unplug_core::port::ProcessDetector;

/// Process detector backed by the sysinfo process table
///
/// Case-insensitive substring match on process names, so "hearthstone"
/// also finds "Hearthstone" and "HearthstoneBeta".
pub struct SysinfoDetector {
    system: Arc<Mutex<System>>,
}

impl SysinfoDetector {
    /// Create a new detector
    ///
    /// # Example
    /// ```ignore
    /// let detector = SysinfoDetector::new();
    /// let running = detector.is_running("Hearthstone").await;
    /// ```
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
        }
    }
}

impl Default for SysinfoDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// True if any name contains `hint` (case-insensitive)
fn any_name_matches<'a>(names: impl IntoIterator<Item = &'a str>, hint: &str) -> bool {
    let hint = hint.to_lowercase();
    names
        .into_iter()
        .any(|name| name.to_lowercase().contains(&hint))
}

#[async_trait]
impl ProcessDetector for SysinfoDetector {
    async fn is_running(&self, process_name_hint: &str) -> bool {
        if process_name_hint.trim().is_empty() {
            return false;
        }

        let mut sys = match self.system.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("Process table lock poisoned, treating target as not running");
                return false;
            }
        };

        // Refresh process list only (cheap compared to refresh_all)
        sys.refresh_processes();

        let running = any_name_matches(
            sys.processes().values().map(|p| p.name()),
            process_name_hint,
        );

        debug!(
            hint = %process_name_hint,
            process_count = sys.processes().len(),
            running,
            "Process table scanned"
        );

        running
    }
}
