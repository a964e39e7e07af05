// Target process detection port
// reason: async-trait, detection shells out or scans the process table
use async_trait::async_trait;

/// Answers "is the target application currently running?"
///
/// Implementations must never fail: any lookup error (missing tool, permission
/// problem, unreadable output) is reported as `false`.
#[async_trait]
pub trait ProcessDetector: Send + Sync {
    /// Point-in-time check for a process whose name/command line contains
    /// `process_name_hint`
    ///
    /// # Example
    /// ```text
    /// if !detector.is_running("Hearthstone").await {
    ///     println!("start the game first");
    /// }
    /// ```
    async fn is_running(&self, process_name_hint: &str) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Mock detector with a switchable answer
    pub struct MockProcessDetector {
        running: Arc<AtomicBool>,
        call_count: Arc<AtomicUsize>,
        last_hint: Arc<Mutex<Option<String>>>,
    }

    impl MockProcessDetector {
        pub fn new(running: bool) -> Self {
            Self {
                running: Arc::new(AtomicBool::new(running)),
                call_count: Arc::new(AtomicUsize::new(0)),
                last_hint: Arc::new(Mutex::new(None)),
            }
        }

        pub fn set_running(&self, running: bool) {
            self.running.store(running, Ordering::SeqCst);
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn last_hint(&self) -> Option<String> {
            self.last_hint.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProcessDetector for MockProcessDetector {
        async fn is_running(&self, process_name_hint: &str) -> bool {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            *self.last_hint.lock().unwrap() = Some(process_name_hint.to_string());
            self.running.load(Ordering::SeqCst)
        }
    }
}
