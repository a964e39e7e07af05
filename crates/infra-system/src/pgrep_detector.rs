// pgrep-based process detector
// reason: point-in-time external query, mirrors `pgrep -f <hint>`
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use unplug_core::port::ProcessDetector;

const DEFAULT_PGREP: &str = "pgrep";

/// Detector that runs `pgrep -f <hint>`
///
/// Running means: zero exit status AND non-empty output. Anything else,
/// including a missing `pgrep`, is "not running".
pub struct PgrepDetector {
    program: PathBuf,
}

impl PgrepDetector {
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PGREP)
    }

    /// Use a different query program (tests, non-standard installs)
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PgrepDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessDetector for PgrepDetector {
    async fn is_running(&self, process_name_hint: &str) -> bool {
        // An empty pattern matches every process
        if process_name_hint.trim().is_empty() {
            return false;
        }

        let output = Command::new(&self.program)
            .arg("-f")
            .arg(process_name_hint)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let running = output.status.success() && !stdout.trim().is_empty();
                debug!(
                    hint = %process_name_hint,
                    exit_code = ?output.status.code(),
                    running,
                    "Process query completed"
                );
                running
            }
            Err(e) => {
                warn!(
                    program = %self.program.display(),
                    error = %e,
                    "Process query failed, treating target as not running"
                );
                false
            }
        }
    }
}
