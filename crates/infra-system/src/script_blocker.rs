// Helper-script network blocker
// reason: tokio::process for async spawn + line-by-line stdout scraping
use async_trait::async_trait;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use unplug_core::domain::BlockDuration;
use unplug_core::port::{BlockerError, BlockerEvent, BlockerEvents, NetworkBlocker};

use crate::markers::parse_marker;

/// Environment variable carrying the administrator credential to the helper
pub const CREDENTIAL_ENV: &str = "HSU_ADMIN_PASSWORD";

/// Environment variable carrying the comma-separated ports to block
pub const PORTS_ENV: &str = "HSU_BLOCK_PORTS";

/// Event buffer between the reader task and the consumer
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Network blocker that runs the privileged helper script
///
/// `<interpreter> <script> <duration_secs>` is spawned with a cleared
/// environment: only allowlisted variables are inherited, plus the credential
/// and port list. The credential never appears in argv.
pub struct ScriptBlocker {
    interpreter: PathBuf,
    script: PathBuf,
    block_ports: Vec<u16>,
    env_allowlist: Vec<String>,
}

impl ScriptBlocker {
    /// Create a new script blocker
    ///
    /// # Arguments
    /// * `interpreter` - Shell used to run the script (e.g. `/bin/bash`)
    /// * `script` - Path to the helper script
    /// * `block_ports` - Remote ports the helper should block
    /// * `env_allowlist` - Inherited environment variables (e.g. PATH, HOME, USER)
    ///
    /// # Example
    /// ```ignore
    /// let blocker = ScriptBlocker::new(
    ///     "/bin/bash",
    ///     "/usr/local/share/hs-unplug/pf-block.sh",
    ///     vec![1119, 3724],
    ///     vec!["PATH".to_string(), "HOME".to_string(), "USER".to_string()],
    /// );
    /// ```
    pub fn new(
        interpreter: impl Into<PathBuf>,
        script: impl Into<PathBuf>,
        block_ports: Vec<u16>,
        env_allowlist: Vec<String>,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
            block_ports,
            env_allowlist,
        }
    }

    /// Keep allowlisted variables only
    fn filter_env<I>(&self, env: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        env.into_iter()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .collect()
    }

    fn ports_value(&self) -> String {
        self.block_ports
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn build_command(&self, duration: BlockDuration, credential: &SecretString) -> Command {
        let mut command = Command::new(&self.interpreter);
        command
            .arg(&self.script)
            .arg(duration.as_secs().to_string())
            .env_clear()
            .envs(self.filter_env(std::env::vars()))
            .env(PORTS_ENV, self.ports_value())
            .env(CREDENTIAL_ENV, credential.expose_secret())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Killing the helper would skip the restore step
            .kill_on_drop(false);
        command
    }
}

/// Next output line with invalid UTF-8 replaced, `None` at EOF
///
/// Tool output on macOS may carry localized non-UTF-8 bytes; those lines must
/// not end marker parsing.
async fn next_lossy_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Forward stderr into the log, line by line
async fn drain_stderr<R>(stderr: R)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    while let Ok(Some(line)) = next_lossy_line(&mut reader, &mut buf).await {
        if !line.trim().is_empty() {
            debug!(line = %line, "Network blocker stderr");
        }
    }
}

#[async_trait]
impl NetworkBlocker for ScriptBlocker {
    async fn block(
        &self,
        duration: BlockDuration,
        credential: &SecretString,
    ) -> Result<BlockerEvents, BlockerError> {
        info!(
            interpreter = %self.interpreter.display(),
            script = %self.script.display(),
            duration_secs = duration.as_secs(),
            ports = %self.ports_value(),
            "Starting network blocker"
        );

        let mut child = self
            .build_command(duration, credential)
            .spawn()
            .map_err(|e| BlockerError::SpawnFailed(format!("{}: {}", self.script.display(), e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BlockerError::Io("helper stdout not captured".to_string()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_stderr(stderr));
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        // Reader task owns the child: it always reads to EOF and reaps the
        // process, even after the consumer dropped the stream.
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                match next_lossy_line(&mut reader, &mut buf).await {
                    Ok(Some(line)) => match parse_marker(&line) {
                        Some(event) => {
                            debug!(event = ?event, "Network blocker marker");
                            let _ = tx.send(event).await;
                        }
                        None => debug!(line = %line, "Network blocker output"),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Failed to read network blocker output");
                        break;
                    }
                }
            }

            let exit_code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!(error = %e, "Failed to wait for network blocker");
                    None
                }
            };
            info!(exit_code = ?exit_code, "Network blocker exited");
            let _ = tx.send(BlockerEvent::Exited(exit_code)).await;
        });

        let events = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });
        Ok(events.boxed())
    }
}
