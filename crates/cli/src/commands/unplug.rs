//! `hs-unplug unplug` - run one disruption cycle in the foreground

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use unplug_core::application::controller::constants::MSG_RESTORED;
use unplug_core::application::{DisruptionController, TriggerOutcome};
use unplug_core::domain::{BlockDuration, CycleStatus, StatusSnapshot};

use crate::render::StatusPrinter;

/// Returns `true` when the cycle restored the network normally
pub async fn run(
    controller: Arc<DisruptionController>,
    duration: BlockDuration,
    json: bool,
) -> Result<bool> {
    // Subscribe first so Validating is not missed
    let rx = controller.subscribe();

    if controller.trigger(duration).await == TriggerOutcome::Ignored {
        bail!("A disruption cycle is already active");
    }

    let mut printer = (!json).then(StatusPrinter::new);
    let outcome = follow_cycle(rx, |snapshot| {
        if let Some(printer) = printer.as_mut() {
            if let Err(e) = printer.print(snapshot) {
                warn!(error = %e, "Failed to render status");
            }
        }
    })
    .await
    .context("Status stream closed before the cycle finished")?;

    let succeeded = cycle_succeeded(&outcome);
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if succeeded {
        println!(
            "{}",
            format!("✓ Network restored after {}", duration).green().bold()
        );
    } else {
        println!("{}", format!("✗ {}", outcome.last_message).red().bold());
    }
    Ok(succeeded)
}

/// A settled Idle keeps the last message, so it still tells a restore apart
/// from a failure when the terminal snapshot itself was skipped.
fn cycle_succeeded(outcome: &StatusSnapshot) -> bool {
    match outcome.status {
        CycleStatus::Restoring => true,
        CycleStatus::Idle => outcome.last_message == MSG_RESTORED,
        _ => false,
    }
}

/// Consume transitions until the cycle is back in Idle
///
/// Returns the terminal snapshot (`Restoring` or `Error`), or `None` when the
/// channel closed first. After a lag the terminal snapshot may have been
/// dropped, so the first Idle seen is returned instead.
pub async fn follow_cycle<F>(
    mut rx: broadcast::Receiver<StatusSnapshot>,
    mut on_snapshot: F,
) -> Option<StatusSnapshot>
where
    F: FnMut(&StatusSnapshot),
{
    let mut terminal: Option<StatusSnapshot> = None;
    let mut lagged = false;
    loop {
        match rx.recv().await {
            Ok(snapshot) => {
                on_snapshot(&snapshot);
                match snapshot.status {
                    CycleStatus::Restoring | CycleStatus::Error => terminal = Some(snapshot),
                    CycleStatus::Idle if terminal.is_some() => return terminal,
                    CycleStatus::Idle if lagged => return Some(snapshot),
                    _ => {}
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Status display lagged behind");
                lagged = true;
            }
            Err(RecvError::Closed) => return terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(status: CycleStatus, message: &str) -> StatusSnapshot {
        StatusSnapshot {
            session_id: Some("session-1".to_string()),
            status,
            requested_duration_secs: 20,
            elapsed_secs: 0,
            last_message: message.to_string(),
            at_millis: 0,
        }
    }

    #[tokio::test]
    async fn test_follow_cycle_stops_at_idle_after_terminal() {
        let (tx, rx) = broadcast::channel(16);
        for (status, msg) in [
            (CycleStatus::Validating, "checking"),
            (CycleStatus::Error, "target application not running"),
            (CycleStatus::Idle, "target application not running"),
            (CycleStatus::Validating, "next cycle"),
        ] {
            tx.send(snapshot(status, msg)).unwrap();
        }

        let mut seen = Vec::new();
        let terminal = follow_cycle(rx, |s| seen.push(s.status)).await.unwrap();

        assert_eq!(terminal.status, CycleStatus::Error);
        assert_eq!(terminal.last_message, "target application not running");
        assert_eq!(
            seen,
            vec![CycleStatus::Validating, CycleStatus::Error, CycleStatus::Idle]
        );
    }

    #[tokio::test]
    async fn test_follow_cycle_closed_without_terminal() {
        let (tx, rx) = broadcast::channel(4);
        tx.send(snapshot(CycleStatus::Validating, "checking")).unwrap();
        drop(tx);

        assert!(follow_cycle(rx, |_| {}).await.is_none());
    }

    #[tokio::test]
    async fn test_follow_cycle_returns_idle_when_terminal_was_skipped() {
        let (tx, rx) = broadcast::channel(4);
        tx.send(snapshot(CycleStatus::Validating, "checking")).unwrap();
        for _ in 0..8 {
            tx.send(snapshot(CycleStatus::Blocking, "network blocked"))
                .unwrap();
        }
        tx.send(snapshot(CycleStatus::Restoring, MSG_RESTORED)).unwrap();
        for _ in 0..4 {
            tx.send(snapshot(CycleStatus::Blocking, "network blocked"))
                .unwrap();
        }
        tx.send(snapshot(CycleStatus::Idle, MSG_RESTORED)).unwrap();

        let outcome = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            follow_cycle(rx, |_| {}),
        )
        .await
        .expect("follow_cycle hung after lag")
        .unwrap();

        assert_eq!(outcome.status, CycleStatus::Idle);
        assert!(cycle_succeeded(&outcome));
    }

    #[tokio::test]
    async fn test_follow_cycle_lagged_error_is_not_success() {
        let (tx, rx) = broadcast::channel(2);
        for _ in 0..6 {
            tx.send(snapshot(CycleStatus::Validating, "checking")).unwrap();
        }
        tx.send(snapshot(CycleStatus::Error, "target application not running"))
            .unwrap();
        tx.send(snapshot(CycleStatus::Blocking, "filler")).unwrap();
        tx.send(snapshot(CycleStatus::Idle, "target application not running"))
            .unwrap();

        let outcome = follow_cycle(rx, |_| {}).await.unwrap();

        assert_eq!(outcome.status, CycleStatus::Idle);
        assert!(!cycle_succeeded(&outcome));
    }

    #[test]
    fn test_cycle_succeeded() {
        assert!(cycle_succeeded(&snapshot(CycleStatus::Restoring, MSG_RESTORED)));
        assert!(!cycle_succeeded(&snapshot(CycleStatus::Error, "boom")));
        assert!(!cycle_succeeded(&snapshot(CycleStatus::Idle, "boom")));
    }
}
