//! `hs-unplug interactive` - trigger a cycle on every Enter

use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use unplug_core::application::{
    shutdown_channel, DisruptionController, ShutdownToken, TriggerOutcome,
};
use unplug_core::domain::BlockDuration;

use crate::render::StatusPrinter;

enum Input {
    Trigger,
    Quit,
}

fn parse_input(line: &str) -> Input {
    match line.trim().to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => Input::Quit,
        _ => Input::Trigger,
    }
}

pub async fn run(controller: Arc<DisruptionController>, duration: BlockDuration) -> Result<()> {
    let (shutdown_tx, shutdown) = shutdown_channel();
    let renderer = tokio::spawn(render_transitions(Arc::clone(&controller), shutdown));

    println!(
        "{}",
        format!(
            "Press Enter to block {} for {}, q to quit",
            controller.target_process(),
            duration
        )
        .cyan()
        .bold()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        match parse_input(&line) {
            Input::Quit => break,
            Input::Trigger => match controller.trigger(duration).await {
                TriggerOutcome::Ignored => {
                    println!("{}", "Cycle already active, ignored".yellow());
                }
                TriggerOutcome::Started { session_id } => {
                    info!(session_id = %session_id, "Cycle started from keyboard");
                }
                TriggerOutcome::Rejected { .. } => {}
            },
        }
    }

    if !controller.is_idle() {
        println!("{}", "Waiting for the active cycle to restore the network...".yellow());
        let mut latest = controller.watch();
        let _ = latest.wait_for(|s| s.status.is_idle()).await;
    }

    shutdown_tx.shutdown();
    let _ = renderer.await;
    Ok(())
}

async fn render_transitions(controller: Arc<DisruptionController>, mut shutdown: ShutdownToken) {
    let mut rx = controller.subscribe();
    let mut printer = StatusPrinter::new();
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(snapshot) => {
                    if let Err(e) = printer.print(&snapshot) {
                        warn!(error = %e, "Failed to render status");
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Status display lagged behind"),
                Err(RecvError::Closed) => break,
            },
            _ = shutdown.wait() => break,
        }
    }
}
