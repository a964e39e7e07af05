//! `hs-unplug watch` - print target process status changes

use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;

use unplug_core::application::{shutdown_channel, ProcessMonitor};
use unplug_core::port::time_provider::SystemTimeProvider;
use unplug_core::port::ProcessDetector;

pub async fn run(
    target_process: String,
    detector: Arc<dyn ProcessDetector>,
    interval: Duration,
) -> Result<()> {
    let monitor = Arc::new(ProcessMonitor::new(
        target_process.clone(),
        detector,
        Arc::new(SystemTimeProvider),
        interval,
    ));
    let mut rx = monitor.subscribe();
    let (shutdown_tx, shutdown) = shutdown_channel();

    let handle = {
        let monitor = Arc::clone(&monitor);
        tokio::spawn(async move { monitor.run(shutdown).await })
    };

    println!(
        "{}",
        format!("Watching {} every {}s (Ctrl+C to stop)", target_process, interval.as_secs())
            .cyan()
            .bold()
    );

    let mut last_running: Option<bool> = None;
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *rx.borrow_and_update();
                if last_running != Some(status.running) {
                    last_running = Some(status.running);
                    if status.running {
                        println!("{} {} is running", "●".green(), target_process);
                    } else {
                        println!("{} {} is not running", "○".dimmed(), target_process);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    shutdown_tx.shutdown();
    let _ = handle.await;
    Ok(())
}
