// Terminal rendering of status snapshots

use colored::Colorize;
use std::io::{self, Write};

use unplug_core::domain::{CycleStatus, StatusSnapshot};

const BAR_WIDTH: usize = 30;

/// Fixed-width text progress bar, `progress` clamped to [0, 1]
pub fn progress_bar(progress: f64, width: usize) -> String {
    let filled = (progress.clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn status_label(status: CycleStatus) -> colored::ColoredString {
    let label = format!("{:<10}", status.to_string());
    match status {
        CycleStatus::Idle => label.dimmed(),
        CycleStatus::Validating => label.cyan(),
        CycleStatus::Blocking => label.yellow().bold(),
        CycleStatus::Restoring => label.green(),
        CycleStatus::Error => label.red().bold(),
    }
}

/// Renders a snapshot sequence; `Blocking` updates rewrite the same line
#[derive(Default)]
pub struct StatusPrinter {
    on_progress_line: bool,
}

impl StatusPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn print(&mut self, snapshot: &StatusSnapshot) -> io::Result<()> {
        let mut out = io::stdout().lock();
        if snapshot.status == CycleStatus::Blocking {
            write!(
                out,
                "\r{} {} {:>4}s left",
                status_label(snapshot.status),
                progress_bar(snapshot.progress(), BAR_WIDTH),
                snapshot.remaining_secs()
            )?;
            self.on_progress_line = true;
            return out.flush();
        }

        if self.on_progress_line {
            writeln!(out)?;
            self.on_progress_line = false;
        }
        writeln!(out, "{} {}", status_label(snapshot.status), snapshot.last_message)?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0.0, 4), "[----]");
        assert_eq!(progress_bar(0.5, 4), "[##--]");
        assert_eq!(progress_bar(1.0, 4), "[####]");
        assert_eq!(progress_bar(7.0, 4), "[####]");
        assert_eq!(progress_bar(-1.0, 4), "[----]");
    }

    #[test]
    fn test_progress_bar_width() {
        assert_eq!(progress_bar(0.33, BAR_WIDTH).len(), BAR_WIDTH + 2);
    }
}
