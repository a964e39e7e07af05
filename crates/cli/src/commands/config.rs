//! `hs-unplug config` - show the effective configuration

use anyhow::Result;
use colored::Colorize;
use tabled::{Table, Tabled};

use crate::config::{self, AppConfig};

#[derive(Tabled)]
struct ConfigRow {
    setting: String,
    value: String,
}

fn row(setting: &str, value: impl ToString) -> ConfigRow {
    ConfigRow {
        setting: setting.to_string(),
        value: value.to_string(),
    }
}

/// The credential itself is never part of the config, only its keyring location
fn rows(cfg: &AppConfig) -> Vec<ConfigRow> {
    let helper = cfg
        .helper_script_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| cfg.helper_script.clone());
    let ports = cfg
        .block_ports
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    vec![
        row("duration_secs", cfg.duration_secs),
        row("target_process", &cfg.target_process),
        row("detector", format!("{:?}", cfg.detector).to_lowercase()),
        row("poll_interval_secs", cfg.poll_interval_secs),
        row("helper_script", helper),
        row("interpreter", &cfg.interpreter),
        row("block_ports", ports),
        row("keyring_service", &cfg.keyring_service),
        row("keyring_account", &cfg.keyring_account),
        row("log_format", format!("{:?}", cfg.log_format).to_lowercase()),
        row("log_file", cfg.log_file),
    ]
}

pub fn show(cfg: &AppConfig) -> Result<()> {
    println!("{}", "Effective configuration".cyan().bold());
    if let Some(path) = config::default_config_file() {
        println!("config file: {}", path.display());
    }
    if cfg.log_file {
        if let Some(dir) = config::log_dir() {
            println!("log dir:     {}", dir.display());
        }
    }
    println!();
    println!("{}", Table::new(rows(cfg)));
    Ok(())
}
