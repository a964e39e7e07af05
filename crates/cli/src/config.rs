//! Layered configuration
//!
//! Precedence, lowest first: built-in defaults, `config.toml` in the platform
//! config directory, `HSU_*` environment variables, command-line flags.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use unplug_core::application::controller::constants::{
    DEFAULT_POLL_INTERVAL, DEFAULT_TARGET_PROCESS,
};
use unplug_core::domain::{BlockDuration, DEFAULT_BLOCK_DURATION_SECS};
use unplug_core::{AppError, Result};
use unplug_infra_system::keyring_store::{DEFAULT_ACCOUNT, DEFAULT_SERVICE};

const ENV_PREFIX: &str = "HSU";
const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_HELPER_SCRIPT: &str = "~/.hs-unplug/pf-block.sh";
const DEFAULT_INTERPRETER: &str = "/bin/bash";

/// Blizzard login/game ports
const DEFAULT_BLOCK_PORTS: [u16; 2] = [1119, 3724];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    Pgrep,
    Sysinfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub duration_secs: u32,
    pub target_process: String,
    pub detector: DetectorKind,
    pub poll_interval_secs: u64,
    pub helper_script: String,
    pub interpreter: String,
    pub block_ports: Vec<u16>,
    pub keyring_service: String,
    pub keyring_account: String,
    pub log_format: LogFormat,
    pub log_file: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_BLOCK_DURATION_SECS,
            target_process: DEFAULT_TARGET_PROCESS.to_string(),
            detector: DetectorKind::Pgrep,
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            helper_script: DEFAULT_HELPER_SCRIPT.to_string(),
            interpreter: DEFAULT_INTERPRETER.to_string(),
            block_ports: DEFAULT_BLOCK_PORTS.to_vec(),
            keyring_service: DEFAULT_SERVICE.to_string(),
            keyring_account: DEFAULT_ACCOUNT.to_string(),
            log_format: LogFormat::Pretty,
            log_file: false,
        }
    }
}

impl AppConfig {
    /// Load from the default file location and the process environment
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let default_file = default_config_file();
        let file = config_file.or(default_file.as_deref());
        Self::load_from(file, None)
    }

    /// Load with an explicit environment map (`None` reads the process env)
    pub fn load_from(
        config_file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("block_ports")
                .source(env),
        );

        let config: AppConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AppError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        BlockDuration::new(self.duration_secs)
            .map_err(|e| AppError::Config(format!("duration_secs: {}", e)))?;

        if self.target_process.trim().is_empty() {
            return Err(AppError::Config("target_process must not be empty".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(AppError::Config("poll_interval_secs must be positive".into()));
        }
        if self.helper_script.trim().is_empty() || self.interpreter.trim().is_empty() {
            return Err(AppError::Config(
                "helper_script and interpreter must be set".into(),
            ));
        }
        if self.block_ports.is_empty() || self.block_ports.contains(&0) {
            return Err(AppError::Config(
                "block_ports must list at least one non-zero port".into(),
            ));
        }
        if self.keyring_service.is_empty() || self.keyring_account.is_empty() {
            return Err(AppError::Config(
                "keyring_service and keyring_account must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Apply a `--duration` flag
    pub fn with_duration(mut self, duration_secs: Option<u32>) -> Result<Self> {
        if let Some(secs) = duration_secs {
            self.duration_secs = secs;
            self.validate()?;
        }
        Ok(self)
    }

    pub fn block_duration(&self) -> Result<BlockDuration> {
        Ok(BlockDuration::new(self.duration_secs)?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Helper script path with `~` and `$VARS` expanded
    pub fn helper_script_path(&self) -> Result<PathBuf> {
        shellexpand::full(&self.helper_script)
            .map(|p| PathBuf::from(p.into_owned()))
            .map_err(|e| AppError::Config(format!("helper_script: {}", e)))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "hearthstone-unplug", "hs-unplug")
}

pub fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Directory for the optional rolling log file
pub fn log_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::{assert_err, assert_ok};

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn write_config(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "hs_unplug_config_{}_{}.toml",
            name,
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::load_from(None, env(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.duration_secs, 20);
        assert_eq!(config.target_process, "Hearthstone");
        assert_eq!(config.detector, DetectorKind::Pgrep);
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.block_ports, vec![1119, 3724]);
        assert!(!config.log_file);
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let path = std::env::temp_dir().join("hs_unplug_config_does_not_exist.toml");
        assert_ok!(AppConfig::load_from(Some(&path), env(&[])));
    }

    #[test]
    fn test_file_then_env_precedence() {
        let path = write_config(
            "precedence",
            "duration_secs = 30\ndetector = \"sysinfo\"\ntarget_process = \"Hearthstone Beta\"\n",
        );

        let config = AppConfig::load_from(
            Some(&path),
            env(&[("HSU_DURATION_SECS", "45"), ("HSU_BLOCK_PORTS", "1119")]),
        )
        .unwrap();

        assert_eq!(config.duration_secs, 45);
        assert_eq!(config.detector, DetectorKind::Sysinfo);
        assert_eq!(config.target_process, "Hearthstone Beta");
        assert_eq!(config.block_ports, vec![1119]);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_env_log_format() {
        let config = AppConfig::load_from(None, env(&[("HSU_LOG_FORMAT", "json")])).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert_err!(AppConfig::load_from(None, env(&[("HSU_DURATION_SECS", "0")])));
        assert_err!(AppConfig::load_from(None, env(&[("HSU_DURATION_SECS", "3601")])));
        assert_err!(AppConfig::load_from(None, env(&[("HSU_POLL_INTERVAL_SECS", "0")])));
        assert_err!(AppConfig::load_from(None, env(&[("HSU_DETECTOR", "psutil")])));

        let result = AppConfig::load_from(None, env(&[("HSU_DURATION_SECS", "abc")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_duration_flag_override() {
        let config = AppConfig::default().with_duration(Some(5)).unwrap();
        assert_eq!(config.block_duration().unwrap().as_secs(), 5);

        assert_err!(AppConfig::default().with_duration(Some(0)));
        assert_eq!(AppConfig::default().with_duration(None).unwrap().duration_secs, 20);
    }

    #[test]
    fn test_helper_script_expansion() {
        let config = AppConfig {
            helper_script: "/opt/hs-unplug/pf-block.sh".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(
            config.helper_script_path().unwrap(),
            PathBuf::from("/opt/hs-unplug/pf-block.sh")
        );

        let tilde = AppConfig::default().helper_script_path().unwrap();
        assert!(!tilde.to_string_lossy().starts_with('~'));
    }
}
