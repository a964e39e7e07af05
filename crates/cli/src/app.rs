// DI wiring: config -> adapters -> controller

use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use unplug_core::application::DisruptionController;
use unplug_core::port::id_provider::UuidProvider;
use unplug_core::port::time_provider::SystemTimeProvider;
use unplug_core::port::{ProcessDetector, SecretStore};
use unplug_infra_system::{KeyringSecretStore, PgrepDetector, ScriptBlocker, SysinfoDetector};

use crate::config::{AppConfig, DetectorKind};

/// Variables the helper script may inherit
const HELPER_ENV_ALLOWLIST: [&str; 3] = ["PATH", "HOME", "USER"];

pub fn build_detector(config: &AppConfig) -> Arc<dyn ProcessDetector> {
    debug!(detector = ?config.detector, "Selecting process detector");
    match config.detector {
        DetectorKind::Pgrep => Arc::new(PgrepDetector::new()),
        DetectorKind::Sysinfo => Arc::new(SysinfoDetector::new()),
    }
}

pub fn build_secret_store(config: &AppConfig) -> Arc<dyn SecretStore> {
    Arc::new(KeyringSecretStore::new(
        config.keyring_service.clone(),
        config.keyring_account.clone(),
    ))
}

pub fn build_blocker(config: &AppConfig) -> Result<ScriptBlocker> {
    Ok(ScriptBlocker::new(
        config.interpreter.clone(),
        config.helper_script_path()?,
        config.block_ports.clone(),
        HELPER_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
    ))
}

pub fn build_controller(config: &AppConfig) -> Result<Arc<DisruptionController>> {
    let blocker = build_blocker(config)?;
    Ok(Arc::new(DisruptionController::new(
        config.target_process.clone(),
        build_detector(config),
        Arc::new(blocker),
        build_secret_store(config),
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
    )))
}
