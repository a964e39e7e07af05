//! Checks on the shipped pf helper script
//!
//! Only the argument and credential validation paths run here; they fail
//! before any `sudo` call.

use std::path::PathBuf;
use std::process::Command;

use futures::StreamExt;
use secrecy::SecretString;
use unplug_core::domain::BlockDuration;
use unplug_core::port::{BlockerEvent, NetworkBlocker};
use unplug_infra_system::ScriptBlocker;

fn helper_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../scripts/pf-block.sh")
        .canonicalize()
        .expect("helper script exists")
}

fn run_helper(args: &[&str], env: &[(&str, &str)]) -> (String, Option<i32>) {
    let output = Command::new("/bin/bash")
        .arg(helper_path())
        .args(args)
        .env_clear()
        .env("PATH", "/usr/bin:/bin")
        .envs(env.iter().copied())
        .output()
        .expect("bash runs");
    (
        String::from_utf8_lossy(&output.stdout).into_owned(),
        output.status.code(),
    )
}

#[test]
fn test_helper_parses() {
    let status = Command::new("/bin/bash")
        .arg("-n")
        .arg(helper_path())
        .status()
        .expect("bash runs");
    assert!(status.success());
}

#[test]
fn test_helper_rejects_bad_duration() {
    let (stdout, code) = run_helper(&["abc"], &[("HSU_ADMIN_PASSWORD", "pw")]);
    assert!(stdout.starts_with("error: invalid duration"));
    assert_eq!(code, Some(1));

    let (stdout, code) = run_helper(&["0"], &[("HSU_ADMIN_PASSWORD", "pw")]);
    assert!(stdout.starts_with("error: duration must be positive"));
    assert_eq!(code, Some(1));
}

#[test]
fn test_helper_rejects_bad_ports() {
    let (stdout, code) = run_helper(
        &["5"],
        &[("HSU_ADMIN_PASSWORD", "pw"), ("HSU_BLOCK_PORTS", "1119;rm")],
    );
    assert!(stdout.starts_with("error: invalid port list"));
    assert_eq!(code, Some(1));
}

#[test]
fn test_helper_never_engages_without_credential() {
    let (stdout, code) = run_helper(&["5"], &[]);
    assert!(stdout.starts_with("error: administrator password not provided"));
    assert!(!stdout.contains("BLOCK_ENGAGED"));
    assert_eq!(code, Some(1));
}

#[tokio::test]
async fn test_blocker_reports_helper_error_marker() {
    let blocker = ScriptBlocker::new(
        "/bin/bash",
        helper_path(),
        vec![1119, 3724],
        vec!["PATH".to_string()],
    );

    let events: Vec<BlockerEvent> = blocker
        .block(
            BlockDuration::new(5).unwrap(),
            &SecretString::from(String::new()),
        )
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            BlockerEvent::Error("administrator password not provided".to_string()),
            BlockerEvent::Exited(Some(1)),
        ]
    );
}
