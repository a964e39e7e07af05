//! `hs-unplug credential` - manage the stored administrator password

use anyhow::{bail, Context, Result};
use colored::Colorize;
use nix::sys::termios::{self, LocalFlags, SetArg, Termios};
use secrecy::SecretString;
use std::io::{BufRead, IsTerminal, Write};
use std::sync::Arc;

use unplug_core::port::SecretStore;

/// Terminal echo switched off for as long as this lives
struct EchoOff {
    original: Termios,
}

impl EchoOff {
    fn new() -> nix::Result<Self> {
        let stdin = std::io::stdin();
        let original = termios::tcgetattr(&stdin)?;
        let mut silent = original.clone();
        silent.local_flags.remove(LocalFlags::ECHO);
        // Still echo the final newline so the next output starts on a new line
        silent.local_flags.insert(LocalFlags::ECHONL);
        termios::tcsetattr(&stdin, SetArg::TCSANOW, &silent)?;
        Ok(Self { original })
    }
}

impl Drop for EchoOff {
    fn drop(&mut self) {
        let _ = termios::tcsetattr(&std::io::stdin(), SetArg::TCSANOW, &self.original);
    }
}

/// First line of `reader`; the trailing newline is not part of the secret
fn read_secret_line<R: BufRead>(mut reader: R) -> Result<SecretString> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed_len);

    if line.is_empty() {
        bail!("Password must not be empty");
    }
    Ok(SecretString::from(line))
}

/// Prompt with echo off on a terminal; read piped input as-is
fn read_secret() -> Result<SecretString> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return read_secret_line(stdin.lock());
    }

    eprint!("Administrator password: ");
    std::io::stderr().flush()?;
    let _echo_off = EchoOff::new().context("Failed to disable terminal echo")?;
    read_secret_line(stdin.lock())
}

pub async fn set(store: Arc<dyn SecretStore>) -> Result<()> {
    let secret = read_secret()?;
    store
        .save(&secret)
        .await
        .context("Failed to save administrator credential")?;
    println!("{}", "✓ Administrator credential saved".green().bold());
    Ok(())
}

pub async fn delete(store: Arc<dyn SecretStore>) -> Result<()> {
    store
        .delete()
        .await
        .context("Failed to delete administrator credential")?;
    println!("{}", "✓ Administrator credential removed".green().bold());
    Ok(())
}

pub async fn status(store: Arc<dyn SecretStore>) -> Result<()> {
    let present = store
        .load()
        .await
        .context("Failed to read administrator credential")?
        .is_some();
    if present {
        println!("{}", "Administrator credential: configured".green());
    } else {
        println!(
            "{}",
            "Administrator credential: not configured (run `hs-unplug credential set`)".yellow()
        );
    }
    Ok(())
}
