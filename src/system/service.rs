//! Service manager interface (systemd).

use crate::runner;
use anyhow::{Context, Result};

pub fn stop(name: &str) -> Result<()> {
    runner::run_checked("systemctl", &["stop", name])
        .with_context(|| format!("failed to stop {name}"))
}

pub fn start(name: &str) -> Result<()> {
    runner::run_checked("systemctl", &["start", name])
        .with_context(|| format!("failed to start {name}"))
}

pub fn restart(name: &str) -> Result<()> {
    runner::run_checked("systemctl", &["restart", name])
        .with_context(|| format!("failed to restart {name}"))
}
