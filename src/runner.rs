use anyhow::{Context, Result};
use std::process::{Command, Stdio};

/// Run a command and fail if it exits non-zero
pub fn run_checked(cmd: &str, args: &[&str]) -> Result<()> {
    let status = Command::new(cmd)
        .args(args)
        .status()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

    if status.success() {
        Ok(())
    } else {
        anyhow::bail!("Command failed: {} {}", cmd, args.join(" "))
    }
}

/// Run a command and capture output
pub fn run_capture(cmd: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(cmd)
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Command failed: {}", stderr.trim())
    }
}

/// Run a command silently, returning success/failure
pub fn run_quiet(cmd: &str, args: &[&str]) -> bool {
    Command::new(cmd)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run a best-effort command: failures are logged, never propagated
pub fn run_best_effort(cmd: &str, args: &[&str], error_msg: &str) {
    if !run_quiet(cmd, args) {
        log::warn!("{} ({} {})", error_msg, cmd, args.join(" "));
    }
}
