//! Kernel module control for the datapath module.

use crate::runner;
use anyhow::{Context, Result};

/// Kernel module implementing the fabric datapath
pub const DATAPATH_MODULE: &str = "vedge_datapath";

/// Load a kernel module; `modprobe` is idempotent so this doubles as an
/// assertion that the module is present
pub fn load(module: &str) -> Result<()> {
    runner::run_checked("modprobe", &[module])
        .with_context(|| format!("failed to load kernel module {module}"))
}

/// Unload a kernel module; failure is logged, not fatal
pub fn unload(module: &str) {
    runner::run_best_effort("rmmod", &[module], &format!("failed to unload kernel module {module}"));
}
