//! Package manager interface (apt).

use crate::paths::NodePaths;
use crate::runner;
use anyhow::{Context, Result};
use std::fs;

/// Packages required on an edge node
pub const AGENT_PACKAGES: &[&str] = &["vedge-forwarder", "vedge-datapath-dkms"];

/// Write the configured package source and refresh the package index.
///
/// An empty source means the packages come from the default archive; the
/// index is refreshed either way so re-installs see current versions.
pub fn configure_sources(paths: &NodePaths, source: &str) -> Result<()> {
    if source.is_empty() {
        log::debug!("no extra package source configured");
    } else {
        let list = paths.sources_list();
        if let Some(parent) = list.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Could not create {}", parent.display()))?;
        }
        fs::write(&list, format!("{source}\n"))
            .with_context(|| format!("Could not write {}", list.display()))?;
    }
    runner::run_checked("apt-get", &["update"]).context("package index refresh failed")
}

/// Install packages non-interactively; any failure is fatal
pub fn install(packages: &[&str]) -> Result<()> {
    for pkg in packages {
        log::info!("installing {pkg}");
        runner::run_checked("apt-get", &["install", "--assume-yes", pkg])
            .with_context(|| format!("failed to install {pkg}"))?;
    }
    Ok(())
}

/// Purge packages best-effort; failures are logged and skipped
pub fn purge(packages: &[&str]) {
    for pkg in packages {
        runner::run_best_effort(
            "apt-get",
            &["purge", "--assume-yes", pkg],
            &format!("failed to purge {pkg}"),
        );
    }
}
