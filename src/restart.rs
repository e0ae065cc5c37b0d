//! Restart coordination: translate "which files changed" into "which
//! services restart".

use crate::render::{RenderResult, ResourceMap};
use crate::runner;
use crate::system::service;
use anyhow::Result;
use std::thread;
use std::time::Duration;

/// The managed primary service: the fabric forwarder
pub const FORWARDER_SERVICE: &str = "vedge-forwarder";

// The forwarder performs asynchronous kernel-level datapath setup on
// start/stop and exposes no readiness signal, so stop and start are
// followed by fixed settle delays. Weak guarantee, kept until the
// forwarder grows a probe.
const STOP_SETTLE: Duration = Duration::from_secs(2);
const START_SETTLE: Duration = Duration::from_secs(5);

/// Services impacted by the changed files of a render pass, in map order,
/// each named once
pub fn affected_services(results: &[RenderResult], map: &ResourceMap) -> Vec<String> {
    let restart_map = map.restart_map();
    let mut services: Vec<String> = Vec::new();
    for result in results.iter().filter(|r| r.changed) {
        let Some((_, impacted)) = restart_map.iter().find(|(path, _)| *path == result.path) else {
            continue;
        };
        for service in *impacted {
            if !services.contains(service) {
                services.push(service.clone());
            }
        }
    }
    services
}

/// Restart exactly the services whose resources changed
pub fn restart_changed(results: &[RenderResult], map: &ResourceMap) -> Result<()> {
    let services = affected_services(results, map);
    if services.is_empty() {
        log::info!("no rendered file changed, nothing to restart");
        return Ok(());
    }
    for service in services {
        restart(&service)?;
    }
    Ok(())
}

/// Restart every service named in the map, unconditionally (install path:
/// there is no prior state to diff against)
pub fn restart_all(map: &ResourceMap) -> Result<()> {
    for service in map.services() {
        restart(&service)?;
    }
    Ok(())
}

fn restart(name: &str) -> Result<()> {
    if name == FORWARDER_SERVICE {
        restart_forwarder()
    } else {
        log::info!("restarting {name}");
        service::restart(name)
    }
}

/// Full forwarder restart cycle: stop, settle, flush the stale packet-filter
/// rules it owns, start, settle
pub fn restart_forwarder() -> Result<()> {
    log::info!("restarting {FORWARDER_SERVICE}");
    service::stop(FORWARDER_SERVICE)?;
    thread::sleep(STOP_SETTLE);
    runner::run_best_effort("iptables", &["-F"], "failed to flush packet-filter rules");
    service::start(FORWARDER_SERVICE)?;
    thread::sleep(START_SETTLE);
    Ok(())
}

/// Stop the forwarder and let its teardown settle; no restart
pub fn stop_forwarder() -> Result<()> {
    log::info!("stopping {FORWARDER_SERVICE}");
    service::stop(FORWARDER_SERVICE)?;
    thread::sleep(STOP_SETTLE);
    Ok(())
}
