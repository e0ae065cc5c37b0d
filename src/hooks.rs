//! Lifecycle event dispatch.
//!
//! Each handler is a straight-line composition of idempotent assertions:
//! packages present, kernel module loaded, MTU set, supporting files in
//! place, configuration rendered, impacted services restarted. The bus
//! redelivers events at-least-once, so every handler must converge to the
//! same end state when re-run.

use crate::bus;
use crate::node;
use crate::paths::NodePaths;
use crate::render::{Renderer, ResourceMap};
use crate::restart;
use crate::system::{kernel, packages};
use crate::ui;
use anyhow::Result;

/// A lifecycle event delivered by the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Install,
    ConfigChanged,
    /// Peer director joined the fabric
    DirectorJoined,
    /// A plugin consumer wants the metadata shared secret
    PluginJoined,
    Stop,
    /// Delivered by the bus but not implemented here; logged and ignored
    Unknown(String),
}

impl Event {
    pub fn from_name(name: &str) -> Self {
        match name {
            "install" => Self::Install,
            "config-changed" => Self::ConfigChanged,
            "director-relation-joined" => Self::DirectorJoined,
            "plugin-relation-joined" => Self::PluginJoined,
            "stop" => Self::Stop,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Run the handler for one event; the only error that crosses this boundary
/// terminates the whole invocation
pub fn dispatch(event: Event) -> Result<()> {
    log::debug!("dispatching {event:?}");
    match event {
        Event::Install => install(),
        Event::ConfigChanged => config_changed(),
        Event::DirectorJoined => director_joined(),
        Event::PluginJoined => plugin_joined(None),
        Event::Stop => stop(),
        Event::Unknown(name) => {
            log::warn!("unknown lifecycle event {name:?} - skipping");
            Ok(())
        }
    }
}

/// First deployment on a node: put the packages, kernel module and
/// supporting files in place and give every managed service a clean start.
/// Rendering waits for the first director relation.
fn install() -> Result<()> {
    let cfg = bus::config()?;
    let paths = NodePaths::resolve();

    ui::step(1, 4, "configuring package sources");
    packages::configure_sources(&paths, &cfg.source)?;
    packages::install(packages::AGENT_PACKAGES)?;

    ui::step(2, 4, "loading datapath kernel module");
    kernel::load(kernel::DATAPATH_MODULE)?;

    ui::step(3, 4, "preparing node");
    node::ensure_mtu(&cfg)?;
    node::ensure_files(&paths)?;
    node::install_ssh_key(&paths, &cfg.lcm_ssh_key)?;

    ui::step(4, 4, "starting services");
    restart::restart_all(&ResourceMap::build(&paths))?;

    ui::success("edge node installed");
    Ok(())
}

/// A peer director joined: converge node state, render everything and
/// restart whatever the render changed
fn director_joined() -> Result<()> {
    let cfg = bus::config()?;
    let paths = NodePaths::resolve();

    node::ensure_mtu(&cfg)?;
    node::ensure_files(&paths)?;
    node::install_ssh_key(&paths, &cfg.lcm_ssh_key)?;

    let renderer = Renderer::new(ResourceMap::build(&paths));
    let results = renderer.render_all()?;
    log::debug!(
        "rendered {} files, {} changed",
        results.iter().filter(|r| r.rendered).count(),
        results.iter().filter(|r| r.changed).count()
    );
    restart::restart_changed(&results, renderer.map())?;

    ui::success("converged with director");
    Ok(())
}

/// A plugin consumer joined: publish the metadata shared secret onto the
/// relation. Scoped to one relation id when given, otherwise to the
/// relation the current event was delivered for.
fn plugin_joined(relation_id: Option<&str>) -> Result<()> {
    let cfg = bus::config()?;
    bus::relation_set(
        relation_id,
        &[("metadata-shared-secret", &cfg.metadata_shared_key)],
    )?;
    Ok(())
}

/// Configuration changed (also runs on node reboot): re-assert everything,
/// re-publish the secret to every plugin consumer, re-render and restart
/// what changed
fn config_changed() -> Result<()> {
    let cfg = bus::config()?;
    let paths = NodePaths::resolve();

    restart::stop_forwarder()?;

    packages::configure_sources(&paths, &cfg.source)?;
    packages::install(packages::AGENT_PACKAGES)?;
    kernel::load(kernel::DATAPATH_MODULE)?;
    node::ensure_mtu(&cfg)?;

    for rid in bus::relation_ids("plugin")? {
        plugin_joined(Some(&rid))?;
    }

    node::ensure_files(&paths)?;
    node::install_ssh_key(&paths, &cfg.lcm_ssh_key)?;

    let renderer = Renderer::new(ResourceMap::build(&paths));
    let results = renderer.render_all()?;
    log::debug!(
        "rendered {} files, {} changed",
        results.iter().filter(|r| r.rendered).count(),
        results.iter().filter(|r| r.changed).count()
    );
    restart::restart_changed(&results, renderer.map())?;

    ui::success("configuration converged");
    Ok(())
}

/// Teardown: stop the forwarder, then best-effort removal of the kernel
/// module and packages. Purge failures must not fail the event.
fn stop() -> Result<()> {
    restart::stop_forwarder()?;
    kernel::unload(kernel::DATAPATH_MODULE);
    packages::purge(packages::AGENT_PACKAGES);
    ui::success("edge node stopped");
    Ok(())
}
