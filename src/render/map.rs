//! The resource map: a declaration of every file the agent renders, the
//! services that must restart when it changes, and the context providers
//! that feed its template.
//!
//! The map is built fresh for every event and discarded afterwards; no
//! state is shared between invocations. Iteration order is significant and
//! fixed: the host identity files (hostname, hosts) render before the main
//! conf file that references them.

use super::context::{ContextProvider, DirectorContext, NodeContext};
use crate::paths::NodePaths;
use crate::restart::FORWARDER_SERVICE;
use std::path::{Path, PathBuf};

/// One rendered file: its output path, dependent services and the ordered
/// providers feeding its template
#[derive(Debug)]
pub struct ResourceEntry {
    pub path: PathBuf,
    pub services: Vec<String>,
    pub contexts: Vec<Box<dyn ContextProvider>>,
}

/// Ordered mapping from output path to resource entry
#[derive(Debug, Default)]
pub struct ResourceMap {
    entries: Vec<ResourceEntry>,
}

impl ResourceMap {
    /// Build the map for a single event invocation.
    ///
    /// Deterministic apart from the base-directory resolution carried by
    /// `paths`; construction cannot fail and has no side effects.
    pub fn build(paths: &NodePaths) -> Self {
        let forwarder = vec![FORWARDER_SERVICE.to_string()];
        let entries = vec![
            ResourceEntry {
                path: paths.hostname_conf(),
                services: forwarder.clone(),
                contexts: vec![Box::new(NodeContext)],
            },
            ResourceEntry {
                path: paths.hosts_conf(),
                services: forwarder.clone(),
                contexts: vec![Box::new(NodeContext)],
            },
            ResourceEntry {
                path: paths.agent_conf(),
                services: forwarder,
                contexts: vec![Box::new(NodeContext), Box::new(DirectorContext)],
            },
            ResourceEntry {
                path: paths.ifcs_conf(),
                services: Vec::new(),
                contexts: vec![Box::new(NodeContext)],
            },
            ResourceEntry {
                path: paths.filter_rules(),
                services: Vec::new(),
                contexts: Vec::new(),
            },
        ];
        Self { entries }
    }

    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }

    /// Add an entry or overwrite the context list of an existing one
    pub fn register(&mut self, path: PathBuf, contexts: Vec<Box<dyn ContextProvider>>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.path == path) {
            entry.contexts = contexts;
        } else {
            self.entries.push(ResourceEntry {
                path,
                services: Vec::new(),
                contexts,
            });
        }
    }

    /// Projection `path -> services`, used only to decide what to restart
    pub fn restart_map(&self) -> Vec<(&Path, &[String])> {
        self.entries
            .iter()
            .map(|e| (e.path.as_path(), e.services.as_slice()))
            .collect()
    }

    /// Every service named anywhere in the map, order-preserving dedup
    pub fn services(&self) -> Vec<String> {
        let mut services: Vec<String> = Vec::new();
        for entry in &self.entries {
            for service in &entry.services {
                if !services.contains(service) {
                    services.push(service.clone());
                }
            }
        }
        services
    }
}
