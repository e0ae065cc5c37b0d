//! Context providers: stateless producers of the key-value data consumed
//! by template rendering. Providers read the bus and node facts on every
//! call; nothing is cached between events.

use crate::bus;
use crate::node;
use crate::runner;
use anyhow::Result;
use std::collections::BTreeMap;

/// Flat key-value mapping consumed by template expansion
pub type ContextMap = BTreeMap<String, String>;

/// A stateless producer of render data.
///
/// `produce` must not fail for absent values; absent values are simply
/// omitted from the map. Errors are reserved for unrecoverable environment
/// failures and abort the whole render pass.
pub trait ContextProvider: std::fmt::Debug {
    fn produce(&self) -> Result<ContextMap>;
}

/// Merge provider output in list order; later providers override earlier
/// ones on key collision
pub fn merge_contexts(contexts: &[Box<dyn ContextProvider>]) -> Result<ContextMap> {
    let mut merged = ContextMap::new();
    for context in contexts {
        merged.extend(context.produce()?);
    }
    Ok(merged)
}

/// Identity and interface facts of this node
#[derive(Debug, Default)]
pub struct NodeContext;

impl ContextProvider for NodeContext {
    fn produce(&self) -> Result<ContextMap> {
        let cfg = bus::config()?;
        let mut map = ContextMap::new();
        map.insert("label".to_string(), runner::run_capture("hostname", &[])?);
        map.insert("address".to_string(), bus::unit_address()?);
        map.insert("mgmt_interface".to_string(), node::management_interface(&cfg)?);
        map.insert("mtu".to_string(), cfg.network_device_mtu.to_string());
        Ok(map)
    }
}

/// Director cluster membership as seen from the peer relation
#[derive(Debug, Default)]
pub struct DirectorContext;

impl ContextProvider for DirectorContext {
    fn produce(&self) -> Result<ContextMap> {
        let cfg = bus::config()?;
        let mut map = ContextMap::new();

        let mut directors = Vec::new();
        for rid in bus::relation_ids("director")? {
            for unit in bus::relation_units(&rid)? {
                if let Some(address) = bus::relation_get(&rid, &unit, "private-address")? {
                    directors.push(address);
                }
            }
        }
        directors.sort();
        directors.dedup();
        if !directors.is_empty() {
            map.insert("director_ips".to_string(), directors.join(","));
        }
        if !cfg.virtual_ip.is_empty() {
            map.insert("virtual_ip".to_string(), cfg.virtual_ip);
        }
        Ok(map)
    }
}

/// Fixed-output provider for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct StaticContext(pub ContextMap);

#[cfg(test)]
impl StaticContext {
    pub fn with(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

#[cfg(test)]
impl ContextProvider for StaticContext {
    fn produce(&self) -> Result<ContextMap> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_later_provider_wins() {
        let contexts: Vec<Box<dyn ContextProvider>> = vec![
            Box::new(StaticContext::with(&[("a", "1"), ("b", "1")])),
            Box::new(StaticContext::with(&[("b", "2"), ("c", "2")])),
        ];
        let merged = merge_contexts(&contexts).unwrap();
        assert_eq!(merged.get("a").unwrap(), "1");
        assert_eq!(merged.get("b").unwrap(), "2");
        assert_eq!(merged.get("c").unwrap(), "2");
    }

    #[test]
    fn test_merge_empty_provider_list() {
        assert!(merge_contexts(&[]).unwrap().is_empty());
    }

    #[derive(Debug)]
    struct FailingContext;

    impl ContextProvider for FailingContext {
        fn produce(&self) -> Result<ContextMap> {
            anyhow::bail!("hook tool unavailable")
        }
    }

    #[test]
    fn test_merge_propagates_fatal_provider_error() {
        let contexts: Vec<Box<dyn ContextProvider>> = vec![
            Box::new(StaticContext::with(&[("a", "1")])),
            Box::new(FailingContext),
        ];
        assert!(merge_contexts(&contexts).is_err());
    }
}
