//! Client for the configuration/relation bus hook tools.
//!
//! The bus delivers lifecycle events to this node and exposes a small set of
//! command-line tools inside the hook environment: `config-get`, `unit-get`,
//! `relation-ids`, `relation-list`, `relation-get` and `relation-set`. The
//! transport behind them is opaque to the agent; a missing or failing tool is
//! an unrecoverable environment error for the current invocation.

use serde::Deserialize;
use std::process::Command;
use thiserror::Error;

/// Relation id of the event currently being processed, set by the bus
pub const ENV_RELATION_ID: &str = "VEDGE_RELATION_ID";

/// Errors raised by hook-tool invocations
#[derive(Debug, Error)]
pub enum BusError {
    #[error("hook tool `{tool}` failed: {message}")]
    Tool { tool: &'static str, message: String },

    #[error("hook tool `{tool}` returned an invalid payload: {source}")]
    Payload {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Node-local configuration as published on the bus.
///
/// Unset keys are omitted from the payload, so every field carries a
/// default; value absence is never an error.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AgentConfig {
    /// Interface carrying fabric management traffic
    pub mgmt_interface: String,
    /// MTU asserted on the management interface (and bridge members)
    pub network_device_mtu: u32,
    /// Public key of the lifecycle manager, trusted by the forwarder container
    pub lcm_ssh_key: String,
    /// Shared secret published to plugin consumers
    pub metadata_shared_key: String,
    /// Extra package source line, if the packages are not in the default archive
    pub source: String,
    /// Virtual IP of the director cluster
    pub virtual_ip: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mgmt_interface: String::new(),
            network_device_mtu: 1500,
            lcm_ssh_key: String::new(),
            metadata_shared_key: String::new(),
            source: String::new(),
            virtual_ip: String::new(),
        }
    }
}

fn tool(tool: &'static str, args: &[&str]) -> Result<String, BusError> {
    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|e| BusError::Tool {
            tool,
            message: e.to_string(),
        })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(BusError::Tool {
            tool,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Read the node-local configuration
pub fn config() -> Result<AgentConfig, BusError> {
    let payload = tool("config-get", &["--format=json"])?;
    parse_config(&payload)
}

fn parse_config(payload: &str) -> Result<AgentConfig, BusError> {
    if payload.is_empty() {
        return Ok(AgentConfig::default());
    }
    serde_json::from_str(payload).map_err(|source| BusError::Payload {
        tool: "config-get",
        source,
    })
}

/// Address this node advertises to its peers
pub fn unit_address() -> Result<String, BusError> {
    tool("unit-get", &["private-address"])
}

/// Ids of all joined relations of the named relation type
pub fn relation_ids(name: &str) -> Result<Vec<String>, BusError> {
    let out = tool("relation-ids", &[name])?;
    Ok(out.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect())
}

/// Remote units joined on a relation
pub fn relation_units(relation_id: &str) -> Result<Vec<String>, BusError> {
    let out = tool("relation-list", &["-r", relation_id])?;
    Ok(out.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect())
}

/// Read a single key a remote unit published on a relation
pub fn relation_get(
    relation_id: &str,
    unit: &str,
    key: &str,
) -> Result<Option<String>, BusError> {
    let out = tool("relation-get", &["-r", relation_id, key, unit])?;
    if out.is_empty() { Ok(None) } else { Ok(Some(out)) }
}

/// Publish key-value pairs onto a relation.
///
/// Without an explicit id the pairs go to the relation the current event was
/// delivered for (taken from the hook environment).
pub fn relation_set(relation_id: Option<&str>, pairs: &[(&str, &str)]) -> Result<(), BusError> {
    let mut args: Vec<String> = Vec::new();
    let scope = relation_id
        .map(str::to_string)
        .or_else(|| std::env::var(ENV_RELATION_ID).ok());
    if let Some(rid) = scope {
        args.push("-r".to_string());
        args.push(rid);
    }
    for (key, value) in pairs {
        args.push(format!("{key}={value}"));
    }
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    tool("relation-set", &arg_refs).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_full_payload() {
        let cfg = parse_config(
            r#"{
                "mgmt-interface": "juju-br0",
                "network-device-mtu": 9000,
                "lcm-ssh-key": "ssh-rsa AAAA",
                "metadata-shared-key": "secret",
                "source": "deb https://pkg.example.com/vedge stable main",
                "virtual-ip": "192.168.100.250"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.mgmt_interface, "juju-br0");
        assert_eq!(cfg.network_device_mtu, 9000);
        assert_eq!(cfg.virtual_ip, "192.168.100.250");
    }

    #[test]
    fn test_parse_config_defaults_missing_keys() {
        let cfg = parse_config(r#"{"mgmt-interface": "eth1"}"#).unwrap();
        assert_eq!(cfg.mgmt_interface, "eth1");
        assert_eq!(cfg.network_device_mtu, 1500);
        assert!(cfg.lcm_ssh_key.is_empty());
    }

    #[test]
    fn test_parse_config_empty_payload() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.network_device_mtu, 1500);
    }

    #[test]
    fn test_parse_config_rejects_garbage() {
        assert!(parse_config("not json").is_err());
    }
}
