//! Network introspection: interface existence, address ownership, bridge
//! membership and MTU assertion.

use crate::runner;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Check whether an interface exists on this node
pub fn interface_exists(name: &str) -> bool {
    !name.is_empty() && runner::run_quiet("ip", &["link", "show", name])
}

/// Find the interface owning the given address
pub fn interface_for_address(address: &str) -> Result<String> {
    let output = runner::run_capture("ip", &["-o", "addr", "show"])?;
    parse_interface_for_address(&output, address)
        .with_context(|| format!("no interface owns address {address}"))
}

fn parse_interface_for_address(output: &str, address: &str) -> Option<String> {
    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            continue;
        }
        if fields[3].split('/').next() == Some(address) {
            return Some(fields[1].to_string());
        }
    }
    None
}

fn sys_bridge_dir(name: &str) -> PathBuf {
    PathBuf::from(format!("/sys/class/net/{name}/bridge"))
}

/// Whether the interface is a bridge
pub fn is_bridge(name: &str) -> bool {
    sys_bridge_dir(name).is_dir()
}

/// Member interfaces of a bridge, sorted for deterministic iteration
pub fn bridge_members(name: &str) -> Result<Vec<String>> {
    let brif = PathBuf::from(format!("/sys/class/net/{name}/brif"));
    let mut members = Vec::new();
    let entries = std::fs::read_dir(&brif)
        .with_context(|| format!("Could not read bridge members of {name}"))?;
    for entry in entries {
        members.push(entry?.file_name().to_string_lossy().to_string());
    }
    members.sort();
    Ok(members)
}

/// Set the MTU of an interface
pub fn set_mtu(name: &str, mtu: u32) -> Result<()> {
    runner::run_checked("ip", &["link", "set", "dev", name, "mtu", &mtu.to_string()])
        .with_context(|| format!("failed to set mtu {mtu} on {name}"))
}
