//! Node preparation: management interface resolution, MTU enforcement,
//! supporting files and the lifecycle-manager trust key.
//!
//! Every operation here is an idempotent assertion against external node
//! state; re-running any of them converges to the same end state.

use crate::bus::{self, AgentConfig};
use crate::paths::NodePaths;
use crate::render::write_if_changed;
use crate::system::network;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// NOPASSWD grant for the interface-control helper the forwarder shells out to
const SUDOERS_CONTENT: &str = "\nvedge ALL=(root) NOPASSWD: /opt/vedge/bin/ifc_ctl *\n";

const SECURITY_DIRECTIVE: &str = "security_driver";

/// Resolve the management interface.
///
/// The configured name wins when the interface exists; otherwise fall back
/// to the interface owning the node's advertised address.
pub fn management_interface(cfg: &AgentConfig) -> Result<String> {
    if network::interface_exists(&cfg.mgmt_interface) {
        return Ok(cfg.mgmt_interface.clone());
    }
    if !cfg.mgmt_interface.is_empty() {
        log::warn!(
            "configured management interface {} does not exist, deriving from advertised address",
            cfg.mgmt_interface
        );
    }
    let address = bus::unit_address()?;
    network::interface_for_address(&address)
}

/// Assert the required MTU on the management interface and, when it is a
/// bridge, on every member interface
pub fn ensure_mtu(cfg: &AgentConfig) -> Result<()> {
    let mgmt = management_interface(cfg)?;
    let members = if network::is_bridge(&mgmt) {
        network::bridge_members(&mgmt)?
    } else {
        Vec::new()
    };
    for target in mtu_targets(&mgmt, &members) {
        network::set_mtu(&target, cfg.network_device_mtu)?;
    }
    Ok(())
}

/// Interfaces whose MTU must be asserted: bridge members first, then the
/// management interface itself
pub fn mtu_targets(mgmt: &str, members: &[String]) -> Vec<String> {
    let mut targets = members.to_vec();
    targets.push(mgmt.to_string());
    targets
}

/// Ensure the supporting files exist before templates are written: the
/// sudoers drop-in, the filter-rules file and the security-driver toggle
pub fn ensure_files(paths: &NodePaths) -> Result<()> {
    write_if_changed(&paths.sudoers(), SUDOERS_CONTENT)?;

    let filters = paths.filter_rules();
    if let Some(parent) = filters.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create {}", parent.display()))?;
    }
    if !filters.exists() {
        fs::write(&filters, "").with_context(|| format!("Could not touch {}", filters.display()))?;
    }

    disable_security_driver(&paths.lxc_conf())
}

/// Comment out the container security-driver directive in place.
///
/// Precondition: the file exists. Absence means the container runtime is
/// not installed yet and is a recoverable no-op.
pub fn disable_security_driver(path: &Path) -> Result<()> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            log::debug!("{} not present, skipping security-driver toggle", path.display());
            return Ok(());
        }
    };
    let toggled = comment_security_driver(&content);
    if toggled != content {
        fs::write(path, toggled)
            .with_context(|| format!("Could not write {}", path.display()))?;
        log::info!("disabled security driver in {}", path.display());
    }
    Ok(())
}

/// Line-oriented transform commenting every active security-driver line;
/// already-commented lines pass through untouched
pub fn comment_security_driver(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 1);
    for line in content.lines() {
        if line.trim_start().starts_with(SECURITY_DIRECTIVE) {
            out.push('#');
        }
        out.push_str(line);
        out.push('\n');
    }
    if !content.ends_with('\n') && out.ends_with('\n') {
        out.pop();
    }
    out
}

/// Insert the lifecycle manager's public key into the forwarder container's
/// authorized keys. Set semantics: inserting the same key twice leaves one
/// occurrence.
pub fn install_ssh_key(paths: &NodePaths, key: &str) -> Result<()> {
    if key.is_empty() || key == "null" {
        log::info!("no lifecycle-manager key configured");
        return Ok(());
    }

    let path = paths.authorized_keys();
    let existing = fs::read_to_string(&path).unwrap_or_default();
    if existing.lines().any(|line| line.contains(key)) {
        log::debug!("lifecycle-manager key already authorized");
        return Ok(());
    }

    let mut updated = existing;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(key);
    updated.push('\n');

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create {}", parent.display()))?;
    }
    fs::write(&path, updated).with_context(|| format!("Could not write {}", path.display()))?;
    log::info!("authorized lifecycle-manager key");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_mtu_targets_bridge_members_then_bridge() {
        let members = vec!["eth1".to_string(), "eth2".to_string()];
        assert_eq!(mtu_targets("br-mgmt", &members), vec!["eth1", "eth2", "br-mgmt"]);
    }

    #[test]
    fn test_mtu_targets_plain_interface() {
        assert_eq!(mtu_targets("eth0", &[]), vec!["eth0"]);
    }

    #[test]
    fn test_comment_security_driver() {
        let input = "log_level = 2\nsecurity_driver = \"apparmor\"\n";
        let out = comment_security_driver(input);
        assert_eq!(out, "log_level = 2\n#security_driver = \"apparmor\"\n");
    }

    #[test]
    fn test_comment_security_driver_is_idempotent() {
        let once = comment_security_driver("security_driver = \"apparmor\"\n");
        let twice = comment_security_driver(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_disable_security_driver_missing_file_is_no_op() {
        let dir = tempdir().unwrap();
        assert!(disable_security_driver(&dir.path().join("lxc.conf")).is_ok());
    }

    #[test]
    fn test_disable_security_driver_rewrites_once() {
        let dir = tempdir().unwrap();
        let conf = dir.path().join("lxc.conf");
        fs::write(&conf, "security_driver = \"apparmor\"\n").unwrap();
        disable_security_driver(&conf).unwrap();
        disable_security_driver(&conf).unwrap();
        assert_eq!(
            fs::read_to_string(&conf).unwrap(),
            "#security_driver = \"apparmor\"\n"
        );
    }

    #[test]
    fn test_install_ssh_key_is_a_set_operation() {
        let dir = tempdir().unwrap();
        let paths = NodePaths::with_root(dir.path());
        let key = "ssh-rsa AAAAB3Nza lcm@director";
        install_ssh_key(&paths, key).unwrap();
        install_ssh_key(&paths, key).unwrap();
        let content = fs::read_to_string(paths.authorized_keys()).unwrap();
        assert_eq!(content.matches(key).count(), 1);
        assert_eq!(content, format!("{key}\n"));
    }

    #[test]
    fn test_install_ssh_key_appends_to_existing_keys() {
        let dir = tempdir().unwrap();
        let paths = NodePaths::with_root(dir.path());
        install_ssh_key(&paths, "ssh-rsa AAAA one").unwrap();
        install_ssh_key(&paths, "ssh-rsa BBBB two").unwrap();
        let content = fs::read_to_string(paths.authorized_keys()).unwrap();
        assert_eq!(content, "ssh-rsa AAAA one\nssh-rsa BBBB two\n");
    }

    #[test]
    fn test_install_ssh_key_null_is_no_op() {
        let dir = tempdir().unwrap();
        let paths = NodePaths::with_root(dir.path());
        install_ssh_key(&paths, "null").unwrap();
        install_ssh_key(&paths, "").unwrap();
        assert!(!paths.authorized_keys().exists());
    }

    #[test]
    fn test_ensure_files_creates_supporting_files() {
        let dir = tempdir().unwrap();
        let paths = NodePaths::with_root(dir.path());
        ensure_files(&paths).unwrap();
        assert!(paths.sudoers().exists());
        assert!(paths.filter_rules().exists());
        let sudoers = fs::read_to_string(paths.sudoers()).unwrap();
        assert!(sudoers.contains("NOPASSWD: /opt/vedge/bin/ifc_ctl"));
    }

    #[test]
    fn test_ensure_files_does_not_truncate_filter_rules() {
        let dir = tempdir().unwrap();
        let paths = NodePaths::with_root(dir.path());
        ensure_files(&paths).unwrap();
        fs::write(paths.filter_rules(), "[Filters]\n").unwrap();
        ensure_files(&paths).unwrap();
        assert_eq!(fs::read_to_string(paths.filter_rules()).unwrap(), "[Filters]\n");
    }
}
