//! Fixed filesystem layout of the edge node.
//!
//! Every path the agent touches is declared here. The layout is not
//! configurable; the only variable is the filesystem root, which defaults
//! to `/` and can be redirected with `VEDGE_ROOT` (used by the test suite
//! and by container images that stage the tree elsewhere).

use std::path::PathBuf;

/// Environment variable overriding the filesystem root
pub const ENV_ROOT: &str = "VEDGE_ROOT";

/// Data root holding the forwarder's container filesystem, relative to `/`
const DATA_DIR: &str = "var/lib/vedge/data";

/// Resolved path set for one event invocation
#[derive(Debug, Clone)]
pub struct NodePaths {
    root: PathBuf,
}

impl NodePaths {
    /// Resolve the layout against `VEDGE_ROOT`, defaulting to `/`
    pub fn resolve() -> Self {
        match std::env::var(ENV_ROOT) {
            Ok(root) if !root.is_empty() => {
                log::debug!("using filesystem root from {}: {}", ENV_ROOT, root);
                Self::with_root(root)
            }
            _ => Self::with_root("/"),
        }
    }

    /// Resolve the layout against an explicit root
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn data(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    fn etc(&self, rel: &str) -> PathBuf {
        self.root.join("etc").join(rel)
    }

    /// Main forwarder configuration
    pub fn agent_conf(&self) -> PathBuf {
        self.data().join("conf/vedge.conf")
    }

    /// Hostname file inside the forwarder container
    pub fn hostname_conf(&self) -> PathBuf {
        self.data().join("conf/etc/hostname")
    }

    /// Hosts file inside the forwarder container
    pub fn hosts_conf(&self) -> PathBuf {
        self.data().join("conf/etc/hosts")
    }

    /// Fabric interface declaration
    pub fn ifcs_conf(&self) -> PathBuf {
        self.data().join("conf/ifcs.conf")
    }

    /// Rootwrap-style command filter whitelist
    pub fn filter_rules(&self) -> PathBuf {
        self.etc("vedge/filters.d/network.filters")
    }

    /// Sudoers drop-in granting the interface-control helper
    pub fn sudoers(&self) -> PathBuf {
        self.etc("sudoers.d/vedge_ifc_ctl")
    }

    /// Authorized keys of the forwarder container root user
    pub fn authorized_keys(&self) -> PathBuf {
        self.data().join("root/.ssh/authorized_keys")
    }

    /// Container security configuration carrying the security-driver directive
    pub fn lxc_conf(&self) -> PathBuf {
        self.etc("libvirt/lxc.conf")
    }

    /// Package source list installed by `configure_sources`
    pub fn sources_list(&self) -> PathBuf {
        self.etc("apt/sources.list.d/vedge.list")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let paths = NodePaths::with_root("/");
        assert_eq!(
            paths.agent_conf(),
            PathBuf::from("/var/lib/vedge/data/conf/vedge.conf")
        );
        assert_eq!(
            paths.hostname_conf(),
            PathBuf::from("/var/lib/vedge/data/conf/etc/hostname")
        );
        assert_eq!(paths.sudoers(), PathBuf::from("/etc/sudoers.d/vedge_ifc_ctl"));
        assert_eq!(
            paths.filter_rules(),
            PathBuf::from("/etc/vedge/filters.d/network.filters")
        );
    }

    #[test]
    fn test_rebased_layout() {
        let paths = NodePaths::with_root("/tmp/stage");
        assert_eq!(
            paths.authorized_keys(),
            PathBuf::from("/tmp/stage/var/lib/vedge/data/root/.ssh/authorized_keys")
        );
        assert_eq!(paths.lxc_conf(), PathBuf::from("/tmp/stage/etc/libvirt/lxc.conf"));
    }
}
