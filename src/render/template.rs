//! Embedded file templates and placeholder expansion.
//!
//! This is deliberately not a template engine: `{{key}}` placeholders are
//! substituted from the merged context map and nothing else. A key with no
//! value expands to the empty string, matching the renderer's policy that
//! absent optional values are omitted rather than fatal.

use super::context::ContextMap;

pub const HOSTNAME_TEMPLATE: &str = "{{label}}\n";

pub const HOSTS_TEMPLATE: &str = "\
127.0.0.1 localhost
{{address}} {{label}}
";

pub const AGENT_CONF_TEMPLATE: &str = "\
# vedge.conf - managed by vedge, local changes will be overwritten
vedge-config {
    mgmt-dev = {{mgmt_interface}};
    label = {{label}};
    fabric {
        directors = {{director_ips}};
        virtual-ip = {{virtual_ip}};
    }
}
";

pub const IFCS_CONF_TEMPLATE: &str = "{{mgmt_interface}} = fabric_core host\n";

/// Whitelist of commands the forwarder may run via the control helper;
/// static content, rendered like any other resource so drift is repaired
pub const FILTER_RULES_TEMPLATE: &str = "\
[Filters]
ifc_ctl: CommandFilter, /opt/vedge/bin/ifc_ctl, root
";

/// Expand `{{key}}` placeholders from the context map
pub fn expand(template: &str, context: &ContextMap) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                if let Some(value) = context.get(key) {
                    out.push_str(value);
                }
                rest = &after[end + 2..];
            }
            None => {
                // Unterminated placeholder: keep the literal text
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
