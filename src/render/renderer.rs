//! The renderer: expand every registered file from its merged context and
//! write only what changed.

use super::context::{ContextProvider, merge_contexts};
use super::map::ResourceMap;
use super::template;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of one file in a render pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    pub path: PathBuf,
    /// A template existed and was expanded for this path
    pub rendered: bool,
    /// The expanded content differed from what was on disk
    pub changed: bool,
}

/// Renders the resource map for one event invocation
#[derive(Debug)]
pub struct Renderer {
    map: ResourceMap,
}

impl Renderer {
    pub fn new(map: ResourceMap) -> Self {
        Self { map }
    }

    pub fn map(&self) -> &ResourceMap {
        &self.map
    }

    /// Add a path or overwrite its context list; idempotent
    pub fn register(&mut self, path: PathBuf, contexts: Vec<Box<dyn ContextProvider>>) {
        self.map.register(path, contexts);
    }

    /// Render every registered file in map order.
    ///
    /// Runs in two phases: all contexts are produced and merged before any
    /// file is written, so a fatal provider error aborts the pass without
    /// leaving services pointed at half-updated configuration.
    pub fn render_all(&self) -> Result<Vec<RenderResult>> {
        let mut staged: Vec<(&Path, Option<String>)> = Vec::new();
        for entry in self.map.entries() {
            match template_for(&entry.path) {
                Some(tpl) => {
                    let context = merge_contexts(&entry.contexts).with_context(|| {
                        format!("context production failed for {}", entry.path.display())
                    })?;
                    staged.push((entry.path.as_path(), Some(template::expand(tpl, &context))));
                }
                None => {
                    log::warn!("no template registered for {}, skipping", entry.path.display());
                    staged.push((entry.path.as_path(), None));
                }
            }
        }

        let mut results = Vec::with_capacity(staged.len());
        for (path, content) in staged {
            let result = match content {
                Some(content) => {
                    let changed = write_if_changed(path, &content)?;
                    if changed {
                        log::info!("rendered {}", path.display());
                    } else {
                        log::debug!("{} unchanged", path.display());
                    }
                    RenderResult {
                        path: path.to_path_buf(),
                        rendered: true,
                        changed,
                    }
                }
                None => RenderResult {
                    path: path.to_path_buf(),
                    rendered: false,
                    changed: false,
                },
            };
            results.push(result);
        }
        Ok(results)
    }
}

/// Look up the embedded template for a registered output path
fn template_for(path: &Path) -> Option<&'static str> {
    match path.file_name()?.to_str()? {
        "hostname" => Some(template::HOSTNAME_TEMPLATE),
        "hosts" => Some(template::HOSTS_TEMPLATE),
        "vedge.conf" => Some(template::AGENT_CONF_TEMPLATE),
        "ifcs.conf" => Some(template::IFCS_CONF_TEMPLATE),
        "network.filters" => Some(template::FILTER_RULES_TEMPLATE),
        _ => None,
    }
}

/// Write `content` to `path` only if it differs from the current file.
///
/// Returns whether the file was written. Parent directories are created;
/// rendered files are world-readable, owner-writable.
pub fn write_if_changed(path: &Path, content: &str) -> Result<bool> {
    if let Ok(existing) = fs::read_to_string(path)
        && existing == content
    {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Could not write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o644))
            .with_context(|| format!("Could not set permissions on {}", path.display()))?;
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::NodePaths;
    use crate::render::context::StaticContext;
    use tempfile::tempdir;

    /// Renderer over the full resource map with bus-free static contexts
    fn test_renderer(paths: &NodePaths) -> Renderer {
        let mut renderer = Renderer::new(ResourceMap::build(paths));
        let node = &[
            ("label", "edge-1"),
            ("address", "10.0.0.5"),
            ("mgmt_interface", "br-mgmt"),
            ("mtu", "9000"),
        ];
        renderer.register(paths.hostname_conf(), vec![Box::new(StaticContext::with(node))]);
        renderer.register(paths.hosts_conf(), vec![Box::new(StaticContext::with(node))]);
        renderer.register(
            paths.agent_conf(),
            vec![
                Box::new(StaticContext::with(node)),
                Box::new(StaticContext::with(&[
                    ("director_ips", "10.0.0.2,10.0.0.3"),
                    ("virtual_ip", "10.0.0.250"),
                ])),
            ],
        );
        renderer.register(paths.ifcs_conf(), vec![Box::new(StaticContext::with(node))]);
        renderer
    }

    #[test]
    fn test_first_pass_writes_everything() {
        let dir = tempdir().unwrap();
        let paths = NodePaths::with_root(dir.path());
        let results = test_renderer(&paths).render_all().unwrap();
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.rendered && r.changed));
        assert_eq!(
            fs::read_to_string(paths.hostname_conf()).unwrap(),
            "edge-1\n"
        );
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let dir = tempdir().unwrap();
        let paths = NodePaths::with_root(dir.path());
        let renderer = test_renderer(&paths);
        renderer.render_all().unwrap();
        let second = renderer.render_all().unwrap();
        assert!(second.iter().all(|r| !r.changed));
    }

    #[test]
    fn test_changed_context_rewrites_only_that_file() {
        let dir = tempdir().unwrap();
        let paths = NodePaths::with_root(dir.path());
        test_renderer(&paths).render_all().unwrap();

        let mut renderer = test_renderer(&paths);
        renderer.register(
            paths.hostname_conf(),
            vec![Box::new(StaticContext::with(&[("label", "edge-2")]))],
        );
        let results = renderer.render_all().unwrap();
        let changed: Vec<_> = results.iter().filter(|r| r.changed).collect();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].path, paths.hostname_conf());
    }

    #[test]
    fn test_unknown_path_is_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let paths = NodePaths::with_root(dir.path());
        let mut renderer = test_renderer(&paths);
        renderer.register(dir.path().join("mystery.cfg"), Vec::new());
        let results = renderer.render_all().unwrap();
        let skipped = results.iter().find(|r| r.path.ends_with("mystery.cfg")).unwrap();
        assert!(!skipped.rendered);
        assert!(!skipped.changed);
    }

    #[test]
    fn test_fatal_context_aborts_before_any_write() {
        #[derive(Debug)]
        struct FailingContext;
        impl crate::render::ContextProvider for FailingContext {
            fn produce(&self) -> Result<crate::render::ContextMap> {
                anyhow::bail!("hook tool unavailable")
            }
        }

        let dir = tempdir().unwrap();
        let paths = NodePaths::with_root(dir.path());
        let mut renderer = test_renderer(&paths);
        // Failure on the last entry must still leave the first unwritten
        renderer.register(paths.ifcs_conf(), vec![Box::new(FailingContext)]);
        assert!(renderer.render_all().is_err());
        assert!(!paths.hostname_conf().exists());
    }

    #[test]
    fn test_write_if_changed_reports_content_diff() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("sub/out.conf");
        assert!(write_if_changed(&file, "a\n").unwrap());
        assert!(!write_if_changed(&file, "a\n").unwrap());
        assert!(write_if_changed(&file, "b\n").unwrap());
    }
}
