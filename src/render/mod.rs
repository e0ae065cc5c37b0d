//! Configuration rendering engine.
//!
//! The resource map declares which files the agent owns, which services
//! depend on them and which context providers feed their templates. The
//! renderer walks that map in a fixed order, expands each file's template
//! from the merged provider output and writes only the files whose content
//! actually changed, so repeated render passes converge to a no-op.

pub mod context;
pub mod map;
pub mod renderer;
pub mod template;

pub use context::{ContextMap, ContextProvider, merge_contexts};
pub use map::{ResourceEntry, ResourceMap};
pub use renderer::{RenderResult, Renderer, write_if_changed};
