//! Thin wrappers around the node's external collaborators: the package
//! manager, the service manager, kernel module control and network
//! introspection. Each module exposes only the contract the hooks need.

pub mod kernel;
pub mod network;
pub mod packages;
pub mod service;
