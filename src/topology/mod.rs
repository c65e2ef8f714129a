//! Network topology module.
//!
//! This module contains the topology data model, the deterministic template
//! generators for standard shapes, and the saved-model codec.

pub mod types;
pub mod template;
pub mod store;

// Re-export key types and functions for easier access
pub use types::{Device, DeviceType, Interface, Link, LinkType, Protocol, Topology, TopologyError, VxlanConfig};
pub use template::{create_template_topology, router_mesh, site_topology, vxlan_multisite, Shape, SiteWiring};
pub use store::{load_model, parse_model, save_model, StoreError};
