//! # Netbuilder - network topology builder for lab environments
//!
//! This library turns a loosely specified network intent (free text or a
//! standard template) into a fully addressed, protocol-configured topology,
//! and checks that topology for internal consistency before and after it is
//! brought up in a lab.
//!
//! ## Overview
//!
//! Data flows strictly one way: text/template → draft topology → addressed
//! topology → configured topology → findings. Every stage is deterministic,
//! so the same input always produces the same subnets, addresses and
//! configuration text.
//!
//! ## Key Features
//!
//! - **Intent Resolution**: Ordered structural matcher table with entity extraction and a template fallback
//! - **Templates**: Ring, star, mesh and bus shapes, site layouts and a VXLAN multi-site design
//! - **Addressing**: Point-to-point subnets in link order, VTEP loopbacks and VNI sets
//! - **Configuration**: OSPF, EIGRP, BGP and static routing text per router
//! - **Validation**: Six consistency rules plus a lab health check
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `topology`: Data model, template generators and saved-model persistence
//! - `intent`: Free-text resolver and the lightweight pattern detector
//! - `ip`: Subnet, interface, loopback and VNI allocation
//! - `synthesis`: Routing protocol configuration text
//! - `validation`: Rule-based findings and the health check
//! - `deploy`: Lab status accessor and deployment plan
//! - `config`: Type-safe configuration structures
//! - `config_loader`: Configuration file loading
//! - `orchestrator`: The end-to-end pipeline
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use netbuilder::{config::Config, orchestrator};
//!
//! let report = orchestrator::build_from_text("4 sites in a ring topology", None, &Config::default())?;
//! for finding in &report.findings {
//!     println!("{}", finding);
//! }
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Configuration Format
//!
//! All sections are optional; absent values fall back to the defaults below.
//!
//! ```yaml
//! addressing:
//!   base_network: 10.0.0.0/8
//!   subnet_prefix: 30
//!   loopback_pool: 192.168.100.0/24
//! overlay:
//!   vtep_marker: VTEP
//!   l2vni_base: 10000
//!   l3vni: 50000
//! protocols:
//!   ospf_process_id: 1
//!   ospf_area: 0
//!   eigrp_as: 100
//!   bgp_asn: 65000
//! synthesis:
//!   interface_stanzas: false
//! ```
//!
//! ## Error Handling
//!
//! Domain errors are `thiserror` enums per module. The orchestrator and the
//! binary use `color_eyre` for error reporting with context. Validation
//! findings are values, never errors.

pub mod config;
pub mod config_loader;

pub mod topology;
pub mod intent;
pub mod ip;
pub mod synthesis;
pub mod validation;
pub mod deploy;
pub mod orchestrator;
