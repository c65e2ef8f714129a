//! Pipeline orchestrator.
//!
//! This module runs the stages in order on a single owned topology:
//! draft (text or template) → addressing → configuration → findings.
//! Each stage consumes the previous stage's complete output.

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;

use crate::config::Config;
use crate::intent::{resolve_with_fallback, ResolvedVia};
use crate::ip::{assign_addresses, AllocationReport};
use crate::synthesis::generate_device_configs;
use crate::topology::types::{Protocol, Topology};
use crate::validation::{tally, validate_topology, Finding};

/// Everything a pipeline run produced
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub topology: Topology,
    /// How the draft was obtained; `None` for a supplied topology
    pub via: Option<ResolvedVia>,
    pub allocation: AllocationReport,
    /// Routers that received a routing block
    pub configured_routers: usize,
    pub findings: Vec<Finding>,
}

/// Address, configure and validate a draft topology.
///
/// `protocol` overrides the draft's requested protocol when given.
pub fn build_topology(mut topology: Topology, protocol: Option<Protocol>, config: &Config) -> Result<BuildReport> {
    if protocol.is_some() {
        topology.protocol = protocol;
    }
    info!(
        "Building topology: {} devices, {} links, protocol {}",
        topology.devices.len(),
        topology.links.len(),
        topology.protocol.as_ref().map_or("none", Protocol::as_str)
    );

    let allocation = assign_addresses(&mut topology, &config.addressing, &config.overlay)
        .wrap_err("Address allocation failed")?;

    let configured_routers = generate_device_configs(&mut topology, &config.protocols, &config.synthesis);

    let findings = validate_topology(&topology);
    let (errors, warnings, infos) = tally(&findings);
    info!(
        "Build complete: {} errors, {} warnings, {} notes",
        errors, warnings, infos
    );

    Ok(BuildReport {
        topology,
        via: None,
        allocation,
        configured_routers,
        findings,
    })
}

/// Resolve free text (with template fallback) and run the full pipeline
pub fn build_from_text(text: &str, protocol: Option<Protocol>, config: &Config) -> Result<BuildReport> {
    let draft = resolve_with_fallback(text).wrap_err("Could not build a topology from the request")?;
    info!("Draft resolved via {:?}", draft.via);

    let mut report = build_topology(draft.topology, protocol, config)?;
    report.via = Some(draft.via);
    Ok(report)
}
