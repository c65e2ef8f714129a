//! Lab health check.
//!
//! A pure reflection of the state reported by the deployment backend: no
//! local topology comparison is made.

use log::{info, warn};

use super::Finding;
use crate::deploy::{LabStatusSource, ServiceError};

/// Lab state reported by a backend when the lab is up
pub const RUNNING_STATE: &str = "STARTED";

/// Whether a deployment backend is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeployMode {
    /// No backend; designs are built and validated offline
    #[default]
    Design,
    Live,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HealthOutcome {
    /// Design mode: nothing was checked
    Skipped,
    Completed(Vec<Finding>),
}

/// Check the reported lab and node states.
///
/// A lab that is not running yields exactly one error and no node checks.
/// Accessor failures are returned unchanged.
pub fn run_health_checks(source: &dyn LabStatusSource) -> Result<Vec<Finding>, ServiceError> {
    let status = source.lab_status()?;
    info!("Lab '{}' reports state {}", status.title, status.state);

    if status.state != RUNNING_STATE {
        return Ok(vec![Finding::error(
            "Lab Status",
            format!("Lab is not running. Current state: {}", status.state),
        )]);
    }

    let findings: Vec<Finding> = status
        .nodes
        .iter()
        .filter(|node| !status.running_nodes.contains(node))
        .map(|node| Finding::error("Node Status", format!("Node {} is not running", node)))
        .collect();

    if !findings.is_empty() {
        warn!("{} of {} nodes are not running", findings.len(), status.nodes.len());
    }
    Ok(findings)
}

/// Run the health check only when a backend is attached
pub fn health_check(mode: DeployMode, source: &dyn LabStatusSource) -> Result<HealthOutcome, ServiceError> {
    match mode {
        DeployMode::Design => {
            info!("Design mode: skipping lab health checks");
            Ok(HealthOutcome::Skipped)
        }
        DeployMode::Live => run_health_checks(source).map(HealthOutcome::Completed),
    }
}
