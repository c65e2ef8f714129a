//! Deployment collaborator boundary.
//!
//! The core never talks to a lab backend itself. This module defines what it
//! expects from one (a lab status accessor), a file-backed accessor for
//! offline use, and the node/link plan a backend client would create.

pub mod plan;
pub mod status;

use serde::{Deserialize, Serialize};

pub use plan::{build_plan, select_node_definition, DeploymentPlan, PlannedLink, PlannedNode};
pub use status::FileStatusSource;

/// The backend could not be reached or answered with something unusable
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Lab backend unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed lab status: {0}")]
    MalformedStatus(#[from] serde_json::Error),
}

/// Lab state as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabStatus {
    #[serde(default)]
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub running_nodes: Vec<String>,
}

/// Source of live lab status. Calls block; timeouts and retries belong to
/// the implementation.
pub trait LabStatusSource {
    fn lab_status(&self) -> Result<LabStatus, ServiceError>;
}
