//! Deployment plan: the nodes, positions, configs and links a lab backend
//! client should create for a finished topology.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::topology::types::{Device, DeviceType, LinkType, Topology};

/// Node definition able to run VXLAN/EVPN configuration
pub const OVERLAY_NODE_DEFINITION: &str = "nxosv9000";

/// Config line keywords only the overlay-capable image understands
const OVERLAY_KEYWORDS: &[&str] = &["vxlan", "evpn", "nve", "vn-segment", "l2vpn", "l3vni"];

const ROUTER_DEFINITIONS: &[(usize, &str)] = &[(4, "iosv"), (10, "csr1000v")];
const SWITCH_DEFINITIONS: &[(usize, &str)] = &[(8, "iosvl2"), (32, "nxosv9000")];

const GRID_ORIGIN: (i32, i32) = (100, 100);
const GRID_STEP: i32 = 200;
const NODES_PER_ROW: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedNode {
    pub label: String,
    pub node_definition: String,
    pub x: i32,
    pub y: i32,
    pub config: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedLink {
    pub a: String,
    pub b: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    pub nodes: Vec<PlannedNode>,
    pub links: Vec<PlannedLink>,
    /// Nodes carrying overlay config on an image that cannot run it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

fn smallest_fit(table: &[(usize, &'static str)], interfaces: usize, fallback: &'static str) -> String {
    table
        .iter()
        .find(|(max, _)| interfaces <= *max)
        .map_or(fallback, |(_, name)| *name)
        .to_string()
}

/// Pick an image for a device type with `interfaces` physical ports
pub fn select_node_definition(device_type: &DeviceType, interfaces: usize) -> String {
    match device_type {
        DeviceType::Router => smallest_fit(ROUTER_DEFINITIONS, interfaces, "csr1000v"),
        DeviceType::Switch => smallest_fit(SWITCH_DEFINITIONS, interfaces, OVERLAY_NODE_DEFINITION),
        DeviceType::Server | DeviceType::ExtServer => "ubuntu".to_string(),
        DeviceType::Other(label) if label == "alpine" || label == "win10-desktop" => "ubuntu".to_string(),
        DeviceType::Firewall => "asav".to_string(),
        DeviceType::Other(label) => label.clone(),
    }
}

fn carries_overlay_config(config: &str) -> bool {
    let lower = config.to_lowercase();
    lower.contains("vxlan") || lower.contains("evpn")
}

/// Drop lines mentioning any overlay keyword
pub fn strip_overlay_lines(config: &str) -> String {
    config
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            !OVERLAY_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Grid position of the `index`th node
pub fn grid_position(index: usize) -> (i32, i32) {
    let column = (index % NODES_PER_ROW) as i32;
    let row = (index / NODES_PER_ROW) as i32;
    (GRID_ORIGIN.0 + column * GRID_STEP, GRID_ORIGIN.1 + row * GRID_STEP)
}

fn physical_degree(topology: &Topology, device: &Device) -> usize {
    topology
        .links
        .iter()
        .filter(|link| !link.is_overlay && link.touches(&device.name))
        .count()
}

/// Lay out nodes in device order and list every physical link
pub fn build_plan(topology: &Topology) -> DeploymentPlan {
    let mut unsupported = Vec::new();

    let nodes: Vec<PlannedNode> = topology
        .devices
        .iter()
        .enumerate()
        .map(|(index, device)| {
            let node_definition = device
                .node_definition
                .clone()
                .unwrap_or_else(|| select_node_definition(&device.device_type, physical_degree(topology, device)));

            let mut config = if device.config.is_empty() {
                format!("hostname {}", device.name)
            } else {
                device.config.clone()
            };
            if node_definition != OVERLAY_NODE_DEFINITION {
                if carries_overlay_config(&config) {
                    unsupported.push(device.name.clone());
                }
                config = strip_overlay_lines(&config);
            }

            let (x, y) = grid_position(index);
            PlannedNode {
                label: device.name.clone(),
                node_definition,
                x,
                y,
                config,
            }
        })
        .collect();

    let links: Vec<PlannedLink> = topology
        .links
        .iter()
        .filter(|link| !link.is_overlay && link.link_type != LinkType::Vxlan)
        .map(|link| PlannedLink {
            a: link.endpoints[0].clone(),
            b: link.endpoints[1].clone(),
        })
        .collect();

    let warning = if unsupported.is_empty() {
        None
    } else {
        let message = format!(
            "The following nodes have VXLAN/EVPN config but are not {} and may not work in the lab: {}",
            OVERLAY_NODE_DEFINITION,
            unsupported.join(", ")
        );
        warn!("{}", message);
        Some(message)
    };

    info!("Deployment plan: {} nodes, {} links", nodes.len(), links.len());
    DeploymentPlan { nodes, links, warning }
}
