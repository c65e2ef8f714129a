//! Physical link addressing.
//!
//! Carves point-to-point subnets out of the base block in link declaration
//! order and hands the first two host addresses of each subnet to the link's
//! endpoints. Overlay links never consume a subnet.

use std::net::Ipv4Addr;

use ipnet::{Ipv4Net, PrefixLenError};
use log::{debug, info, warn};

use super::overlay;
use crate::config::{AddressingConfig, OverlayConfig};
use crate::topology::types::{Interface, Topology, TopologyError};

/// Errors that stop allocation before any address is handed out
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("Cannot split {base} into /{prefix} subnets")]
    InvalidPrefix {
        base: Ipv4Net,
        prefix: u8,
        #[source]
        source: PrefixLenError,
    },

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// What the allocator did to a topology
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationReport {
    /// Physical links that received a subnet and two addresses
    pub addressed_links: usize,
    /// Indices of physical links left without addresses
    pub unaddressed_links: Vec<usize>,
    /// The base block ran out before every physical link was addressed
    pub capacity_exceeded: bool,
    pub overlay_enabled: bool,
    /// VTEP loopbacks assigned
    pub loopbacks: usize,
}

/// Name of the `n`th physical interface; one counter is shared by all links
pub fn interface_name(n: usize) -> String {
    format!("GigabitEthernet0/{}", n)
}

/// Assign subnets, interfaces and (for overlay topologies) loopbacks and VNIs.
///
/// Running out of subnets is not an error: the remaining physical links are
/// left unaddressed and listed in the report. Identical topologies and
/// settings always produce identical assignments.
pub fn assign_addresses(
    topology: &mut Topology,
    addressing: &AddressingConfig,
    overlay_config: &OverlayConfig,
) -> Result<AllocationReport, AllocationError> {
    topology.check_endpoints()?;

    let base = addressing.base_network.trunc();
    let mut subnets = base
        .subnets(addressing.subnet_prefix)
        .map_err(|source| AllocationError::InvalidPrefix {
            base,
            prefix: addressing.subnet_prefix,
            source,
        })?;

    let mut report = AllocationReport {
        overlay_enabled: overlay::is_overlay_enabled(topology, &overlay_config.vtep_marker),
        ..Default::default()
    };

    let vteps = if report.overlay_enabled {
        overlay::vtep_devices(topology, &overlay_config.vtep_marker)
    } else {
        Vec::new()
    };
    if report.overlay_enabled {
        report.loopbacks = overlay::assign_loopbacks(topology, &vteps, addressing.loopback_pool);
    }

    let mut interface_counter = 0;
    for index in 0..topology.links.len() {
        if topology.links[index].is_overlay {
            continue;
        }
        if report.capacity_exceeded {
            report.unaddressed_links.push(index);
            continue;
        }

        let Some(subnet) = subnets.next() else {
            warn!(
                "Ran out of /{} subnets in {}: link {} and later links are left unaddressed",
                addressing.subnet_prefix, base, index
            );
            report.capacity_exceeded = true;
            report.unaddressed_links.push(index);
            continue;
        };

        let hosts: Vec<Ipv4Addr> = subnet.hosts().take(2).collect();
        if hosts.len() < 2 {
            warn!("Subnet {} has fewer than two usable hosts, skipping link {}", subnet, index);
            report.unaddressed_links.push(index);
            continue;
        }

        let iface_name = interface_name(interface_counter);
        let endpoints = topology.links[index].endpoints.clone();
        for (side, device_name) in endpoints.iter().enumerate() {
            let peer = &endpoints[1 - side];
            if let Some(device) = topology.devices.iter_mut().find(|d| &d.name == device_name) {
                device
                    .interfaces
                    .push(Interface::physical(iface_name.clone(), hosts[side], subnet.netmask(), peer.clone()));
            }
        }

        let link = &mut topology.links[index];
        link.subnet = Some(subnet.to_string());
        link.ips = hosts;
        debug!("Link {} ({} - {}) -> {}", index, endpoints[0], endpoints[1], subnet);

        interface_counter += 1;
        report.addressed_links += 1;
    }

    if report.overlay_enabled {
        overlay::mark_tunnels(topology);
        overlay::assign_vnis(topology, &vteps, overlay_config);
    }

    info!(
        "Addressed {} links ({} unaddressed), overlay {}",
        report.addressed_links,
        report.unaddressed_links.len(),
        if report.overlay_enabled { "enabled" } else { "disabled" }
    );
    Ok(report)
}
