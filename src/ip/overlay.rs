//! VXLAN overlay allocation: VTEP loopbacks and VNI sets.

use ipnet::Ipv4Net;
use log::{debug, warn};

use crate::config::{OverlayConfig, MAX_VNI};
use crate::topology::types::{Interface, LinkType, Topology, VxlanConfig};

pub const LOOPBACK_NAME: &str = "Loopback0";
pub const LOOPBACK_DESCRIPTION: &str = "VTEP IP for VXLAN";

/// A topology is overlay-enabled when any device name carries the VTEP
/// marker or any link is typed `vxlan`
pub fn is_overlay_enabled(topology: &Topology, marker: &str) -> bool {
    topology.devices.iter().any(|d| d.name.contains(marker))
        || topology.links.iter().any(|l| l.link_type == LinkType::Vxlan)
}

/// Indices of VTEP-marked devices, in device order
pub fn vtep_devices(topology: &Topology, marker: &str) -> Vec<usize> {
    topology
        .devices
        .iter()
        .enumerate()
        .filter(|(_, d)| d.name.contains(marker))
        .map(|(i, _)| i)
        .collect()
}

/// Give each VTEP a host-route loopback from `pool`. Returns the number assigned.
pub fn assign_loopbacks(topology: &mut Topology, vteps: &[usize], pool: Ipv4Net) -> usize {
    let mut hosts = pool.trunc().hosts();
    let mut assigned = 0;
    for &index in vteps {
        let device = &mut topology.devices[index];
        let Some(ip) = hosts.next() else {
            warn!("Loopback pool {} exhausted, {} has no VTEP address", pool, device.name);
            break;
        };
        debug!("VTEP {} loopback {}", device.name, ip);
        device.interfaces.push(Interface::loopback(LOOPBACK_NAME, ip, LOOPBACK_DESCRIPTION));
        assigned += 1;
    }
    assigned
}

/// Flag every overlay link as a VXLAN tunnel
pub fn mark_tunnels(topology: &mut Topology) {
    for link in topology.links.iter_mut().filter(|l| l.is_overlay) {
        link.vxlan_tunnel = true;
    }
}

/// Record L2 VNIs (one per overlay link touching the VTEP) and the shared L3
/// VNI on each VTEP. A link without its own VNI gets `l2vni_base` plus the
/// VTEP's position, saturating at the top of the VNI range. VTEPs on no
/// overlay link get no VXLAN config.
pub fn assign_vnis(topology: &mut Topology, vteps: &[usize], config: &OverlayConfig) {
    for (position, &index) in vteps.iter().enumerate() {
        let name = &topology.devices[index].name;
        let fallback = u32::try_from(position)
            .ok()
            .and_then(|p| config.l2vni_base.checked_add(p))
            .map_or(MAX_VNI, |vni| vni.min(MAX_VNI));
        let l2vnis: Vec<u32> = topology
            .links
            .iter()
            .filter(|l| l.is_overlay && l.touches(name))
            .map(|l| l.vni.unwrap_or(fallback))
            .collect();

        if l2vnis.is_empty() {
            continue;
        }
        topology.devices[index].vxlan_config = Some(VxlanConfig {
            l2vnis,
            l3vni: config.l3vni,
        });
    }
}
