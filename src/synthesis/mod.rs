//! Configuration synthesis module.
//!
//! Appends protocol-specific configuration text to router configs, based on
//! the subnets the allocator recorded on links. Synthesis is purely additive:
//! it never rewrites or removes existing text, so calling it twice on the
//! same topology duplicates every block. Callers that need to re-run it must
//! call [`Topology::reset_configs`] first.

pub mod routing;

use log::{info, warn};

use crate::config::{ProtocolConfig, SynthesisConfig};
use crate::topology::types::{Device, Protocol, Topology};

/// Subnets of every router's links, in device order then link order
pub fn connected_networks(topology: &Topology) -> Vec<(usize, Vec<String>)> {
    topology
        .devices
        .iter()
        .enumerate()
        .filter(|(_, device)| device.device_type.is_router())
        .map(|(index, device)| {
            let networks = topology
                .links
                .iter()
                .filter(|link| link.touches(&device.name))
                .filter_map(|link| link.subnet.clone())
                .collect();
            (index, networks)
        })
        .collect()
}

/// Append a block of lines, seeding an empty config with a hostname
fn append_block(device: &mut Device, lines: &[String]) {
    if device.config.is_empty() {
        device.config = format!("hostname {}\n", device.name);
    }
    device.config.push('\n');
    device.config.push_str(&lines.join("\n"));
}

/// `interface` blocks for every addressed interface of a device
pub fn interface_stanzas(device: &Device) -> Vec<String> {
    let mut lines = Vec::new();
    for iface in &device.interfaces {
        lines.push(format!("interface {}", iface.name));
        if let Some(description) = &iface.description {
            lines.push(format!(" description {}", description));
        }
        lines.push(format!(" ip address {} {}", iface.ip, iface.mask));
        lines.push(" no shutdown".to_string());
    }
    lines
}

/// Append configuration for the topology's requested protocol.
///
/// Returns the number of routers that received a routing block. Without a
/// supported protocol this is a no-op, interface stanzas included.
pub fn generate_device_configs(
    topology: &mut Topology,
    protocols: &ProtocolConfig,
    options: &SynthesisConfig,
) -> usize {
    let Some(protocol) = topology.protocol.clone() else {
        info!("No routing protocol requested, leaving device configs unchanged");
        return 0;
    };
    if matches!(protocol, Protocol::Rip | Protocol::Other(_)) {
        warn!("No configuration template for protocol {}, skipping synthesis", protocol);
        return 0;
    }

    if options.interface_stanzas {
        for device in topology.devices.iter_mut().filter(|d| !d.interfaces.is_empty()) {
            let lines = interface_stanzas(device);
            append_block(device, &lines);
        }
    }

    let mut configured = 0;
    for (index, subnets) in connected_networks(topology) {
        let lines = match protocol {
            Protocol::Ospf => routing::ospf_lines(&subnets, protocols),
            Protocol::Eigrp => routing::eigrp_lines(&subnets, protocols),
            Protocol::Bgp => routing::bgp_lines(topology.devices[index].first_address(), &subnets, protocols),
            _ => {
                let name = &topology.devices[index].name;
                let next_hop = topology
                    .neighbors(name)
                    .first()
                    .and_then(|neighbor| topology.device(neighbor))
                    .and_then(Device::first_address);
                routing::static_lines(next_hop)
            }
        };

        // Dynamic protocols need at least one connected subnet
        let has_body = match protocol {
            Protocol::Static => !lines.is_empty(),
            _ => !subnets.is_empty(),
        };
        if !has_body {
            continue;
        }

        append_block(&mut topology.devices[index], &lines);
        configured += 1;
    }

    info!("Generated {} configuration for {} routers", protocol, configured);
    configured
}
