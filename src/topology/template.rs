//! Template topology generators.
//!
//! Deterministic builders for the standard shapes (ring, star, mesh,
//! bus/line), the router+switch "site" layouts used by the intent resolver,
//! and the VXLAN multi-site data centre layout. Identical inputs always yield
//! identical device and link ordering, which downstream address allocation
//! relies on.

use std::fmt;
use std::str::FromStr;

use log::debug;

use super::types::{Device, DeviceType, Link, LinkType, Protocol, Topology, TopologyError};

/// Standard topology shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Simple cycle
    Ring,
    /// Device 1 is the hub
    Star,
    /// Every pair connected
    Mesh,
    /// Chain, also accepted as `line`
    Bus,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ring => "ring",
            Self::Star => "star",
            Self::Mesh => "mesh",
            Self::Bus => "bus",
        }
    }
}

impl FromStr for Shape {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ring" => Ok(Self::Ring),
            "star" => Ok(Self::Star),
            "mesh" => Ok(Self::Mesh),
            "bus" | "line" => Ok(Self::Bus),
            other => Err(TopologyError::UnknownShape(other.to_string())),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index pairs (0-based) connected by a shape over `n` devices
fn shape_edges(shape: Shape, n: usize) -> Vec<(usize, usize)> {
    match shape {
        Shape::Ring => (0..n).map(|i| (i, (i + 1) % n)).collect(),
        Shape::Star => (1..n).map(|i| (0, i)).collect(),
        Shape::Mesh => (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect(),
        Shape::Bus => (0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect(),
    }
}

/// Generate a standard topology of `count` devices of `device_type`.
///
/// Devices are named `{Type}{1..=count}`; every link is ethernet. A protocol,
/// when given, is attached to the topology rather than to devices.
pub fn create_template_topology(
    shape: Shape,
    count: usize,
    device_type: DeviceType,
    protocol: Option<Protocol>,
) -> Result<Topology, TopologyError> {
    if count < 2 {
        return Err(TopologyError::TooFewDevices {
            shape: shape.to_string(),
            count,
        });
    }

    let prefix = device_type.name_prefix();
    let devices: Vec<Device> = (1..=count)
        .map(|i| Device::new(format!("{}{}", prefix, i), device_type.clone()))
        .collect();

    let links = shape_edges(shape, count)
        .into_iter()
        .map(|(a, b)| Link::ethernet(devices[a].name.clone(), devices[b].name.clone()))
        .collect::<Vec<_>>();

    debug!("Generated {} template: {} devices, {} links", shape, devices.len(), links.len());

    Ok(Topology::new(devices, links).with_protocol(protocol))
}

/// How the routers of a site layout are wired to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteWiring {
    Ring,
    Mesh,
}

/// One router and one switch per site, each switch attached to its site's
/// router, routers wired in a ring or full mesh.
///
/// Per-site router/switch links come first, router interconnects after.
/// A single site has no router interconnect.
pub fn site_topology(sites: usize, wiring: SiteWiring) -> Topology {
    let mut devices = Vec::with_capacity(sites * 2);
    let mut links = Vec::new();

    for i in 1..=sites {
        let router = format!("Router{}", i);
        let switch = format!("SiteSwitch{}", i);
        links.push(Link::ethernet(router.clone(), switch.clone()));
        devices.push(Device::new(router, DeviceType::Router));
        devices.push(Device::new(switch, DeviceType::Switch));
    }

    if sites >= 2 {
        let shape = match wiring {
            SiteWiring::Ring => Shape::Ring,
            SiteWiring::Mesh => Shape::Mesh,
        };
        for (a, b) in shape_edges(shape, sites) {
            links.push(Link::ethernet(format!("Router{}", a + 1), format!("Router{}", b + 1)));
        }
    }

    Topology::new(devices, links)
}

/// Routers only, fully meshed
pub fn router_mesh(count: usize) -> Topology {
    let devices: Vec<Device> = (1..=count)
        .map(|i| Device::new(format!("Router{}", i), DeviceType::Router))
        .collect();
    let links = shape_edges(Shape::Mesh, count)
        .into_iter()
        .map(|(a, b)| Link::ethernet(format!("Router{}", a + 1), format!("Router{}", b + 1)))
        .collect();
    Topology::new(devices, links)
}

/// Base for per-site overlay VNIs in the multi-site layout
const MULTISITE_VNI_BASE: u32 = 10000;

/// VXLAN multi-site design: a main data centre plus `num_sites - 1` branch sites.
///
/// The data centre has a border router, two spines, two VTEP leaves and two
/// servers. Each branch has a router, a VTEP switch and a server, a WAN link
/// to the border router (`internet` or plain `ethernet`) and an overlay link
/// from `DC_Leaf1_VTEP` carrying VNI `10000 + site`. Control plane is BGP.
pub fn vxlan_multisite(num_sites: usize, internet_connected: bool) -> Topology {
    let mut devices = vec![
        Device::new("DC_Border_Router", DeviceType::Router),
        Device::new("DC_Spine1", DeviceType::Switch),
        Device::new("DC_Spine2", DeviceType::Switch),
        Device::new("DC_Leaf1_VTEP", DeviceType::Switch),
        Device::new("DC_Leaf2_VTEP", DeviceType::Switch),
        Device::new("DC_Server1", DeviceType::Server),
        Device::new("DC_Server2", DeviceType::Server),
    ];

    let mut links = vec![
        Link::ethernet("DC_Border_Router", "DC_Spine1"),
        Link::ethernet("DC_Border_Router", "DC_Spine2"),
        Link::ethernet("DC_Spine1", "DC_Leaf1_VTEP"),
        Link::ethernet("DC_Spine1", "DC_Leaf2_VTEP"),
        Link::ethernet("DC_Spine2", "DC_Leaf1_VTEP"),
        Link::ethernet("DC_Spine2", "DC_Leaf2_VTEP"),
        Link::ethernet("DC_Leaf1_VTEP", "DC_Server1"),
        Link::ethernet("DC_Leaf2_VTEP", "DC_Server2"),
    ];

    let wan_type = if internet_connected { LinkType::Internet } else { LinkType::Ethernet };

    for i in 1..num_sites {
        let router = format!("Site{}_Router", i);
        let switch = format!("Site{}_Switch_VTEP", i);
        let server = format!("Site{}_Server", i);

        links.push(Link::ethernet(router.clone(), switch.clone()));
        links.push(Link::ethernet(switch.clone(), server.clone()));
        links.push(Link::new("DC_Border_Router", router.clone(), wan_type.clone()));
        links.push(Link::overlay("DC_Leaf1_VTEP", switch.clone(), MULTISITE_VNI_BASE + i as u32));

        devices.push(Device::new(router, DeviceType::Router));
        devices.push(Device::new(switch, DeviceType::Switch));
        devices.push(Device::new(server, DeviceType::Server));
    }

    Topology::new(devices, links).with_protocol(Some(Protocol::Bgp))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_all_degrees(topology: &Topology, expected: usize) {
        for device in &topology.devices {
            assert_eq!(topology.degree(&device.name), expected, "degree of {}", device.name);
        }
    }

    #[test]
    fn test_ring_is_single_cycle() {
        for n in 3..=8 {
            let topology = create_template_topology(Shape::Ring, n, DeviceType::Router, None).unwrap();
            assert_eq!(topology.devices.len(), n);
            assert_eq!(topology.links.len(), n);
            assert_all_degrees(&topology, 2);
            assert_eq!(topology.links.last().unwrap().endpoints, [format!("Router{}", n), "Router1".to_string()]);
        }
    }

    #[test]
    fn test_star_hub_degree() {
        for n in 2..=7 {
            let topology = create_template_topology(Shape::Star, n, DeviceType::Switch, None).unwrap();
            assert_eq!(topology.degree("Switch1"), n - 1);
            for i in 2..=n {
                assert_eq!(topology.degree(&format!("Switch{}", i)), 1);
            }
        }
    }

    #[test]
    fn test_mesh_edge_count() {
        for n in 2..=7 {
            let topology = create_template_topology(Shape::Mesh, n, DeviceType::Router, None).unwrap();
            assert_eq!(topology.links.len(), n * (n - 1) / 2);
            assert_all_degrees(&topology, n - 1);
        }
    }

    #[test]
    fn test_bus_and_line_alias() {
        assert_eq!("line".parse::<Shape>().unwrap(), Shape::Bus);
        let topology = create_template_topology(Shape::Bus, 4, DeviceType::Firewall, None).unwrap();
        assert_eq!(topology.links.len(), 3);
        assert_eq!(topology.devices[0].name, "Firewall1");
        assert_eq!(topology.degree("Firewall1"), 1);
        assert_eq!(topology.degree("Firewall2"), 2);
    }

    #[test]
    fn test_protocol_attached_to_topology() {
        let topology = create_template_topology(Shape::Ring, 3, DeviceType::Router, Some(Protocol::Ospf)).unwrap();
        assert_eq!(topology.protocol, Some(Protocol::Ospf));
        assert!(topology.devices.iter().all(|d| d.config.is_empty()));
        assert!(topology.links.iter().all(|l| l.link_type == LinkType::Ethernet));
    }

    #[test]
    fn test_too_few_devices() {
        assert!(create_template_topology(Shape::Ring, 1, DeviceType::Router, None).is_err());
        assert!("hexagon".parse::<Shape>().is_err());
    }

    #[test]
    fn test_deterministic() {
        let a = create_template_topology(Shape::Mesh, 5, DeviceType::Router, None).unwrap();
        let b = create_template_topology(Shape::Mesh, 5, DeviceType::Router, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_site_ring_layout() {
        let topology = site_topology(4, SiteWiring::Ring);
        assert_eq!(topology.devices.len(), 8);
        assert_eq!(topology.links.len(), 8);
        assert_eq!(topology.links[0].endpoints, ["Router1".to_string(), "SiteSwitch1".to_string()]);
        assert_eq!(topology.degree("Router1"), 3);
        assert_eq!(topology.degree("SiteSwitch3"), 1);
        assert!(topology.check_endpoints().is_ok());
    }

    #[test]
    fn test_site_mesh_layout() {
        let topology = site_topology(3, SiteWiring::Mesh);
        assert_eq!(topology.links.len(), 3 + 3);
        assert_eq!(topology.degree("Router2"), 3);
    }

    #[test]
    fn test_single_site_has_no_interconnect() {
        let topology = site_topology(1, SiteWiring::Ring);
        assert_eq!(topology.links.len(), 1);
    }

    #[test]
    fn test_vxlan_multisite() {
        let topology = vxlan_multisite(3, true);
        assert_eq!(topology.devices.len(), 7 + 2 * 3);
        assert_eq!(topology.links.len(), 8 + 2 * 4);
        assert_eq!(topology.protocol, Some(Protocol::Bgp));
        assert!(topology.check_endpoints().is_ok());

        let overlays: Vec<_> = topology.links.iter().filter(|l| l.is_overlay).collect();
        assert_eq!(overlays.len(), 2);
        assert_eq!(overlays[0].vni, Some(10001));
        assert_eq!(overlays[1].vni, Some(10002));

        let wan = topology.links.iter().find(|l| l.touches("Site1_Router") && l.touches("DC_Border_Router")).unwrap();
        assert_eq!(wan.link_type, LinkType::Internet);

        let direct = vxlan_multisite(2, false);
        assert!(direct.links.iter().all(|l| l.link_type != LinkType::Internet));
    }
}
