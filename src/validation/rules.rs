//! Topology consistency rules.
//!
//! Six independent checks run in a fixed order; none short-circuits another.

use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::LazyLock;

use ipnet::Ipv4Net;
use log::{debug, info};
use regex::Regex;

use super::Finding;
use crate::topology::types::{LinkType, Topology};

static TRUNK_PORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)interface ([^\n]*)\n.*?switchport mode trunk").unwrap());
static OSPF_NETWORK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"network \d+\.\d+\.\d+\.\d+ \d+\.\d+\.\d+\.\d+ area \d+").unwrap());
static BGP_NEIGHBOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"neighbor \d+\.\d+\.\d+\.\d+ remote-as \d+").unwrap());

/// Run every rule and collect findings in rule order
pub fn validate_topology(topology: &Topology) -> Vec<Finding> {
    let mut findings = Vec::new();
    check_duplicate_ips(topology, &mut findings);
    check_duplicate_device_names(topology, &mut findings);
    check_missing_routes(topology, &mut findings);
    check_vlan_trunks(topology, &mut findings);
    check_interfaces_enabled(topology, &mut findings);
    check_protocol_completeness(topology, &mut findings);
    info!("Validation produced {} findings", findings.len());
    findings
}

/// One error per address held by two or more device/interface pairs
pub fn check_duplicate_ips(topology: &Topology, findings: &mut Vec<Finding>) {
    let mut order: Vec<Ipv4Addr> = Vec::new();
    let mut owners: HashMap<Ipv4Addr, Vec<String>> = HashMap::new();

    for device in &topology.devices {
        for iface in &device.interfaces {
            let owner = format!("{}:{}", device.name, iface.name);
            let entry = owners.entry(iface.ip).or_insert_with(|| {
                order.push(iface.ip);
                Vec::new()
            });
            if !entry.contains(&owner) {
                entry.push(owner);
            }
        }
    }

    for ip in order {
        let locations = &owners[&ip];
        if locations.len() > 1 {
            findings.push(Finding::error(
                "IP Address",
                format!("Duplicate IP address {} found on: {}", ip, locations.join(", ")),
            ));
        }
    }
}

/// One error per name that appears more than once
pub fn check_duplicate_device_names(topology: &Topology, findings: &mut Vec<Finding>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for device in &topology.devices {
        let name = device.name.as_str();
        if !seen.insert(name) && reported.insert(name) {
            findings.push(Finding::error("Device Name", format!("Duplicate device name found: {}", name)));
        }
    }
}

/// Routing processes declared in a config, in `OSPF`, `EIGRP`, `BGP` order
fn routing_processes(config: &str) -> Vec<&'static str> {
    [("router ospf", "OSPF"), ("router eigrp", "EIGRP"), ("router bgp", "BGP")]
        .iter()
        .filter(|(marker, _)| config.lines().any(|line| line.starts_with(marker)))
        .map(|(_, label)| *label)
        .collect()
}

/// A `network` statement: its address and, when the statement carries a
/// CIDR suffix, an OSPF wildcard or a BGP `mask`, the prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Advertised {
    address: Ipv4Addr,
    prefix: Option<u8>,
}

impl Advertised {
    fn covers(&self, net: &Ipv4Net) -> bool {
        self.address == net.network() && self.prefix.map_or(true, |p| p == net.prefix_len())
    }
}

fn prefix_from_mask(address: Ipv4Addr, mask: Ipv4Addr) -> Option<u8> {
    Ipv4Net::with_netmask(address, mask).ok().map(|n| n.prefix_len())
}

fn parse_network_statement(line: &str) -> Option<Advertised> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.first() != Some(&"network") {
        return None;
    }
    let target = *tokens.get(1)?;

    if let Some((addr, len)) = target.split_once('/') {
        return Some(Advertised {
            address: addr.parse().ok()?,
            prefix: Some(len.parse().ok()?),
        });
    }

    let address: Ipv4Addr = target.parse().ok()?;
    let prefix = match tokens.get(2..4) {
        Some(["mask", mask]) => Some(prefix_from_mask(address, mask.parse().ok()?)?),
        _ => match tokens.get(2).map(|t| t.parse::<Ipv4Addr>()) {
            Some(Ok(wildcard)) => Some(prefix_from_mask(address, Ipv4Addr::from(!u32::from(wildcard)))?),
            _ => None,
        },
    };
    Some(Advertised { address, prefix })
}

/// Every parseable `network` statement in a config
fn advertised_networks(config: &str) -> Vec<Advertised> {
    config.lines().filter_map(parse_network_statement).collect()
}

/// Warn when a routed interface's subnet has no matching `network` statement
pub fn check_missing_routes(topology: &Topology, findings: &mut Vec<Finding>) {
    for device in topology.devices.iter().filter(|d| d.device_type.is_router()) {
        let processes = routing_processes(&device.config);
        let Some(protocol) = processes.first() else {
            continue;
        };
        let advertised = advertised_networks(&device.config);

        for iface in device.interfaces.iter().filter(|i| !i.is_loopback) {
            let Ok(net) = Ipv4Net::with_netmask(iface.ip, iface.mask) else {
                debug!("Skipping route check for {}:{} (bad mask)", device.name, iface.name);
                continue;
            };
            let net = net.trunc();
            if !advertised.iter().any(|a| a.covers(&net)) {
                findings.push(Finding::warning(
                    "Routing",
                    format!("Device {} has {} enabled but network {} is not advertised", device.name, protocol, net),
                ));
            }
        }
    }
}

/// Advisory note for switches on ethernet links that declare a trunk port.
/// VLAN sets are not compared across the link.
pub fn check_vlan_trunks(topology: &Topology, findings: &mut Vec<Finding>) {
    for link in topology.links.iter().filter(|l| l.link_type == LinkType::Ethernet) {
        for endpoint in &link.endpoints {
            let Some(device) = topology.device(endpoint) else { continue };
            if !device.device_type.is_switch() {
                continue;
            }
            if let Some(caps) = TRUNK_PORT.captures(&device.config) {
                findings.push(Finding::info(
                    "VLAN",
                    format!(
                        "Trunk port {} on {} should have consistent VLANs with connected switch",
                        caps[1].trim(),
                        device.name
                    ),
                ));
            }
        }
    }
}

/// Whether the `interface <name>` stanza in `config` contains `no shutdown`
pub fn interface_enabled(config: &str, name: &str) -> bool {
    let mut in_stanza = false;
    for line in config.lines() {
        if let Some(rest) = line.strip_prefix("interface ") {
            in_stanza = rest.trim() == name;
        } else if !line.starts_with([' ', '\t']) {
            in_stanza = false;
        } else if in_stanza && line.trim() == "no shutdown" {
            return true;
        }
    }
    false
}

/// Warn for every linked interface whose stanza lacks `no shutdown`
pub fn check_interfaces_enabled(topology: &Topology, findings: &mut Vec<Finding>) {
    for device in &topology.devices {
        for iface in device.linked_interfaces() {
            if !interface_enabled(&device.config, &iface.name) {
                findings.push(Finding::warning(
                    "Interface",
                    format!("Interface {} on {} is not enabled (no shutdown missing)", iface.name, device.name),
                ));
            }
        }
    }
}

/// OSPF without network statements, BGP without neighbors
pub fn check_protocol_completeness(topology: &Topology, findings: &mut Vec<Finding>) {
    for device in &topology.devices {
        let processes = routing_processes(&device.config);
        if processes.contains(&"OSPF") && !OSPF_NETWORK.is_match(&device.config) {
            findings.push(Finding::warning(
                "OSPF",
                format!("Device {} has OSPF enabled but no networks are configured", device.name),
            ));
        }
        if processes.contains(&"BGP") && !BGP_NEIGHBOR.is_match(&device.config) {
            findings.push(Finding::warning(
                "BGP",
                format!("Device {} has BGP enabled but no neighbors are configured", device.name),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::types::{Device, DeviceType, Interface, Link};
    use crate::validation::Severity;

    fn mask30() -> Ipv4Addr {
        Ipv4Addr::new(255, 255, 255, 252)
    }

    fn pair() -> Topology {
        let mut topology = Topology::new(
            vec![Device::new("R1", DeviceType::Router), Device::new("R2", DeviceType::Router)],
            vec![Link::ethernet("R1", "R2")],
        );
        topology.devices[0]
            .interfaces
            .push(Interface::physical("GigabitEthernet0/0", Ipv4Addr::new(10, 0, 0, 1), mask30(), "R2"));
        topology.devices[1]
            .interfaces
            .push(Interface::physical("GigabitEthernet0/0", Ipv4Addr::new(10, 0, 0, 2), mask30(), "R1"));
        topology
    }

    #[test]
    fn test_duplicate_ip_names_both_owners() {
        let mut topology = pair();
        topology.devices[1].interfaces[0].ip = Ipv4Addr::new(10, 0, 0, 1);
        let mut findings = Vec::new();
        check_duplicate_ips(&topology, &mut findings);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(
            findings[0].message,
            "Duplicate IP address 10.0.0.1 found on: R1:GigabitEthernet0/0, R2:GigabitEthernet0/0"
        );
    }

    #[test]
    fn test_duplicate_names_once_per_name() {
        let topology = Topology::new(
            vec![
                Device::new("R1", DeviceType::Router),
                Device::new("R1", DeviceType::Router),
                Device::new("R1", DeviceType::Router),
                Device::new("S1", DeviceType::Switch),
            ],
            Vec::new(),
        );
        let mut findings = Vec::new();
        check_duplicate_device_names(&topology, &mut findings);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Duplicate device name found: R1");
    }

    #[test]
    fn test_missing_route() {
        let mut topology = pair();
        topology.devices[0].config = "hostname R1\n\nrouter ospf 1\n network 10.9.9.0 0.0.0.3 area 0".to_string();
        topology.devices[1].config = "hostname R2\n\nrouter eigrp 100\n network 10.0.0.0\n no auto-summary".to_string();
        let mut findings = Vec::new();
        check_missing_routes(&topology, &mut findings);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "Device R1 has OSPF enabled but network 10.0.0.0/30 is not advertised"
        );
    }

    #[test]
    fn test_network_statement_prefix_must_match() {
        let mut topology = pair();
        // Right address, wrong wildcard
        topology.devices[0].config = "hostname R1\n\nrouter ospf 1\n network 10.0.0.0 0.0.0.255 area 0".to_string();
        // Right address, wrong mask
        topology.devices[1].config =
            "hostname R2\n\nrouter bgp 65000\n network 10.0.0.0 mask 255.255.255.0".to_string();
        let mut findings = Vec::new();
        check_missing_routes(&topology, &mut findings);
        assert_eq!(findings.len(), 2);
        assert!(findings[1].message.starts_with("Device R2 has BGP enabled"));

        topology.devices[0].config = "hostname R1\n\nrouter ospf 1\n network 10.0.0.0 0.0.0.3 area 0".to_string();
        topology.devices[1].config =
            "hostname R2\n\nrouter bgp 65000\n network 10.0.0.0 mask 255.255.255.252".to_string();
        let mut findings = Vec::new();
        check_missing_routes(&topology, &mut findings);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_network_statement_forms() {
        assert_eq!(
            parse_network_statement(" network 10.0.0.4/30"),
            Some(Advertised { address: Ipv4Addr::new(10, 0, 0, 4), prefix: Some(30) })
        );
        assert_eq!(
            parse_network_statement(" network 10.0.0.0"),
            Some(Advertised { address: Ipv4Addr::new(10, 0, 0, 0), prefix: None })
        );
        assert_eq!(parse_network_statement(" network 10.0.0.0/30 area 0").map(|a| a.prefix), Some(Some(30)));
        assert_eq!(parse_network_statement(" neighbor 10.0.0.2 remote-as 65001"), None);
    }

    #[test]
    fn test_trunk_note_is_advisory() {
        let mut topology = Topology::new(
            vec![Device::new("SW1", DeviceType::Switch), Device::new("SW2", DeviceType::Switch)],
            vec![Link::ethernet("SW1", "SW2")],
        );
        topology.devices[0].config =
            "hostname SW1\ninterface GigabitEthernet0/1\n switchport mode trunk\n no shutdown".to_string();
        let mut findings = Vec::new();
        check_vlan_trunks(&topology, &mut findings);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
        assert!(findings[0].message.starts_with("Trunk port GigabitEthernet0/1 on SW1"));
    }

    #[test]
    fn test_interface_enabled_is_per_stanza() {
        let config = "interface Gi0/0\n ip address 10.0.0.1 255.255.255.252\n no shutdown\ninterface Gi0/1\n shutdown\n";
        assert!(interface_enabled(config, "Gi0/0"));
        assert!(!interface_enabled(config, "Gi0/1"));
        assert!(!interface_enabled("no shutdown", "Gi0/0"));
    }

    #[test]
    fn test_interface_down_warnings() {
        let mut topology = pair();
        topology.devices[0].config =
            "hostname R1\ninterface GigabitEthernet0/0\n no shutdown".to_string();
        let mut findings = Vec::new();
        check_interfaces_enabled(&topology, &mut findings);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "Interface GigabitEthernet0/0 on R2 is not enabled (no shutdown missing)"
        );
    }

    #[test]
    fn test_protocol_completeness() {
        let mut topology = pair();
        topology.devices[0].config = "router ospf 1".to_string();
        topology.devices[1].config =
            "router bgp 65000\n network 10.0.0.0 mask 255.255.255.252".to_string();
        let mut findings = Vec::new();
        check_protocol_completeness(&topology, &mut findings);
        let categories: Vec<_> = findings.iter().map(|f| f.category.as_str()).collect();
        assert_eq!(categories, vec!["OSPF", "BGP"]);
    }

    #[test]
    fn test_rule_order() {
        let mut topology = pair();
        topology.devices[1].interfaces[0].ip = Ipv4Addr::new(10, 0, 0, 1);
        topology.devices.push(Device::new("R1", DeviceType::Router));
        let findings = validate_topology(&topology);
        let categories: Vec<_> = findings.iter().map(|f| f.category.as_str()).collect();
        assert_eq!(categories, vec!["IP Address", "Device Name", "Interface", "Interface"]);
    }
}
