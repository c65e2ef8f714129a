//! Topology type definitions.
//!
//! Devices, interfaces and links as they flow through the pipeline. The
//! serde field names match the saved model format exactly (`type`,
//! `endpoints`, `link_type`, ...) so saved templates round-trip.

use std::collections::BTreeSet;
use std::fmt;
use std::net::Ipv4Addr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Structural errors in a topology. These are not validation findings:
/// a topology that triggers one cannot be processed further.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TopologyError {
    #[error("Link {index} references unknown device '{endpoint}'")]
    UnknownEndpoint { index: usize, endpoint: String },

    #[error("A {shape} topology needs at least 2 devices, got {count}")]
    TooFewDevices { shape: String, count: usize },

    #[error("Unknown topology shape '{0}' (expected ring, star, mesh, bus or line)")]
    UnknownShape(String),
}

/// Kind of network device
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceType {
    Router,
    Switch,
    Firewall,
    Server,
    /// External/cloud server
    ExtServer,
    /// Any other node kind, kept verbatim (e.g. `alpine`, `win10-desktop`)
    Other(String),
}

impl DeviceType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Router => "router",
            Self::Switch => "switch",
            Self::Firewall => "firewall",
            Self::Server => "server",
            Self::ExtServer => "ext-server",
            Self::Other(label) => label,
        }
    }

    /// Label used as the prefix of generated device names (`Router`, `Switch`, ...)
    pub fn name_prefix(&self) -> String {
        capitalize(self.as_str())
    }

    pub fn is_router(&self) -> bool {
        matches!(self, Self::Router)
    }

    pub fn is_switch(&self) -> bool {
        matches!(self, Self::Switch)
    }
}

impl From<&str> for DeviceType {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "router" => Self::Router,
            "switch" => Self::Switch,
            "firewall" => Self::Firewall,
            "server" => Self::Server,
            "ext-server" | "external-server" | "external server" => Self::ExtServer,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for DeviceType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<DeviceType> for String {
    fn from(value: DeviceType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of link between two devices
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LinkType {
    #[default]
    Ethernet,
    Serial,
    Wireless,
    Vxlan,
    Internet,
    Other(String),
}

impl LinkType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ethernet => "ethernet",
            Self::Serial => "serial",
            Self::Wireless => "wireless",
            Self::Vxlan => "vxlan",
            Self::Internet => "internet",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for LinkType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "ethernet" => Self::Ethernet,
            "serial" => Self::Serial,
            "wireless" => Self::Wireless,
            "vxlan" => Self::Vxlan,
            "internet" => Self::Internet,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<LinkType> for String {
    fn from(value: LinkType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested routing protocol, serialized in upper case (`OSPF`, `BGP`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Protocol {
    Ospf,
    Eigrp,
    Bgp,
    Static,
    Rip,
    /// Unrecognised protocol word; carried through but never synthesized
    Other(String),
}

impl Protocol {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ospf => "OSPF",
            Self::Eigrp => "EIGRP",
            Self::Bgp => "BGP",
            Self::Static => "STATIC",
            Self::Rip => "RIP",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for Protocol {
    fn from(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "OSPF" => Self::Ospf,
            "EIGRP" => Self::Eigrp,
            "BGP" => Self::Bgp,
            "STATIC" => Self::Static,
            "RIP" => Self::Rip,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Protocol {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Protocol> for String {
    fn from(value: Protocol) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An addressed interface, owned by its device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub ip: Ipv4Addr,
    pub mask: Ipv4Addr,
    /// Peer device on the other end of the link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_loopback: bool,
}

impl Interface {
    /// Physical interface facing `peer`
    pub fn physical(name: impl Into<String>, ip: Ipv4Addr, mask: Ipv4Addr, peer: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip,
            mask,
            link_to: Some(peer.into()),
            description: None,
            is_loopback: false,
        }
    }

    /// Host-route loopback interface
    pub fn loopback(name: impl Into<String>, ip: Ipv4Addr, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip,
            mask: Ipv4Addr::new(255, 255, 255, 255),
            link_to: None,
            description: Some(description.into()),
            is_loopback: true,
        }
    }
}

/// Overlay identifiers recorded on a VTEP device by the allocator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VxlanConfig {
    /// Broadcast-domain (L2) VNIs
    pub l2vnis: Vec<u32>,
    /// Shared routing (L3) VNI
    pub l3vni: u32,
}

/// A network device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    /// Image/profile hint for the lab backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_definition: Option<String>,
    /// Accumulated configuration text
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub config: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<Interface>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vxlan_config: Option<VxlanConfig>,
}

impl Device {
    pub fn new(name: impl Into<String>, device_type: DeviceType) -> Self {
        Self {
            name: name.into(),
            device_type,
            node_definition: None,
            config: String::new(),
            interfaces: Vec::new(),
            vxlan_config: None,
        }
    }

    /// First interface carrying an address, in interface order
    pub fn first_address(&self) -> Option<Ipv4Addr> {
        self.interfaces.first().map(|iface| iface.ip)
    }

    /// Interfaces attached to a link (loopbacks excluded)
    pub fn linked_interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter().filter(|iface| !iface.is_loopback && iface.link_to.is_some())
    }
}

/// A link between two devices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub endpoints: [String; 2],
    #[serde(default)]
    pub link_type: LinkType,
    /// Logical tunnel rather than a physical connection
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_overlay: bool,
    /// Allocated subnet in CIDR notation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    /// Host addresses handed to the two endpoints, in endpoint order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ips: Vec<Ipv4Addr>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub vxlan_tunnel: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vni: Option<u32>,
}

impl Link {
    pub fn new(a: impl Into<String>, b: impl Into<String>, link_type: LinkType) -> Self {
        Self {
            endpoints: [a.into(), b.into()],
            link_type,
            is_overlay: false,
            subnet: None,
            ips: Vec::new(),
            vxlan_tunnel: false,
            vni: None,
        }
    }

    pub fn ethernet(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(a, b, LinkType::Ethernet)
    }

    /// Overlay (VXLAN) link carrying `vni`
    pub fn overlay(a: impl Into<String>, b: impl Into<String>, vni: u32) -> Self {
        let mut link = Self::new(a, b, LinkType::Vxlan);
        link.is_overlay = true;
        link.vni = Some(vni);
        link
    }

    pub fn touches(&self, device: &str) -> bool {
        self.endpoints.iter().any(|e| e == device)
    }

    /// The endpoint opposite to `device`, if `device` is on this link
    pub fn peer_of(&self, device: &str) -> Option<&str> {
        if self.endpoints[0] == device {
            Some(&self.endpoints[1])
        } else if self.endpoints[1] == device {
            Some(&self.endpoints[0])
        } else {
            None
        }
    }
}

/// Root of a network design: devices, links and design-wide options
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Topology {
    pub devices: Vec<Device>,
    pub links: Vec<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty", deserialize_with = "deserialize_vlans")]
    pub vlans: BTreeSet<u16>,
}

/// VLAN ids as numbers or numeric strings (`["10", "20"]` in older models)
fn deserialize_vlans<'de, D>(deserializer: D) -> Result<BTreeSet<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum VlanId {
        Number(u16),
        Text(String),
    }

    Vec::<VlanId>::deserialize(deserializer)?
        .into_iter()
        .map(|id| match id {
            VlanId::Number(n) => Ok(n),
            VlanId::Text(text) => text
                .trim()
                .parse::<u16>()
                .map_err(|_| D::Error::custom(format!("invalid VLAN id '{}'", text))),
        })
        .collect()
}

impl Topology {
    pub fn new(devices: Vec<Device>, links: Vec<Link>) -> Self {
        Self {
            devices,
            links,
            protocol: None,
            vlans: BTreeSet::new(),
        }
    }

    pub fn with_protocol(mut self, protocol: Option<Protocol>) -> Self {
        self.protocol = protocol;
        self
    }

    /// Check that every link endpoint names a device in the device list
    pub fn check_endpoints(&self) -> Result<(), TopologyError> {
        for (index, link) in self.links.iter().enumerate() {
            for endpoint in &link.endpoints {
                if self.device(endpoint).is_none() {
                    return Err(TopologyError::UnknownEndpoint {
                        index,
                        endpoint: endpoint.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }

    pub fn device_index(&self, name: &str) -> Option<usize> {
        self.devices.iter().position(|d| d.name == name)
    }

    /// Devices linked to `name`, in link declaration order
    pub fn neighbors(&self, name: &str) -> Vec<&str> {
        self.links.iter().filter_map(|link| link.peer_of(name)).collect()
    }

    /// Number of link ends attached to `name`
    pub fn degree(&self, name: &str) -> usize {
        self.links
            .iter()
            .map(|link| link.endpoints.iter().filter(|e| *e == name).count())
            .sum()
    }

    /// Clear accumulated configuration text on every device.
    ///
    /// Synthesis only ever appends, so callers that want to re-run it on the
    /// same topology must reset first.
    pub fn reset_configs(&mut self) {
        for device in &mut self.devices {
            device.config.clear();
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Upper-case the first character and lower-case the rest
pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
