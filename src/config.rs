use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

/// Largest VXLAN network identifier (24 bits)
pub const MAX_VNI: u32 = 0x00FF_FFFF;

/// Pipeline configuration. Every section is optional; the defaults
/// reproduce the standard addressing plan and protocol constants.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub addressing: AddressingConfig,
    pub overlay: OverlayConfig,
    pub protocols: ProtocolConfig,
    pub synthesis: SynthesisConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let addressing = &self.addressing;
        if addressing.subnet_prefix == 0 || addressing.subnet_prefix > 32 {
            return Err(ValidationError::InvalidAddressing(format!(
                "subnet_prefix must be in 1..=32, got {}",
                addressing.subnet_prefix
            )));
        }
        if addressing.subnet_prefix < addressing.base_network.prefix_len() {
            return Err(ValidationError::InvalidAddressing(format!(
                "subnet_prefix /{} is shorter than base_network {}",
                addressing.subnet_prefix, addressing.base_network
            )));
        }

        if self.overlay.vtep_marker.trim().is_empty() {
            return Err(ValidationError::InvalidOverlay("vtep_marker cannot be empty".to_string()));
        }
        for (field, vni) in [("l2vni_base", self.overlay.l2vni_base), ("l3vni", self.overlay.l3vni)] {
            if vni == 0 || vni > MAX_VNI {
                return Err(ValidationError::InvalidOverlay(format!(
                    "{} must be in 1..={}, got {}",
                    field, MAX_VNI, vni
                )));
            }
        }

        let protocols = &self.protocols;
        if protocols.ospf_process_id == 0 {
            return Err(ValidationError::InvalidProtocols("ospf_process_id must be non-zero".to_string()));
        }
        if protocols.eigrp_as == 0 || protocols.bgp_asn == 0 {
            return Err(ValidationError::InvalidProtocols(
                "eigrp_as and bgp_asn must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Address pools used by the allocator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressingConfig {
    /// Block that physical link subnets are carved from
    pub base_network: Ipv4Net,
    /// Prefix length of each link subnet
    pub subnet_prefix: u8,
    /// Pool for VTEP loopbacks
    pub loopback_pool: Ipv4Net,
}

impl Default for AddressingConfig {
    fn default() -> Self {
        Self {
            base_network: Ipv4Net::new_assert(Ipv4Addr::new(10, 0, 0, 0), 8),
            subnet_prefix: 30,
            loopback_pool: Ipv4Net::new_assert(Ipv4Addr::new(192, 168, 100, 0), 24),
        }
    }
}

/// Overlay (VXLAN) identifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Substring of a device name that marks it as a VTEP
    pub vtep_marker: String,
    pub l2vni_base: u32,
    pub l3vni: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            vtep_marker: "VTEP".to_string(),
            l2vni_base: 10000,
            l3vni: 50000,
        }
    }
}

/// Routing process identifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub ospf_process_id: u16,
    pub ospf_area: u32,
    pub eigrp_as: u16,
    pub bgp_asn: u32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            ospf_process_id: 1,
            ospf_area: 0,
            eigrp_as: 100,
            bgp_asn: 65000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Emit `interface` blocks with addresses before the routing config
    pub interface_stanzas: bool,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid addressing configuration: {0}")]
    InvalidAddressing(String),
    #[error("Invalid overlay configuration: {0}")]
    InvalidOverlay(String),
    #[error("Invalid protocol configuration: {0}")]
    InvalidProtocols(String),
}
