//! Per-protocol routing configuration lines.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use log::warn;

use crate::config::ProtocolConfig;

/// Parse a stored link subnet. Host bits are ignored.
fn parse_subnet(subnet: &str) -> Option<Ipv4Net> {
    match subnet.parse::<Ipv4Net>() {
        Ok(net) => Some(net.trunc()),
        Err(e) => {
            warn!("Malformed subnet '{}' ({}), using simplified network statement", subnet, e);
            None
        }
    }
}

/// `router ospf <pid>` with one wildcard network statement per subnet
pub fn ospf_lines(networks: &[String], config: &ProtocolConfig) -> Vec<String> {
    let area = config.ospf_area;
    let mut lines = vec![format!("router ospf {}", config.ospf_process_id)];
    for network in networks {
        match parse_subnet(network) {
            Some(net) => lines.push(format!(" network {} {} area {}", net.network(), net.hostmask(), area)),
            None => lines.push(format!(" network {} area {}", network, area)),
        }
    }
    lines
}

pub fn eigrp_lines(networks: &[String], config: &ProtocolConfig) -> Vec<String> {
    let mut lines = vec![format!("router eigrp {}", config.eigrp_as)];
    for network in networks {
        match parse_subnet(network) {
            Some(net) => lines.push(format!(" network {}", net.network())),
            None => lines.push(format!(" network {}", network)),
        }
    }
    lines.push(" no auto-summary".to_string());
    lines
}

pub fn bgp_lines(router_id: Option<Ipv4Addr>, networks: &[String], config: &ProtocolConfig) -> Vec<String> {
    let mut lines = vec![format!("router bgp {}", config.bgp_asn)];
    if let Some(id) = router_id {
        lines.push(format!(" bgp router-id {}", id));
    }
    for network in networks {
        match parse_subnet(network) {
            Some(net) => lines.push(format!(" network {} mask {}", net.network(), net.netmask())),
            None => lines.push(format!(" network {}", network)),
        }
    }
    lines
}

/// Default route toward `next_hop`; nothing without one
pub fn static_lines(next_hop: Option<Ipv4Addr>) -> Vec<String> {
    next_hop
        .map(|hop| vec![format!("ip route 0.0.0.0 0.0.0.0 {}", hop)])
        .unwrap_or_default()
}
