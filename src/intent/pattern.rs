//! Lightweight topology pattern detection.
//!
//! A looser second pass used when the resolver finds too little structure:
//! infer a shape, a device count, a device type and a protocol from keyword
//! and number mentions so the template generator can build the topology.

use std::sync::LazyLock;

use regex::Regex;

use super::resolver::MAX_INTENT_COUNT;
use crate::topology::template::Shape;
use crate::topology::types::{DeviceType, Protocol};

/// What the detector inferred from the text
#[derive(Debug, Clone, PartialEq)]
pub struct PatternGuess {
    pub shape: Shape,
    pub count: usize,
    pub protocol: Option<Protocol>,
    pub device_type: DeviceType,
}

struct DetectorPatterns {
    shapes: Vec<(Shape, Regex)>,
    counts: Vec<Regex>,
    switch: Regex,
    firewall: Regex,
    protocols: Vec<(Protocol, Regex)>,
}

static PATTERNS: LazyLock<DetectorPatterns> = LazyLock::new(|| {
    let re = |p: &str| Regex::new(p).unwrap();
    DetectorPatterns {
        shapes: vec![
            (Shape::Ring, re(r"(?i)\b(ring|loop|circular|circle)\b")),
            (Shape::Star, re(r"(?i)\b(star|hub.+spoke|hub|spoke|central|radial)\b")),
            (Shape::Mesh, re(r"(?i)\b(full.?mesh|mesh|fully.connected|complete)\b")),
            (Shape::Bus, re(r"(?i)\b(bus|line|linear|daisy.?chain|in.?a.?row|chain)\b")),
        ],
        counts: vec![
            re(r"(?i)(\d+)\s+(router|switch|firewall|device|computer|server|host)"),
            re(r"(?i)(\d+)[\s-]+(node|device|equipment)"),
            re(r"(\d+)"),
        ],
        switch: re(r"(?i)\bswitch"),
        firewall: re(r"(?i)\bfirewall"),
        protocols: vec![
            (Protocol::Ospf, re(r"(?i)\bOSPF\b")),
            (Protocol::Eigrp, re(r"(?i)\bEIGRP\b")),
            (Protocol::Bgp, re(r"(?i)\bBGP\b")),
            (Protocol::Rip, re(r"(?i)\bRIP\b")),
            (Protocol::Static, re(r"(?i)\bstatic\b")),
        ],
    }
});

/// Shape used when the text names a count but no shape
pub fn default_shape(count: usize) -> Shape {
    if count <= 6 {
        Shape::Ring
    } else {
        Shape::Star
    }
}

/// Infer a template request from loose keywords.
///
/// Returns `None` unless both a shape (explicit or defaulted) and a usable
/// device count are found.
pub fn detect_topology_pattern(text: &str) -> Option<PatternGuess> {
    let patterns = &*PATTERNS;

    let explicit_shape = patterns
        .shapes
        .iter()
        .find(|(_, pattern)| pattern.is_match(text))
        .map(|(shape, _)| *shape);

    let count = patterns
        .counts
        .iter()
        .find_map(|pattern| pattern.captures(text))
        .and_then(|caps| caps[1].parse::<usize>().ok())
        .filter(|n| (2..=MAX_INTENT_COUNT).contains(n))?;

    let device_type = if patterns.switch.is_match(text) {
        DeviceType::Switch
    } else if patterns.firewall.is_match(text) {
        DeviceType::Firewall
    } else {
        DeviceType::Router
    };

    let protocol = patterns
        .protocols
        .iter()
        .find(|(_, pattern)| pattern.is_match(text))
        .map(|(protocol, _)| protocol.clone());

    Some(PatternGuess {
        shape: explicit_shape.unwrap_or_else(|| default_shape(count)),
        count,
        protocol,
        device_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_shape_and_count() {
        let guess = detect_topology_pattern("6 routers in a ring topology using OSPF").unwrap();
        assert_eq!(guess.shape, Shape::Ring);
        assert_eq!(guess.count, 6);
        assert_eq!(guess.protocol, Some(Protocol::Ospf));
        assert_eq!(guess.device_type, DeviceType::Router);
    }

    #[test]
    fn test_switch_star() {
        let guess = detect_topology_pattern("3 switches in a hub and spoke layout").unwrap();
        assert_eq!(guess.shape, Shape::Star);
        assert_eq!(guess.count, 3);
        assert_eq!(guess.device_type, DeviceType::Switch);
    }

    #[test]
    fn test_daisy_chain() {
        let guess = detect_topology_pattern("daisy-chain 4 firewalls").unwrap();
        assert_eq!(guess.shape, Shape::Bus);
        assert_eq!(guess.device_type, DeviceType::Firewall);
    }

    #[test]
    fn test_default_shapes() {
        assert_eq!(detect_topology_pattern("2 routers").unwrap().shape, Shape::Ring);
        assert_eq!(detect_topology_pattern("5 routers with eigrp").unwrap().shape, Shape::Ring);
        let large = detect_topology_pattern("10 devices running bgp").unwrap();
        assert_eq!(large.shape, Shape::Star);
        assert_eq!(large.protocol, Some(Protocol::Bgp));
    }

    #[test]
    fn test_protocol_order() {
        let guess = detect_topology_pattern("4 routers, static routes and RIP").unwrap();
        assert_eq!(guess.protocol, Some(Protocol::Rip));
    }

    #[test]
    fn test_no_count_no_guess() {
        assert!(detect_topology_pattern("a ring of routers").is_none());
        assert!(detect_topology_pattern("1 router in a ring").is_none());
    }
}
