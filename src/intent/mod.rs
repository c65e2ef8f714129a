//! Intent resolution module.
//!
//! Converts free text into a topology draft. The resolver is tried first;
//! when it reports insufficient information, the loose pattern detector
//! picks a template shape and the template generator builds the draft.
//! Resolver failure is an expected outcome at every step, not an error.

pub mod pattern;
pub mod resolver;

pub use pattern::{detect_topology_pattern, PatternGuess};
pub use resolver::{resolve_intent, structural_matchers, Resolution, ResolvedVia};

use log::info;

use crate::topology::template::create_template_topology;
use crate::topology::types::{Topology, TopologyError};

/// Errors from the full resolution chain
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    #[error("Could not infer a topology from the request; name devices and connections (e.g. '6 routers in a ring topology using OSPF')")]
    Unresolvable,

    #[error(transparent)]
    Template(#[from] TopologyError),
}

/// A draft topology and how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub topology: Topology,
    pub via: ResolvedVia,
}

/// Resolve text, falling back to pattern detection plus template generation.
///
/// Protocol and VLAN hints found by the resolver are carried onto a template
/// draft when the detector did not find a protocol of its own.
pub fn resolve_with_fallback(text: &str) -> Result<Draft, IntentError> {
    let (hint_protocol, hint_vlans) = match resolve_intent(text) {
        Resolution::Resolved { topology, via } => return Ok(Draft { topology, via }),
        Resolution::Insufficient { protocol, vlans } => (protocol, vlans),
    };

    let guess = detect_topology_pattern(text).ok_or(IntentError::Unresolvable)?;
    info!(
        "Using template-based topology for {} {}s in a {} topology",
        guess.count, guess.device_type, guess.shape
    );

    let protocol = guess.protocol.or(hint_protocol);
    let mut topology = create_template_topology(guess.shape, guess.count, guess.device_type, protocol)?;
    topology.vlans = hint_vlans;

    Ok(Draft {
        topology,
        via: ResolvedVia::Template,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::types::Protocol;

    #[test]
    fn test_structural_path_wins() {
        let draft = resolve_with_fallback("4 sites in a ring topology").unwrap();
        assert_eq!(draft.via, ResolvedVia::Structural("sites_in_ring"));
    }

    #[test]
    fn test_falls_back_to_template() {
        let draft = resolve_with_fallback("5 routers in a star using ospf").unwrap();
        assert_eq!(draft.via, ResolvedVia::Template);
        assert_eq!(draft.topology.devices.len(), 5);
        assert_eq!(draft.topology.degree("Router1"), 4);
        assert_eq!(draft.topology.protocol, Some(Protocol::Ospf));
    }

    #[test]
    fn test_template_keeps_vlan_hints() {
        let draft = resolve_with_fallback("3 switches on vlan 20").unwrap();
        assert_eq!(draft.via, ResolvedVia::Template);
        assert!(draft.topology.vlans.contains(&20));
    }

    #[test]
    fn test_unnamed_entities_resolve_directly() {
        let draft = resolve_with_fallback("add a router and a switch. connect the router to the switch").unwrap();
        assert_eq!(draft.via, ResolvedVia::Entities);
        assert_eq!(draft.topology.links.len(), 1);
    }

    #[test]
    fn test_unresolvable() {
        assert!(matches!(resolve_with_fallback("make me a network"), Err(IntentError::Unresolvable)));
    }
}
