//! Intent resolver.
//!
//! Turns free text into a topology draft. Structural matchers are tried in
//! table order and the first one that produces a topology wins; later
//! matchers never run. When none fires, the entity extractor assembles
//! devices and links from explicitly named devices and connective phrases.
//! Protocol and VLAN mentions are scanned independently of either path.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use log::{debug, info, warn};
use regex::{Captures, Regex};

use crate::topology::template::{router_mesh, site_topology, SiteWiring};
use crate::topology::types::{capitalize, Device, DeviceType, Link, Protocol, Topology};

/// Upper bound on device counts read from text
pub const MAX_INTENT_COUNT: usize = 512;

/// Which resolver path produced a draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedVia {
    /// A structural matcher, by name
    Structural(&'static str),
    /// Explicit device and connection mentions
    Entities,
    /// The fallback pattern detector and template generator
    Template,
}

/// Outcome of resolving free text
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved { topology: Topology, via: ResolvedVia },
    /// Not enough structure for a topology; carries whatever hints were found
    Insufficient {
        protocol: Option<Protocol>,
        vlans: BTreeSet<u16>,
    },
}

/// One row of the structural matcher table
pub struct StructuralMatcher {
    name: &'static str,
    patterns: Vec<Regex>,
    build: fn(&Captures) -> Option<Topology>,
}

impl StructuralMatcher {
    fn new(name: &'static str, patterns: &[&str], build: fn(&Captures) -> Option<Topology>) -> Self {
        Self {
            name,
            patterns: patterns.iter().map(|p| Regex::new(p).unwrap()).collect(),
            build,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Try this matcher alone against normalized text
    pub fn try_match(&self, text: &str) -> Option<Topology> {
        self.patterns
            .iter()
            .find_map(|pattern| pattern.captures(text))
            .and_then(|caps| (self.build)(&caps))
    }
}

fn captured_count(caps: &Captures, group: usize) -> Option<usize> {
    caps.get(group)?
        .as_str()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=MAX_INTENT_COUNT).contains(n))
}

fn build_site_mesh(caps: &Captures) -> Option<Topology> {
    captured_count(caps, 1).map(|n| site_topology(n, SiteWiring::Mesh))
}

fn build_site_ring(caps: &Captures) -> Option<Topology> {
    captured_count(caps, 1).map(|n| site_topology(n, SiteWiring::Ring))
}

fn build_full_mesh(caps: &Captures) -> Option<Topology> {
    let n = captured_count(caps, 1)?;
    let entity = caps.get(2)?.as_str();
    if entity.starts_with("site") {
        Some(site_topology(n, SiteWiring::Mesh))
    } else {
        Some(router_mesh(n))
    }
}

fn build_sites_via_protocol(caps: &Captures) -> Option<Topology> {
    let n = captured_count(caps, 1)?;
    let protocol = Protocol::from(caps.get(2)?.as_str());
    Some(site_topology(n, SiteWiring::Ring).with_protocol(Some(protocol)))
}

/// Ordered structural matchers; earlier rows take precedence
static STRUCTURAL_MATCHERS: LazyLock<Vec<StructuralMatcher>> = LazyLock::new(|| {
    vec![
        StructuralMatcher::new("sites_in_mesh", &[r"(\d+)\s+sites?.*mesh"], build_site_mesh),
        StructuralMatcher::new(
            "sites_in_ring",
            &[
                r"(\d+)\s+sites?\s+.*ring\s+topology",
                r"(\d+)\s+sites?\s+topology\s+connected\s+in\s+a\s+ring",
                r"(\d+)\s+sites?.*ring",
            ],
            build_site_ring,
        ),
        StructuralMatcher::new(
            "sites_by_routers_via_ethernet",
            &[r"(\d+)\s+sites?\s+connected\s+by\s+routers?\s+via\s+ethernet"],
            build_site_ring,
        ),
        StructuralMatcher::new(
            "full_mesh",
            &[
                r"(\d+)\s+(sites?|routers?)\s+.*full\s+mesh",
                r"full\s+mesh\s+(?:of\s+)?(\d+)\s+(sites?|routers?)",
            ],
            build_full_mesh,
        ),
        StructuralMatcher::new(
            "sites_via_protocol",
            &[r"(\d+)\s+sites?\s+connected\s+via\s+([a-z0-9]+)"],
            build_sites_via_protocol,
        ),
    ]
});

/// The structural matcher table, in precedence order
pub fn structural_matchers() -> &'static [StructuralMatcher] {
    &STRUCTURAL_MATCHERS
}

/// Lower-case and replace punctuation/separators with spaces
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            '-' | '_' | ',' | ';' | ':' | '!' | '?' | '(' | ')' => ' ',
            other => other,
        })
        .collect()
}

/// Device types and their phrasings, most specific first within each type.
/// External servers precede plain servers so "external server" is not
/// claimed by the shorter synonym.
const DEVICE_SYNONYMS: &[(&str, &[&str])] = &[
    ("router", &["core router", "edge router", "wan router", "router"]),
    ("switch", &["core switch", "access switch", "distribution switch", "switch"]),
    ("firewall", &["firewall", "asa", "security appliance"]),
    ("ext-server", &["external server", "cloud server", "vm"]),
    ("server", &["server", "pc", "host", "workstation"]),
];

/// Device reference in a connective phrase: optional article, optional
/// device-type word, then a name ("the router r1", "switch 2", "core1")
const NAME: &str = r"\b(?:(?:the|an?)\s+)?((?:(?:router|switch|firewall|server|pc|host)\s+)?[a-z0-9_]+)";

struct EntityPatterns {
    /// Per device type: "<type> named|called <name>", "<type> <name-with-digit>", "<name-with-digit> <type>"
    by_type: Vec<(DeviceType, [Regex; 3])>,
    /// "router1", "switch 2", "pc3"
    numbered: Regex,
    /// Per device type: "a <type>" / "an <type>"; group 1 is set when a name follows
    unnamed: Vec<(DeviceType, Regex)>,
    links: Vec<Regex>,
}

static ENTITY_PATTERNS: LazyLock<EntityPatterns> = LazyLock::new(|| {
    let by_type = DEVICE_SYNONYMS
        .iter()
        .map(|(label, synonyms)| {
            let alternation = synonyms.join("|");
            let patterns = [
                Regex::new(&format!(r"\b(?:{})s?\s+(?:named|called)\s+([a-z][a-z0-9_]*)", alternation)).unwrap(),
                Regex::new(&format!(r"\b(?:{})s?\s+([a-z][a-z0-9_]*\d[a-z0-9_]*)\b", alternation)).unwrap(),
                Regex::new(&format!(r"\b([a-z][a-z0-9_]*\d[a-z0-9_]*)\s+(?:{})\b", alternation)).unwrap(),
            ];
            (DeviceType::from(*label), patterns)
        })
        .collect();

    let links = [
        format!(r"\bconnect\s+{n}\s+(?:to|with|and)\s+{n}", n = NAME),
        format!(r"{n}\s+uplinks?\s+to\s+{n}", n = NAME),
        format!(r"\blink\s+{n}\s+(?:to|with|and)\s+{n}", n = NAME),
        format!(r"{n}\s+is\s+connected\s+to\s+{n}", n = NAME),
        format!(r"{n}\s+and\s+{n}\s+are\s+connected", n = NAME),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();

    let unnamed = DEVICE_SYNONYMS
        .iter()
        .map(|(label, synonyms)| {
            let pattern = format!(
                r"\ban?\s+(?:{})\b(\s+(?:named|called)\b|\s*\d|\s+[a-z][a-z0-9_]*\d)?",
                synonyms.join("|")
            );
            (DeviceType::from(*label), Regex::new(&pattern).unwrap())
        })
        .collect();

    EntityPatterns {
        by_type,
        unnamed,
        numbered: Regex::new(r"\b(router|switch|firewall|server|pc|host)\s?(\d+)\b").unwrap(),
        links,
    }
});

static VLAN_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"vlan\s*(\d+)").unwrap());

/// Protocol keywords in scan order
const PROTOCOL_KEYWORDS: &[&str] = &["bgp", "ospf", "eigrp", "static"];

/// First protocol keyword mentioned anywhere in normalized text
pub fn scan_protocol(text: &str) -> Option<Protocol> {
    PROTOCOL_KEYWORDS
        .iter()
        .find(|keyword| text.contains(*keyword))
        .map(|keyword| Protocol::from(*keyword))
}

/// VLAN ids mentioned as "vlan 10" / "vlan10"
pub fn scan_vlans(text: &str) -> BTreeSet<u16> {
    VLAN_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<u16>().ok())
        .collect()
}

/// Run the structural matcher table over normalized text
fn match_structural(text: &str) -> Option<(&'static str, Topology)> {
    for matcher in structural_matchers() {
        debug!("Trying structural matcher '{}'", matcher.name());
        if let Some(topology) = matcher.try_match(text) {
            return Some((matcher.name(), topology));
        }
    }
    None
}

/// Collect mentioned devices, ordered by first mention. Explicit and
/// numbered names are kept; each unnamed mention ("a router") becomes a new
/// device named `{Type}{k}` with the lowest `k` not already taken.
fn extract_devices(text: &str) -> Vec<Device> {
    let patterns = &*ENTITY_PATTERNS;
    let mut mentions: Vec<(usize, String, DeviceType)> = Vec::new();

    for (device_type, rules) in &patterns.by_type {
        for rule in rules {
            for caps in rule.captures_iter(text) {
                if let Some(name) = caps.get(1) {
                    mentions.push((name.start(), capitalize(name.as_str()), device_type.clone()));
                }
            }
        }
    }

    for caps in patterns.numbered.captures_iter(text) {
        let (Some(whole), Some(kind), Some(number)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let device_type = match kind.as_str() {
            "pc" | "host" => DeviceType::Server,
            other => DeviceType::from(other),
        };
        let name = format!("{}{}", device_type.name_prefix(), number.as_str());
        mentions.push((whole.start(), name, device_type));
    }

    let mut unnamed: Vec<(usize, DeviceType)> = Vec::new();
    for (device_type, rule) in &patterns.unnamed {
        for caps in rule.captures_iter(text) {
            if let (Some(whole), None) = (caps.get(0), caps.get(1)) {
                unnamed.push((whole.start(), device_type.clone()));
            }
        }
    }
    unnamed.sort_by_key(|(position, _)| *position);

    let mut taken: HashSet<String> = mentions.iter().map(|(_, name, _)| name.to_lowercase()).collect();
    for (position, device_type) in unnamed {
        let prefix = device_type.name_prefix();
        let name = (1..)
            .map(|k| format!("{}{}", prefix, k))
            .find(|candidate| !taken.contains(&candidate.to_lowercase()))
            .unwrap_or_else(|| prefix.clone());
        debug!("Unnamed {} mention becomes {}", device_type.as_str(), name);
        taken.insert(name.to_lowercase());
        mentions.push((position, name, device_type));
    }

    mentions.sort_by_key(|(position, _, _)| *position);

    let mut seen = HashSet::new();
    mentions
        .into_iter()
        .filter(|(_, name, _)| seen.insert(name.to_lowercase()))
        .map(|(_, name, device_type)| Device::new(name, device_type))
        .collect()
}

/// Device type named by a bare type word ("router", "pc")
fn type_word(word: &str) -> Option<DeviceType> {
    DEVICE_SYNONYMS
        .iter()
        .find(|(_, synonyms)| synonyms.contains(&word))
        .map(|(label, _)| DeviceType::from(*label))
}

/// `pc3`/`host3` name the same device as `server3`
fn canonical_token(token: &str) -> String {
    for alias in ["pc", "host"] {
        if let Some(number) = token.strip_prefix(alias) {
            if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
                return format!("server{}", number);
            }
        }
    }
    token.to_string()
}

/// Match a device reference against extracted devices: first the whole
/// reference with spaces removed ("switch 2"), then its last word ("router r1"),
/// then a bare type word ("the router") naming the only device of that type
fn resolve_endpoint(reference: &str, devices: &[Device]) -> Option<String> {
    let compact: String = reference.split_whitespace().collect();
    let last = reference.split_whitespace().last()?;
    let by_name = [canonical_token(&compact), canonical_token(last)]
        .iter()
        .find_map(|candidate| devices.iter().find(|d| d.name.eq_ignore_ascii_case(candidate)))
        .map(|d| d.name.clone());
    if by_name.is_some() {
        return by_name;
    }

    let device_type = type_word(last)?;
    let mut of_type = devices.iter().filter(|d| d.device_type == device_type);
    match (of_type.next(), of_type.next()) {
        (Some(only), None) => Some(only.name.clone()),
        _ => None,
    }
}

/// Collect links from connective phrases, keeping only those whose both
/// ends name an extracted device
fn extract_links(text: &str, devices: &[Device]) -> Vec<Link> {
    let lookup = |reference: &str| resolve_endpoint(reference, devices);

    let mut links = Vec::new();
    for pattern in &ENTITY_PATTERNS.links {
        for caps in pattern.captures_iter(text) {
            let (a, b) = (&caps[1], &caps[2]);
            match (lookup(a), lookup(b)) {
                (Some(a), Some(b)) if a != b => links.push(Link::ethernet(a, b)),
                (Some(_), Some(_)) => debug!("Ignoring self-link on '{}'", a),
                _ => warn!("Dropping connection '{}' - '{}': endpoint is not a known device", a, b),
            }
        }
    }
    links
}

/// Resolve free text into a topology draft.
///
/// Returns `Resolution::Insufficient` rather than an error when the text does
/// not describe both devices and links; callers decide whether to fall back.
pub fn resolve_intent(text: &str) -> Resolution {
    let text = normalize(text);

    if let Some((name, topology)) = match_structural(&text) {
        info!(
            "Resolved intent via structural matcher '{}': {} devices, {} links",
            name,
            topology.devices.len(),
            topology.links.len()
        );
        return Resolution::Resolved {
            topology,
            via: ResolvedVia::Structural(name),
        };
    }

    let devices = extract_devices(&text);
    let links = extract_links(&text, &devices);
    let protocol = scan_protocol(&text);
    let vlans = scan_vlans(&text);

    if devices.is_empty() || links.is_empty() {
        info!(
            "Insufficient topology information ({} devices, {} links found)",
            devices.len(),
            links.len()
        );
        return Resolution::Insufficient { protocol, vlans };
    }

    info!("Resolved intent from named entities: {} devices, {} links", devices.len(), links.len());
    let mut topology = Topology::new(devices, links).with_protocol(protocol);
    topology.vlans = vlans;
    Resolution::Resolved {
        topology,
        via: ResolvedVia::Entities,
    }
}
