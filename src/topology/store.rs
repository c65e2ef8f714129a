//! Saved model persistence.
//!
//! A saved model wraps the topology under `network_design`. Loading also
//! accepts a bare topology and links written as `source`/`target` pairs.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{Interface, Topology};

/// Errors raised while reading or writing saved models
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML export failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Model has no devices/links lists")]
    NotATopology,
}

/// On-disk model wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkModel {
    pub network_design: Topology,
}

/// Parse a saved model from JSON text
pub fn parse_model(text: &str) -> Result<Topology, StoreError> {
    let mut value: Value = serde_json::from_str(text)?;

    if let Some(design) = value.get_mut("network_design").map(Value::take) {
        value = design;
    }

    let is_topology = value.get("devices").map_or(false, Value::is_array)
        && value.get("links").map_or(false, Value::is_array);
    if !is_topology {
        return Err(StoreError::NotATopology);
    }

    normalize_links(&mut value);
    Ok(serde_json::from_value(value)?)
}

/// Rewrite `{source, target}` links into `{endpoints: [source, target]}`
fn normalize_links(design: &mut Value) {
    let Some(links) = design.get_mut("links").and_then(Value::as_array_mut) else {
        return;
    };
    for link in links.iter_mut() {
        let Some(obj) = link.as_object_mut() else { continue };
        if obj.contains_key("endpoints") {
            continue;
        }
        if let (Some(source), Some(target)) = (obj.remove("source"), obj.remove("target")) {
            debug!("Normalizing source/target link {} -> {}", source, target);
            obj.insert("endpoints".to_string(), Value::Array(vec![source, target]));
        }
    }
}

/// Load a saved model from a JSON file
pub fn load_model(path: &Path) -> Result<Topology, StoreError> {
    info!("Loading network model from {:?}", path);
    let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_model(&text)
}

/// Serialize a topology in the wrapped model form
pub fn model_to_json(topology: &Topology) -> Result<String, StoreError> {
    let model = NetworkModel {
        network_design: topology.clone(),
    };
    Ok(serde_json::to_string_pretty(&model)?)
}

/// Save a topology as a wrapped model
pub fn save_model(path: &Path, topology: &Topology) -> Result<(), StoreError> {
    let json = model_to_json(topology)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }
    fs::write(path, json).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!("Saved network model to {:?}", path);
    Ok(())
}

/// Path for a timestamped queue snapshot inside `dir`
pub fn snapshot_path(dir: &Path, at: DateTime<Local>) -> PathBuf {
    dir.join(format!("queued_last_model_{}.json", at.format("%Y-%m-%d_%H-%M-%S")))
}

#[derive(Serialize)]
struct DeviceExport<'a> {
    #[serde(rename = "type")]
    device_type: &'a str,
    interfaces: &'a [Interface],
}

/// YAML mapping of device name to its type and interfaces, in device order
pub fn export_device_configs(topology: &Topology) -> Result<String, StoreError> {
    let mut mapping = serde_yaml::Mapping::new();
    for device in &topology.devices {
        let entry = DeviceExport {
            device_type: device.device_type.as_str(),
            interfaces: &device.interfaces,
        };
        mapping.insert(
            serde_yaml::Value::String(device.name.clone()),
            serde_yaml::to_value(entry)?,
        );
    }
    Ok(serde_yaml::to_string(&mapping)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::types::{Device, DeviceType, Link, Protocol};
    use chrono::TimeZone;
    use std::net::Ipv4Addr;
    use tempfile::TempDir;

    fn sample() -> Topology {
        let mut topology = Topology::new(
            vec![Device::new("HubRouter", DeviceType::Router), Device::new("Spoke1", DeviceType::Router)],
            vec![Link::ethernet("HubRouter", "Spoke1")],
        )
        .with_protocol(Some(Protocol::Static));
        topology.devices[0].interfaces.push(Interface::physical(
            "GigabitEthernet0/0",
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(255, 255, 255, 252),
            "Spoke1",
        ));
        topology
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom_templates").join("hub.json");
        let topology = sample();

        save_model(&path, &topology).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"network_design\""));

        assert_eq!(load_model(&path).unwrap(), topology);
    }

    #[test]
    fn test_parse_bare_topology_with_source_target() {
        let text = r#"{
            "devices": [{"name": "A", "type": "router"}, {"name": "B", "type": "switch"}],
            "links": [{"source": "A", "target": "B", "link_type": "serial"}]
        }"#;
        let topology = parse_model(text).unwrap();
        assert_eq!(topology.links[0].endpoints, ["A".to_string(), "B".to_string()]);
        assert_eq!(topology.links[0].link_type.as_str(), "serial");
    }

    #[test]
    fn test_parse_string_vlan_ids() {
        let text = r#"{"network_design": {
            "devices": [{"name": "S1", "type": "switch"}, {"name": "S2", "type": "switch"}],
            "links": [{"endpoints": ["S1", "S2"], "link_type": "ethernet"}],
            "protocol": "OSPF",
            "vlans": ["20", "10", 30]
        }}"#;
        let topology = parse_model(text).unwrap();
        assert_eq!(topology.vlans.iter().copied().collect::<Vec<_>>(), vec![10, 20, 30]);

        // Saved back as numbers
        let reloaded = parse_model(&model_to_json(&topology).unwrap()).unwrap();
        assert_eq!(reloaded, topology);

        let bad = text.replace(r#""20""#, r#""trunk""#);
        assert!(matches!(parse_model(&bad), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_parse_rejects_non_topology() {
        assert!(matches!(parse_model(r#"{"protocol": "OSPF"}"#), Err(StoreError::NotATopology)));
        assert!(matches!(parse_model("not json"), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_snapshot_path_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let path = snapshot_path(Path::new("saved_models"), at);
        assert_eq!(path, PathBuf::from("saved_models/queued_last_model_2024-03-09_14-05-07.json"));
    }

    #[test]
    fn test_export_keeps_device_order() {
        let yaml = export_device_configs(&sample()).unwrap();
        let hub = yaml.find("HubRouter:").unwrap();
        let spoke = yaml.find("Spoke1:").unwrap();
        assert!(hub < spoke);
        assert!(yaml.contains("ip: 10.0.0.1"));
        assert!(yaml.contains("type: router"));
    }
}
