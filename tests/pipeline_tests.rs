#[cfg(test)]
mod pipeline_tests {
    use std::io::Write;
    use std::net::Ipv4Addr;
    use tempfile::{NamedTempFile, TempDir};

    use netbuilder::config::Config;
    use netbuilder::config_loader::load_config;
    use netbuilder::deploy::{build_plan, LabStatus, LabStatusSource, ServiceError};
    use netbuilder::intent::{resolve_intent, structural_matchers, Resolution, ResolvedVia};
    use netbuilder::ip::assign_addresses;
    use netbuilder::orchestrator::{build_from_text, build_topology};
    use netbuilder::topology::{
        create_template_topology, load_model, save_model, vxlan_multisite, DeviceType, Interface, Protocol, Shape,
        Topology,
    };
    use netbuilder::validation::{run_health_checks, validate_topology, Severity};

    fn template(shape: Shape, n: usize) -> Topology {
        create_template_topology(shape, n, DeviceType::Router, None).unwrap()
    }

    /// Ring, star and mesh degree properties over a range of sizes
    #[test]
    fn test_template_degrees() {
        for n in 3..=9 {
            let ring = template(Shape::Ring, n);
            assert_eq!(ring.devices.len(), n);
            assert_eq!(ring.links.len(), n);
            assert!(ring.devices.iter().all(|d| ring.degree(&d.name) == 2));

            let star = template(Shape::Star, n);
            assert_eq!(star.degree("Router1"), n - 1);
            assert!(star.devices[1..].iter().all(|d| star.degree(&d.name) == 1));

            let mesh = template(Shape::Mesh, n);
            assert_eq!(mesh.links.len(), n * (n - 1) / 2);
            assert!(mesh.devices.iter().all(|d| mesh.degree(&d.name) == n - 1));
        }
    }

    #[test]
    fn test_allocation_is_deterministic() {
        let config = Config::default();
        let mut first = template(Shape::Mesh, 5);
        let mut second = template(Shape::Mesh, 5);
        assign_addresses(&mut first, &config.addressing, &config.overlay).unwrap();
        assign_addresses(&mut second, &config.addressing, &config.overlay).unwrap();
        assert_eq!(first, second);

        assert_eq!(first.links[0].subnet.as_deref(), Some("10.0.0.0/30"));
        assert_eq!(first.links[0].ips, vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)]);
        assert_eq!(first.links[1].subnet.as_deref(), Some("10.0.0.4/30"));
        assert_eq!(first.links[1].ips, vec![Ipv4Addr::new(10, 0, 0, 5), Ipv4Addr::new(10, 0, 0, 6)]);
    }

    #[test]
    fn test_duplicate_ip_single_finding() {
        let mut topology = template(Shape::Bus, 3);
        let mask = Ipv4Addr::new(255, 255, 255, 252);
        topology.devices[0]
            .interfaces
            .push(Interface::physical("GigabitEthernet0/0", Ipv4Addr::new(10, 0, 0, 1), mask, "Router2"));
        topology.devices[2]
            .interfaces
            .push(Interface::physical("GigabitEthernet0/1", Ipv4Addr::new(10, 0, 0, 1), mask, "Router2"));

        let findings = validate_topology(&topology);
        let duplicates: Vec<_> = findings.iter().filter(|f| f.category == "IP Address").collect();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].severity, Severity::Error);
        assert!(duplicates[0].message.contains("Router1:GigabitEthernet0/0"));
        assert!(duplicates[0].message.contains("Router3:GigabitEthernet0/1"));
    }

    #[test]
    fn test_ospf_synthesis_end_to_end() {
        let draft = create_template_topology(Shape::Bus, 2, DeviceType::Router, Some(Protocol::Ospf)).unwrap();
        let report = build_topology(draft, None, &Config::default()).unwrap();
        let config = &report.topology.devices[0].config;
        assert!(config.contains("router ospf 1"));
        assert!(config.contains("network 10.0.0.0 0.0.0.3 area 0"));
    }

    #[test]
    fn test_resolver_precedence_is_stable() {
        let text = "3 sites in a full mesh";
        for _ in 0..5 {
            match resolve_intent(text) {
                Resolution::Resolved { via, .. } => assert_eq!(via, ResolvedVia::Structural("sites_in_mesh")),
                other => panic!("unexpected {:?}", other),
            }
        }
        let full_mesh = structural_matchers().iter().find(|m| m.name() == "full_mesh").unwrap();
        assert!(full_mesh.try_match(text).is_some());
    }

    struct Stopped;

    impl LabStatusSource for Stopped {
        fn lab_status(&self) -> Result<LabStatus, ServiceError> {
            Ok(LabStatus {
                title: "lab".to_string(),
                state: "STOPPED".to_string(),
                nodes: vec!["R1".to_string(), "R2".to_string()],
                running_nodes: vec![],
            })
        }
    }

    #[test]
    fn test_stopped_lab() {
        let findings = run_health_checks(&Stopped).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn test_saved_model_roundtrip_after_build() {
        let report = build_from_text("4 sites connected via eigrp", None, &Config::default()).unwrap();
        assert_eq!(report.via, Some(ResolvedVia::Structural("sites_via_protocol")));

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        save_model(&path, &report.topology).unwrap();
        let loaded = load_model(&path).unwrap();
        assert_eq!(loaded, report.topology);
        assert_eq!(validate_topology(&loaded), report.findings);
    }

    #[test]
    fn test_config_file_drives_addressing() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "addressing:\n  base_network: 172.16.0.0/16\n  subnet_prefix: 29\n").unwrap();
        let config = load_config(file.path()).unwrap();

        let draft = template(Shape::Ring, 3);
        let report = build_topology(draft, None, &config).unwrap();
        assert_eq!(report.topology.links[1].subnet.as_deref(), Some("172.16.0.8/29"));
        assert_eq!(report.topology.devices[0].interfaces[0].ip, Ipv4Addr::new(172, 16, 0, 1));
    }

    #[test]
    fn test_multisite_pipeline() {
        let report = build_topology(vxlan_multisite(3, true), None, &Config::default()).unwrap();
        assert!(report.allocation.overlay_enabled);
        assert!(!report.allocation.capacity_exceeded);

        let border = report.topology.device("DC_Border_Router").unwrap();
        assert!(border.config.contains("router bgp 65000"));

        // BGP without neighbor statements is flagged
        assert!(report.findings.iter().any(|f| f.category == "BGP"));

        let plan = build_plan(&report.topology);
        assert_eq!(plan.nodes.len(), report.topology.devices.len());
        assert!(plan.links.len() < report.topology.links.len());
    }
}
