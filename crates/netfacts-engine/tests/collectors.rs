mod common;

use common::{logged, Harness};
use netfacts_common::{CollectorType, EntryAction, EntryStatus, LogLevel, ReportStatus};
use netfacts_driver::Getter;
use netfacts_engine::{FactsConfig, NewPlan};
use netfacts_inventory::{DeviceFilter, InventoryStore};
use netfacts_test::{two_device_site, DeviceScript, InventoryBuilder, ScriptedConnector};
use pretty_assertions::assert_eq;
use serde_json::json;

fn only(device: netfacts_common::DeviceId) -> DeviceFilter {
    DeviceFilter {
        devices: vec![device],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_inventory_serial_change_detected_then_applied() {
    let builder = InventoryBuilder::new();
    let site = builder.site("dc1");
    let edge1 = builder.device_with("edge1", site, Some("10.0.0.1/32"), |d| {
        d.serial = "OLD123".to_string();
    });

    let connector = ScriptedConnector::new().device(
        "edge1",
        DeviceScript::new().getter(
            Getter::Facts,
            json!({
                "serial_number": "NEW456",
                "os_version": "21.4R3",
                "hostname": "edge1",
                "fqdn": "edge1.example.net"
            }),
        ),
    );
    let h = Harness::new(builder.build(), connector);

    let outcome = h
        .run(NewPlan::new("inventory", CollectorType::Inventory, "eos").detect_only())
        .await
        .unwrap();

    assert_eq!(outcome.entries.len(), 1);
    let entry = &outcome.entries[0];
    assert_eq!(entry.action, EntryAction::Changed);
    assert_eq!(entry.status, EntryStatus::Pending);
    assert_eq!(entry.current_values["serial_number"], "OLD123");
    assert_eq!(entry.detected_values["serial_number"], "NEW456");
    assert_eq!(outcome.report.status, ReportStatus::Pending);

    let device = h.inventory.device(edge1.id).await.unwrap().unwrap();
    assert_eq!(device.serial, "OLD123");

    let (applied, failed) = h
        .reconciler()
        .apply_entries(outcome.report.id, &[entry.id])
        .await
        .unwrap();
    assert_eq!((applied, failed), (1, 0));

    let device = h.inventory.device(edge1.id).await.unwrap().unwrap();
    assert_eq!(device.serial, "NEW456");
    let journal = h.inventory.journal(edge1.id.into()).await.unwrap();
    assert_eq!(journal.len(), 1);
    assert!(journal[0].comments.contains("Serial: `OLD123` → `NEW456`"));
    assert!(journal[0]
        .comments
        .contains("Hostname: `edge1` (FQDN: `edge1.example.net`)"));
    assert_eq!(
        h.staging.report(outcome.report.id).unwrap().status,
        ReportStatus::Applied
    );
}

#[tokio::test]
async fn test_inventory_same_serial_is_confirmed() {
    let builder = InventoryBuilder::new();
    let site = builder.site("dc1");
    let edge1 = builder.device_with("edge1", site, Some("10.0.0.1/32"), |d| {
        d.serial = "ABC".to_string();
    });

    let connector = ScriptedConnector::new().device(
        "edge1",
        DeviceScript::new().getter(Getter::Facts, json!({"serial_number": "ABC"})),
    );
    let h = Harness::new(builder.build(), connector);

    let outcome = h
        .run(NewPlan::new("inventory", CollectorType::Inventory, "junos"))
        .await
        .unwrap();

    assert_eq!(outcome.entries[0].action, EntryAction::Confirmed);
    assert_eq!(outcome.entries[0].status, EntryStatus::Applied);
    assert!(h.inventory.journal(edge1.id.into()).await.unwrap().is_empty());
    assert!(logged(&outcome.log, LogLevel::Success, "Inventory collection completed"));
}

#[tokio::test]
async fn test_interfaces_assign_mac_to_interface() {
    let builder = InventoryBuilder::new();
    let site = builder.site("dc1");
    let edge1 = builder.device("edge1", site, Some("10.0.0.1/32"));
    let iface = builder.interface(edge1.id, "xe-0/0/0");

    let connector = ScriptedConnector::new().device(
        "edge1",
        DeviceScript::new().getter(
            Getter::Interfaces,
            json!({
                "xe-0/0/0": {"is_up": true, "is_enabled": true, "mac_address": "00:1c:73:aa:00:01", "mtu": 1514, "speed": 10000.0},
                "lo0": {"is_up": true, "mac_address": "00:1c:73:aa:00:02"},
                "xe-0/0/5": {"is_up": false, "mac_address": "00:1c:73:aa:00:03"},
                "xe-0/0/6": {"is_up": false, "mac_address": ""}
            }),
        ),
    );
    let h = Harness::new(builder.build(), connector);

    let outcome = h
        .run(NewPlan::new("interfaces", CollectorType::Interfaces, "junos"))
        .await
        .unwrap();

    assert_eq!(outcome.entries.len(), 1);
    assert_eq!(outcome.entries[0].object_repr, "Interface xe-0/0/0 MAC 00:1C:73:AA:00:01");
    assert_eq!(outcome.entries[0].detected_values["mtu"], 1514);
    assert!(logged(
        &outcome.log,
        LogLevel::Warning,
        "Could not find interface `xe-0/0/5` in NetBox. Skipping."
    ));

    let macs = h.inventory.mac_addresses();
    assert_eq!(macs.len(), 1);
    assert_eq!(macs[0].device_interface, Some(iface));
    assert_eq!(macs[0].discovery_method, Some(CollectorType::Interfaces));
    assert!(macs[0].last_seen.is_some());
}

#[tokio::test]
async fn test_switching_table() {
    let builder = InventoryBuilder::new();
    let site = builder.site("dc1");
    let edge1 = builder.device("edge1", site, Some("10.0.0.1/32"));
    let iface = builder.interface(edge1.id, "xe-0/0/0");

    let connector = ScriptedConnector::new().device(
        "edge1",
        DeviceScript::new().getter(
            Getter::MacAddressTable,
            json!([
                {"mac": "00:1c:73:bb:00:01", "interface": "xe-0/0/0", "vlan": 100, "static": false, "active": true},
                {"mac": "00:1c:73:bb:00:02", "interface": "", "vlan": 100},
                {"mac": "", "interface": "xe-0/0/0", "vlan": 100},
                {"mac": "00:1c:73:bb:00:03", "interface": "xe-0/0/9", "vlan": 200}
            ]),
        ),
    );
    let h = Harness::new(builder.build(), connector);

    let outcome = h
        .run(NewPlan::new(
            "switching",
            CollectorType::EthernetSwitching,
            "junos",
        ))
        .await
        .unwrap();

    assert_eq!(outcome.entries.len(), 1);
    assert_eq!(outcome.entries[0].detected_values["vlan"], 100);
    assert!(logged(
        &outcome.log,
        LogLevel::Warning,
        "Could not find interface `xe-0/0/9` in NetBox. Skipping."
    ));
    assert!(logged(
        &outcome.log,
        LogLevel::Success,
        "Ethernet switching collection completed"
    ));

    let macs = h.inventory.mac_addresses();
    assert_eq!(macs.len(), 1);
    assert!(macs[0].interfaces.contains(&iface));
    assert_eq!(
        macs[0].discovery_method,
        Some(CollectorType::EthernetSwitching)
    );
}

#[tokio::test]
async fn test_lldp_creates_cable_once() {
    let (builder, edge1, _edge2) = two_device_site();
    let connector = ScriptedConnector::new().device(
        "edge1",
        DeviceScript::new().getter(
            Getter::LldpNeighborsDetail,
            json!({
                "xe-0/0/0": [
                    {"remote_system_name": "edge2", "remote_port": "xe-0/0/0", "remote_chassis_id": "00:1c:73:00:00:aa"},
                    {"remote_system_name": "edge2", "remote_port": "xe-0/0/1"}
                ],
                "xe-0/0/1": [
                    {"remote_system_name": "unknown-host", "remote_port": "Ethernet1"}
                ]
            }),
        ),
    );
    let h = Harness::new(builder.build(), connector);
    let plan = h.create(
        NewPlan::new("lldp", CollectorType::Lldp, "junos").with_filter(only(edge1.id)),
    );

    let outcome = h.runner.run(plan).await.unwrap();

    assert_eq!(outcome.entries.len(), 1);
    assert_eq!(outcome.entries[0].status, EntryStatus::Applied);
    assert_eq!(outcome.entries[0].object_repr, "Cable xe-0/0/0 ↔ edge2:xe-0/0/0");
    assert_eq!(h.inventory.cables().len(), 1);
    assert!(logged(
        &outcome.log,
        LogLevel::Info,
        "Local interface `xe-0/0/0` already has a cable. Skipping."
    ));
    assert!(logged(
        &outcome.log,
        LogLevel::Info,
        "Remote device `unknown-host` not found in NetBox. Skipping cable creation."
    ));

    let journal = h.inventory.journal(edge1.id.into()).await.unwrap();
    assert_eq!(
        journal[0].comments,
        "LLDP: Created cable between `xe-0/0/0` and `edge2:xe-0/0/0`."
    );

    let again = h.runner.run(plan).await.unwrap();
    assert!(again.entries.is_empty());
    assert_eq!(h.inventory.cables().len(), 1);
}

#[tokio::test]
async fn test_lldp_skips_other_site_and_cabled_remote() {
    let builder = InventoryBuilder::new();
    let site = builder.site("dc1");
    let remote_site = builder.site("dc2");
    let edge1 = builder.device("edge1", site, Some("10.0.0.1/32"));
    let edge2 = builder.device("edge2", site, Some("10.0.0.2/32"));
    let edge3 = builder.device("edge3", remote_site, Some("10.0.1.3/32"));
    builder.interfaces(edge1.id, &["xe-0/0/0", "xe-0/0/1"]);
    let edge2_ports = builder.interfaces(edge2.id, &["xe-0/0/0", "xe-0/0/1"]);
    builder.interface(edge3.id, "xe-0/0/0");
    builder.cable(edge2_ports[0], edge2_ports[1]);

    let connector = ScriptedConnector::new().device(
        "edge1",
        DeviceScript::new().getter(
            Getter::LldpNeighborsDetail,
            json!({
                "xe-0/0/0": [{"remote_system_name": "edge2", "remote_port": "xe-0/0/0"}],
                "xe-0/0/1": [{"remote_system_name": "edge3", "remote_port": "xe-0/0/0"}],
                "xe-0/0/9": [{"remote_system_name": "edge2", "remote_port": "xe-0/0/1"}]
            }),
        ),
    );
    let h = Harness::new(builder.build(), connector);

    let outcome = h
        .run(NewPlan::new("lldp", CollectorType::Lldp, "junos").with_filter(only(edge1.id)))
        .await
        .unwrap();

    assert!(outcome.entries.is_empty());
    assert!(logged(
        &outcome.log,
        LogLevel::Info,
        "Remote interface `xe-0/0/0` on `edge2` already has a cable. Skipping."
    ));
    assert!(logged(
        &outcome.log,
        LogLevel::Info,
        "Remote device `edge3` is in a different site. Skipping cable creation."
    ));
    assert!(logged(
        &outcome.log,
        LogLevel::Warning,
        "Could not find local interface `xe-0/0/9` in NetBox. Skipping."
    ));
    assert_eq!(h.inventory.cables().len(), 1);
}

#[tokio::test]
async fn test_lldp_skips_missing_remote_interface() {
    let (builder, edge1, _edge2) = two_device_site();
    let connector = ScriptedConnector::new().device(
        "edge1",
        DeviceScript::new().getter(
            Getter::LldpNeighborsDetail,
            json!({
                "xe-0/0/0": [{"remote_system_name": "edge2", "remote_port": "xe-0/0/5"}]
            }),
        ),
    );
    let h = Harness::new(builder.build(), connector);

    let outcome = h
        .run(NewPlan::new("lldp", CollectorType::Lldp, "junos").with_filter(only(edge1.id)))
        .await
        .unwrap();

    assert!(outcome.entries.is_empty());
    assert!(logged(
        &outcome.log,
        LogLevel::Warning,
        "Could not find remote interface `xe-0/0/5` on `edge2`. Skipping."
    ));
    assert!(h.inventory.cables().is_empty());
}

#[tokio::test]
async fn test_lldp_apply_revalidates_cabling() {
    let (builder, edge1, edge2) = two_device_site();
    let connector = ScriptedConnector::new().device(
        "edge1",
        DeviceScript::new().getter(
            Getter::LldpNeighborsDetail,
            json!({
                "xe-0/0/0": [{"remote_system_name": "edge2", "remote_port": "xe-0/0/0"}]
            }),
        ),
    );
    let h = Harness::new(builder.build(), connector);

    let outcome = h
        .run(
            NewPlan::new("lldp", CollectorType::Lldp, "junos")
                .with_filter(only(edge1.id))
                .detect_only(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.entries.len(), 1);

    // The remote port gets cabled elsewhere before review.
    let remote = h.inventory.interface(edge2.id, "xe-0/0/0").await.unwrap().unwrap();
    let other = h.inventory.interface(edge2.id, "xe-0/0/1").await.unwrap().unwrap();
    h.inventory
        .create_cable(remote.id, other.id, Default::default())
        .await
        .unwrap();

    let (applied, failed) = h
        .reconciler()
        .apply_entries(outcome.report.id, &[outcome.entries[0].id])
        .await
        .unwrap();
    assert_eq!((applied, failed), (0, 1));

    let entry = h.staging.entry(outcome.entries[0].id).unwrap();
    assert_eq!(entry.status, EntryStatus::Failed);
    assert_eq!(entry.error_message, "Interface already has a cable");
    assert_eq!(
        h.staging.report(outcome.report.id).unwrap().status,
        ReportStatus::Failed
    );
    assert_eq!(h.inventory.cables().len(), 1);
    assert!(h.inventory.journal(edge1.id.into()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bgp_peers_without_rir() {
    let builder = InventoryBuilder::new();
    let site = builder.site("dc1");
    builder.device("edge1", site, Some("10.0.0.1/32"));
    let customer_a = builder.vrf("CUSTOMER_A");

    let connector = ScriptedConnector::new().device(
        "edge1",
        DeviceScript::new().getter(
            Getter::BgpNeighborsDetail,
            json!({
                "global": {"65001": [{"up": true, "remote_address": "192.0.2.1"}]},
                "CUSTOMER_A": {"65002": [{"up": false, "remote_address": "198.51.100.1"}]},
                "UNKNOWN": {"65003": [{"up": true, "remote_address": "not-an-ip"}]}
            }),
        ),
    );
    let h = Harness::new(builder.build(), connector);

    let outcome = h
        .run(NewPlan::new("bgp", CollectorType::Bgp, "junos"))
        .await
        .unwrap();

    assert_eq!(outcome.entries.len(), 2);
    assert!(outcome
        .entries
        .iter()
        .all(|e| e.status == EntryStatus::Applied));
    assert!(logged(
        &outcome.log,
        LogLevel::Warning,
        "Could not find VRF `UNKNOWN` in NetBox. Peers will be created in the global table."
    ));
    assert!(logged(
        &outcome.log,
        LogLevel::Warning,
        "Invalid IP address `not-an-ip`. Skipping."
    ));
    assert!(logged(
        &outcome.log,
        LogLevel::Warning,
        "No RIR exists in NetBox. Cannot create ASN 65001."
    ));

    let mut ips = h.inventory.ip_addresses();
    ips.sort_by_key(|ip| ip.address.to_string());
    assert_eq!(ips.len(), 2);
    assert_eq!(ips[0].address.to_string(), "192.0.2.1/32");
    assert_eq!(ips[0].vrf, None);
    assert_eq!(ips[1].address.to_string(), "198.51.100.1/32");
    assert_eq!(ips[1].vrf, Some(customer_a));
    assert!(h.inventory.asns().is_empty());

    let journal = h.inventory.journal(ips[1].id.into()).await.unwrap();
    assert!(journal[0].comments.contains("AS65002 remote address `198.51.100.1` in VRF `CUSTOMER_A`."));
}

#[tokio::test]
async fn test_bgp_creates_asns_with_rir() {
    let builder = InventoryBuilder::new();
    let site = builder.site("dc1");
    builder.device("edge1", site, Some("10.0.0.1/32"));
    let rir = builder.rir("ARIN");

    let connector = ScriptedConnector::new().device(
        "edge1",
        DeviceScript::new().getter(
            Getter::BgpNeighborsDetail,
            json!({
                "default": {
                    "65001": [
                        {"up": true, "remote_address": "192.0.2.1"},
                        {"up": true, "remote_address": "192.0.2.5"}
                    ],
                    "65010": [{"up": true, "remote_address": "2001:db8::1"}]
                }
            }),
        ),
    );
    let mut config = FactsConfig::default();
    config.asn.rir = Some("ARIN".to_string());
    let h = Harness::with_config(builder.build(), connector, config);

    let plan = h.create(NewPlan::new("bgp", CollectorType::Bgp, "junos"));
    let outcome = h.runner.run(plan).await.unwrap();

    assert_eq!(outcome.entries.len(), 3);
    let mut asns: Vec<_> = h.inventory.asns().into_iter().map(|a| (a.asn, a.rir)).collect();
    asns.sort();
    assert_eq!(asns, vec![(65001, rir), (65010, rir)]);
    assert_eq!(h.inventory.ip_addresses().len(), 3);

    let again = h.runner.run(plan).await.unwrap();
    assert_eq!(again.report.summary.confirmed, 3);
    assert!(logged(&again.log, LogLevel::Info, "Found existing peer IP"));
    assert_eq!(h.inventory.asns().len(), 2);
}

#[tokio::test]
async fn test_bgp_vrf_peers_reviewed_then_applied() {
    let builder = InventoryBuilder::new();
    let site = builder.site("dc1");
    builder.device("edge1", site, Some("10.0.0.1/32"));
    let customer_a = builder.vrf("CUSTOMER_A");

    let connector = ScriptedConnector::new().device(
        "edge1",
        DeviceScript::new().getter(
            Getter::BgpNeighborsDetail,
            json!({
                "CUSTOMER_A": {
                    "65001": [{"up": true, "remote_address": "198.51.100.1"}],
                    "65002": [{"up": true, "remote_address": "198.51.100.2"}]
                }
            }),
        ),
    );
    let h = Harness::new(builder.build(), connector);

    let outcome = h
        .run(NewPlan::new("bgp", CollectorType::Bgp, "junos").detect_only())
        .await
        .unwrap();
    assert_eq!(outcome.entries.len(), 2);
    assert!(outcome
        .entries
        .iter()
        .all(|e| e.action == EntryAction::New && e.is_pending()));

    let ids: Vec<_> = outcome.entries.iter().map(|e| e.id).collect();
    let (applied, failed) = h
        .reconciler()
        .apply_entries(outcome.report.id, &ids)
        .await
        .unwrap();
    assert_eq!((applied, failed), (2, 0));

    let ips = h.inventory.ip_addresses();
    assert_eq!(ips.len(), 2);
    assert!(ips
        .iter()
        .all(|ip| ip.vrf == Some(customer_a) && ip.address.prefix_len() == 32));
    assert!(h.inventory.asns().is_empty());
    assert!(h
        .staging
        .entries(outcome.report.id)
        .iter()
        .all(|e| e.status == EntryStatus::Applied));
    assert_eq!(
        h.staging.report(outcome.report.id).unwrap().status,
        ReportStatus::Applied
    );
}
