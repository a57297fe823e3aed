mod common;

use common::{logged, Harness};
use netfacts_common::{
    CollectorType, EntryAction, EntryStatus, FactKind, LogLevel, ReportStatus,
};
use netfacts_driver::Getter;
use netfacts_engine::NewPlan;
use netfacts_test::{DeviceScript, InventoryBuilder, ScriptedConnector};
use pretty_assertions::assert_eq;
use serde_json::json;

fn arp_script(arp: serde_json::Value, interfaces_ip: serde_json::Value) -> DeviceScript {
    DeviceScript::new()
        .getter(Getter::ArpTable, arp)
        .getter(Getter::InterfacesIp, interfaces_ip)
        .getter(Getter::NetworkInstances, json!({}))
}

#[tokio::test]
async fn test_arp_creates_mac_and_ip() {
    let builder = InventoryBuilder::new();
    let site = builder.site("dc1");
    let edge1 = builder.device("edge1", site, Some("10.0.0.1/32"));
    let iface = builder.interface(edge1.id, "xe-0/0/0");
    builder.prefix("192.0.2.0/24", None);

    let connector = ScriptedConnector::new().device(
        "edge1",
        arp_script(
            json!([{"interface": "xe-0/0/0", "mac": "00:1c:73:00:00:01", "ip": "192.0.2.10", "age": 12.0}]),
            json!({"xe-0/0/0": {"ipv4": {"192.0.2.1": {"prefix_length": 24}}}}),
        ),
    );
    let h = Harness::new(builder.build(), connector);

    let outcome = h
        .run(NewPlan::new("arp", CollectorType::Arp, "junos"))
        .await
        .unwrap();

    assert_eq!(outcome.entries.len(), 2);
    assert_eq!(outcome.entries[0].fact_kind, FactKind::MacDiscovery);
    assert_eq!(outcome.entries[1].fact_kind, FactKind::IpDiscovery);
    assert!(outcome
        .entries
        .iter()
        .all(|e| e.action == EntryAction::New && e.status == EntryStatus::Applied));
    assert_eq!(outcome.entries[1].detected_values["ip"], "192.0.2.10/24");
    assert_eq!(outcome.report.status, ReportStatus::Applied);
    assert_eq!(outcome.report.summary.new, 2);
    assert!(outcome.report.completed_at.is_some());

    let macs = h.inventory.mac_addresses();
    let ips = h.inventory.ip_addresses();
    assert_eq!(macs.len(), 1);
    assert_eq!(ips.len(), 1);
    assert_eq!(ips[0].address.to_string(), "192.0.2.10/24");
    assert_eq!(ips[0].vrf, None);
    assert!(macs[0].interfaces.contains(&iface));
    assert!(macs[0].ip_addresses.contains(&ips[0].id));
    assert!(macs[0].tags.contains("Automatically Discovered"));
    assert_eq!(macs[0].discovery_method, Some(CollectorType::Arp));

    let journal = h.inventory.journal_entries();
    assert_eq!(journal.len(), 1);
    assert!(journal[0].comments.starts_with("Discovered by edge1 with MAC"));
    assert!(journal[0].comments.ends_with("via ARP collection."));

    assert!(logged(&outcome.log, LogLevel::Success, "ARP collection completed"));
    assert_eq!(h.connector.opened(), 1);
    assert_eq!(h.connector.closed(), 1);
}

#[tokio::test]
async fn test_arp_rerun_confirms_without_duplicates() {
    let builder = InventoryBuilder::new();
    let site = builder.site("dc1");
    let edge1 = builder.device("edge1", site, Some("10.0.0.1/32"));
    builder.interface(edge1.id, "xe-0/0/0");
    builder.prefix("192.0.2.0/24", None);

    let connector = ScriptedConnector::new().device(
        "edge1",
        arp_script(
            json!([
                {"interface": "xe-0/0/0", "mac": "00:1c:73:00:00:01", "ip": "192.0.2.10"},
                {"interface": "xe-0/0/0", "mac": "00:1c:73:00:00:02", "ip": "192.0.2.11"}
            ]),
            json!({"xe-0/0/0": {"ipv4": {"192.0.2.1": {"prefix_length": 24}}}}),
        ),
    );
    let h = Harness::new(builder.build(), connector);
    let plan = h.create(NewPlan::new("arp", CollectorType::Arp, "junos"));

    let first = h.runner.run(plan).await.unwrap();
    assert_eq!(first.report.summary.new, 4);

    let second = h.runner.run(plan).await.unwrap();
    assert_eq!(second.entries.len(), 4);
    assert_eq!(second.report.summary.confirmed, 4);
    assert!(second.entries.iter().all(|e| e.object.is_some()));
    assert_eq!(h.inventory.mac_addresses().len(), 2);
    assert_eq!(h.inventory.ip_addresses().len(), 2);
    assert_eq!(h.staging.reports_for(plan).len(), 2);
}

#[tokio::test]
async fn test_arp_skips_unusable_neighbors() {
    let builder = InventoryBuilder::new();
    let site = builder.site("dc1");
    let edge1 = builder.device("edge1", site, Some("10.0.0.1/32"));
    builder.interfaces(edge1.id, &["xe-0/0/0", "xe-0/0/1"]);

    let connector = ScriptedConnector::new().device(
        "edge1",
        arp_script(
            json!([
                {"interface": "xe-0/0/0", "mac": "00:1c:73:00:00:01", "ip": "203.0.113.5"},
                {"interface": "xe-0/0/1", "mac": "", "ip": "198.18.0.9"},
                {"interface": "xe-0/0/1", "mac": "00:1c:73:00:00:03", "ip": "198.18.0.10", "state": "unreachable"},
                {"interface": "xe-0/0/7", "mac": "00:1c:73:00:00:09", "ip": "192.0.2.30"},
                {"interface": "lo0.0", "mac": "00:1c:73:00:00:0a", "ip": "127.0.0.2"}
            ]),
            json!({
                "xe-0/0/0": {"ipv4": {"203.0.113.1": {"prefix_length": 24}}},
                "xe-0/0/1": {"ipv4": {"198.18.0.1": {"prefix_length": 24}}}
            }),
        ),
    );
    let h = Harness::new(builder.build(), connector);

    let outcome = h
        .run(NewPlan::new("arp", CollectorType::Arp, "junos"))
        .await
        .unwrap();

    assert!(outcome.entries.is_empty());
    assert_eq!(outcome.report.status, ReportStatus::Completed);
    assert!(logged(
        &outcome.log,
        LogLevel::Warning,
        "Could not find a NetBox prefix for `203.0.113.5` on interface `xe-0/0/0`."
    ));
    assert!(logged(
        &outcome.log,
        LogLevel::Warning,
        "Could not find interface `xe-0/0/7` in NetBox for `192.0.2.30 (00:1C:73:00:00:09)`"
    ));
    assert!(!logged(&outcome.log, LogLevel::Warning, "lo0.0"));
    assert!(h.inventory.mac_addresses().is_empty());
}

#[tokio::test]
async fn test_arp_vrf_resolution() {
    let builder = InventoryBuilder::new();
    let site = builder.site("dc1");
    let edge1 = builder.device("edge1", site, Some("10.0.0.1/32"));
    builder.interfaces(edge1.id, &["xe-0/0/0", "xe-0/0/1"]);
    let customer_a = builder.vrf("CUSTOMER_A");
    builder.prefix("198.51.100.0/24", Some(customer_a));
    builder.prefix("192.0.2.0/24", None);

    let connector = ScriptedConnector::new().device(
        "edge1",
        DeviceScript::new()
            .getter(
                Getter::ArpTable,
                json!([
                    {"interface": "xe-0/0/0", "mac": "00:1c:73:00:00:01", "ip": "192.0.2.10"},
                    {"interface": "xe-0/0/1", "mac": "00:1c:73:00:00:02", "ip": "198.51.100.20"}
                ]),
            )
            .getter(
                Getter::InterfacesIp,
                json!({
                    "xe-0/0/0": {"ipv4": {"192.0.2.1": {"prefix_length": 24}}},
                    "xe-0/0/1": {"ipv4": {"198.51.100.1": {"prefix_length": 24}}}
                }),
            )
            .getter(
                Getter::NetworkInstances,
                json!({
                    "CUSTOMER_A": {
                        "name": "CUSTOMER_A",
                        "type": "L3VRF",
                        "interfaces": {"interface": {"xe-0/0/1": {}}}
                    },
                    "CUSTOMER_B": {
                        "name": "CUSTOMER_B",
                        "type": "L3VRF",
                        "interfaces": {"interface": {"xe-0/0/0": {}}}
                    }
                }),
            ),
    );
    let h = Harness::new(builder.build(), connector);

    let outcome = h
        .run(NewPlan::new("arp", CollectorType::Arp, "junos"))
        .await
        .unwrap();

    assert_eq!(outcome.entries.len(), 2);
    assert_eq!(outcome.entries[0].detected_values["vrf"], "CUSTOMER_A");
    assert!(logged(
        &outcome.log,
        LogLevel::Warning,
        "Could not find a VRF named `CUSTOMER_B` in NetBox for interface `xe-0/0/0`."
    ));
    assert!(logged(
        &outcome.log,
        LogLevel::Warning,
        "Could not determine prefix length for `192.0.2.10` on interface `xe-0/0/0`. Skipping."
    ));

    let ips = h.inventory.ip_addresses();
    assert_eq!(ips.len(), 1);
    assert_eq!(ips[0].address.to_string(), "198.51.100.20/24");
    assert_eq!(ips[0].vrf, Some(customer_a));
}

#[tokio::test]
async fn test_ndp_collection() {
    let builder = InventoryBuilder::new();
    let site = builder.site("dc1");
    let edge1 = builder.device("edge1", site, Some("10.0.0.1/32"));
    builder.interface(edge1.id, "xe-0/0/0");
    builder.prefix("2001:db8::/64", None);

    let connector = ScriptedConnector::new().device(
        "edge1",
        DeviceScript::new()
            .getter(
                Getter::Ipv6NeighborsTable,
                json!([
                    {"interface": "xe-0/0/0", "mac": "00:1c:73:00:00:02", "ip": "2001:db8::10"},
                    {"interface": "xe-0/0/0", "mac": "00:1c:73:00:00:03", "ip": "fe80::1%xe-0/0/0"},
                    {"interface": "xe-0/0/0", "mac": "none", "ip": "2001:db8::11"}
                ]),
            )
            .getter(
                Getter::InterfacesIp,
                json!({"xe-0/0/0": {"ipv6": {"2001:db8::1": {"prefix_length": 64}}}}),
            )
            .getter(Getter::NetworkInstances, json!({})),
    );
    let h = Harness::new(builder.build(), connector);

    let outcome = h
        .run(NewPlan::new("ndp", CollectorType::Ndp, "junos"))
        .await
        .unwrap();

    assert_eq!(outcome.entries.len(), 2);
    assert!(outcome
        .entries
        .iter()
        .all(|e| e.collector_type == CollectorType::Ndp));
    assert!(logged(
        &outcome.log,
        LogLevel::Warning,
        "Could not determine prefix length for `fe80::1`"
    ));
    assert!(logged(
        &outcome.log,
        LogLevel::Success,
        "IPv6 Neighbor Discovery collection completed"
    ));

    let ips = h.inventory.ip_addresses();
    assert_eq!(ips.len(), 1);
    assert_eq!(ips[0].address.to_string(), "2001:db8::10/64");
    assert!(h.inventory.journal_entries()[0]
        .comments
        .ends_with("via IPv6 Neighbor Discovery collection."));
}
