mod common;

use common::Harness;
use netfacts_common::{CollectorType, EntryId, EntryStatus, ReportStatus};
use netfacts_driver::Getter;
use netfacts_engine::{ApplyRegistry, FactsError, NewPlan, Reconciler, RunOutcome};
use netfacts_inventory::InventoryStore;
use netfacts_test::{DeviceScript, InventoryBuilder, ScriptedConnector};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

/// One device with two ARP neighbors on a known prefix.
fn arp_harness() -> Harness {
    let builder = InventoryBuilder::new();
    let site = builder.site("dc1");
    let edge1 = builder.device("edge1", site, Some("10.0.0.1/32"));
    builder.interface(edge1.id, "xe-0/0/0");
    builder.prefix("192.0.2.0/24", None);

    let connector = ScriptedConnector::new().device(
        "edge1",
        DeviceScript::new()
            .getter(
                Getter::ArpTable,
                json!([
                    {"interface": "xe-0/0/0", "mac": "00:1c:73:00:00:01", "ip": "192.0.2.10"},
                    {"interface": "xe-0/0/0", "mac": "00:1c:73:00:00:02", "ip": "192.0.2.11"}
                ]),
            )
            .getter(
                Getter::InterfacesIp,
                json!({"xe-0/0/0": {"ipv4": {"192.0.2.1": {"prefix_length": 24}}}}),
            )
            .getter(Getter::NetworkInstances, json!({})),
    );
    Harness::new(builder.build(), connector)
}

async fn detect(h: &Harness) -> RunOutcome {
    h.run(NewPlan::new("arp", CollectorType::Arp, "junos").detect_only())
        .await
        .unwrap()
}

fn ids(outcome: &RunOutcome) -> Vec<EntryId> {
    outcome.entries.iter().map(|e| e.id).collect()
}

#[tokio::test]
async fn test_detect_only_then_apply() {
    let h = arp_harness();
    let outcome = detect(&h).await;

    assert_eq!(outcome.entries.len(), 4);
    assert!(outcome.entries.iter().all(|e| e.is_pending()));
    assert_eq!(outcome.report.status, ReportStatus::Pending);
    assert!(h.inventory.mac_addresses().is_empty());

    let reconciler = h.reconciler();
    let all = ids(&outcome);
    let (applied, failed) = reconciler
        .apply_entries(outcome.report.id, &all)
        .await
        .unwrap();
    assert_eq!((applied, failed), (4, 0));
    assert_eq!(h.inventory.mac_addresses().len(), 2);
    assert_eq!(h.inventory.ip_addresses().len(), 2);

    let report = h.staging.report(outcome.report.id).unwrap();
    assert_eq!(report.status, ReportStatus::Applied);
    assert!(report.completed_at.is_some());
    for entry in h.staging.entries(outcome.report.id) {
        assert_eq!(entry.status, EntryStatus::Applied);
        assert!(entry.applied_at.is_some());
        assert!(entry.object.is_some());
    }

    // Nothing is pending any more.
    assert_eq!(
        reconciler
            .apply_entries(outcome.report.id, &all)
            .await
            .unwrap(),
        (0, 0)
    );
    assert_eq!(reconciler.skip_entries(outcome.report.id, &all).unwrap(), 0);
}

#[tokio::test]
async fn test_partial_review() {
    let h = arp_harness();
    let outcome = detect(&h).await;
    let all = ids(&outcome);
    let reconciler = h.reconciler();

    assert_eq!(
        reconciler
            .apply_entries(outcome.report.id, &all[..2])
            .await
            .unwrap(),
        (2, 0)
    );
    let report = h.staging.report(outcome.report.id).unwrap();
    assert_eq!(report.status, ReportStatus::Partial);
    assert!(report.completed_at.is_none());

    // Duplicate ids count once.
    let skipped = reconciler
        .skip_entries(outcome.report.id, &[all[2], all[3], all[3]])
        .unwrap();
    assert_eq!(skipped, 2);

    let report = h.staging.report(outcome.report.id).unwrap();
    assert_eq!(report.status, ReportStatus::Applied);
    let skipped: Vec<_> = h
        .staging
        .entries(outcome.report.id)
        .into_iter()
        .filter(|e| e.status == EntryStatus::Skipped)
        .collect();
    assert_eq!(skipped.len(), 2);
}

#[tokio::test]
async fn test_skip_everything() {
    let h = arp_harness();
    let outcome = detect(&h).await;

    let count = h
        .reconciler()
        .skip_entries(outcome.report.id, &ids(&outcome))
        .unwrap();
    assert_eq!(count, 4);
    assert_eq!(
        h.staging.report(outcome.report.id).unwrap().status,
        ReportStatus::Completed
    );
    assert!(h.inventory.mac_addresses().is_empty());
}

#[tokio::test]
async fn test_skipped_entry_cannot_be_applied() {
    let h = arp_harness();
    let outcome = detect(&h).await;
    let reconciler = h.reconciler();
    let first = outcome.entries[0].id;

    assert_eq!(reconciler.skip_entries(outcome.report.id, &[first]).unwrap(), 1);
    assert_eq!(
        reconciler
            .apply_entries(outcome.report.id, &[first])
            .await
            .unwrap(),
        (0, 0)
    );
    assert_eq!(
        h.staging.entry(first).unwrap().status,
        EntryStatus::Skipped
    );
    assert!(h.inventory.mac_addresses().is_empty());
}

#[tokio::test]
async fn test_missing_handler_fails_entries() {
    let h = arp_harness();
    let outcome = detect(&h).await;

    let reconciler = Reconciler::new(
        Arc::clone(&h.inventory) as Arc<dyn InventoryStore>,
        Arc::clone(&h.staging),
        Arc::new(ApplyRegistry::empty()),
        Arc::clone(&h.config),
    );
    let (applied, failed) = reconciler
        .apply_entries(outcome.report.id, &ids(&outcome))
        .await
        .unwrap();
    assert_eq!((applied, failed), (0, 4));

    let entries = h.staging.entries(outcome.report.id);
    assert!(entries.iter().all(|e| e.status == EntryStatus::Failed));
    assert_eq!(
        entries[0].error_message,
        "No apply handler for collector type 'arp'"
    );
    assert_eq!(
        h.staging.report(outcome.report.id).unwrap().status,
        ReportStatus::Failed
    );
}

#[tokio::test]
async fn test_unknown_report() {
    let h = arp_harness();
    let reconciler = h.reconciler();
    let missing = netfacts_common::ReportId(999);

    let err = reconciler.apply_entries(missing, &[]).await.unwrap_err();
    assert!(matches!(err, FactsError::ReportNotFound(id) if id == missing));
    assert!(reconciler.skip_entries(missing, &[]).is_err());
}

#[tokio::test]
async fn test_entries_of_other_reports_are_ignored() {
    let h = arp_harness();
    let first = detect(&h).await;
    let second = h
        .run(NewPlan::new("arp-again", CollectorType::Arp, "junos").detect_only())
        .await
        .unwrap();

    let (applied, _) = h
        .reconciler()
        .apply_entries(second.report.id, &ids(&first))
        .await
        .unwrap();
    assert_eq!(applied, 0);
    assert!(h
        .staging
        .entries(first.report.id)
        .iter()
        .all(|e| e.is_pending()));
}
