//! Device serial number, OS version and hostname.

use async_trait::async_trait;
use netfacts_common::{fact_values, EntryAction, ObjectRef, ValuesExt};
use netfacts_driver::NetworkDriver;
use netfacts_inventory::Device;

use super::Collector;
use crate::apply::{ApplyContext, ApplyHandler};
use crate::context::{Fact, RunContext};
use crate::error::FactsResult;
use crate::model::FactsReportEntry;

#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryCollector;

#[async_trait]
impl Collector for InventoryCollector {
    async fn collect(
        &self,
        driver: &dyn NetworkDriver,
        device: &Device,
        ctx: &mut RunContext,
    ) -> FactsResult<()> {
        let facts = driver.get_facts().await?;
        let new_serial = facts.serial_number.trim();

        let action = if !new_serial.is_empty() && device.serial != new_serial {
            EntryAction::Changed
        } else {
            EntryAction::Confirmed
        };

        let detected = fact_values! {
            "serial_number" => new_serial,
            "os_version" => facts.os_version,
            "hostname" => facts.hostname,
            "fqdn" => facts.fqdn,
        };
        let current = fact_values! { "serial_number" => device.serial };

        let fact = Fact::new(action, format!("Device {}", device.name), detected)
            .with_current(current)
            .with_object(Some(device.id.into()));
        ctx.commit(device, fact).await;

        ctx.log.success("Inventory collection completed");
        Ok(())
    }
}

/// Journal note written when the serial number changes.
fn inventory_note(entry: &FactsReportEntry) -> String {
    let detected = &entry.detected_values;
    let mut changes = vec![format!(
        "Serial: `{}` → `{}`",
        entry.current_values.get_str_or("serial_number", ""),
        detected.get_str_or("serial_number", "")
    )];
    if let Some(version) = detected.get_non_empty("os_version") {
        changes.push(format!("OS version: `{}`", version));
    }
    if let Some(hostname) = detected.get_non_empty("hostname") {
        let mut line = format!("Hostname: `{}`", hostname);
        if let Some(fqdn) = detected.get_non_empty("fqdn") {
            line.push_str(&format!(" (FQDN: `{}`)", fqdn));
        }
        changes.push(line);
    }

    let lines: Vec<String> = changes.iter().map(|c| format!("- {}", c)).collect();
    format!("Inventory facts collected:\n{}", lines.join("\n"))
}

/// Overwrites the device serial for `changed` entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryApplier;

#[async_trait]
impl ApplyHandler for InventoryApplier {
    async fn apply(
        &self,
        entry: &FactsReportEntry,
        cx: &mut ApplyContext<'_>,
    ) -> FactsResult<Option<ObjectRef>> {
        let new_serial = entry.detected_values.get_non_empty("serial_number");

        if let (Some(serial), EntryAction::Changed) = (new_serial, entry.action) {
            cx.inventory.update_device_serial(entry.device, serial).await?;
            cx.inventory
                .add_journal_entry(entry.device.into(), inventory_note(entry))
                .await?;
            cx.log.success(format!("Updated serial number to `{}`.", serial));
        }

        Ok(Some(entry.device.into()))
    }
}
