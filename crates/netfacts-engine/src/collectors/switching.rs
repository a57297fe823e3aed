//! Learned MAC addresses from the ethernet switching table.

use async_trait::async_trait;
use netfacts_common::{fact_values, AbsoluteUrl, CollectorType, ObjectRef, ValuesExt};
use netfacts_driver::NetworkDriver;
use netfacts_inventory::{Device, MacUpdate};
use netfacts_types::MacAddress;

use super::Collector;
use crate::apply::{ApplyContext, ApplyHandler};
use crate::context::{Fact, RunContext};
use crate::error::{FactsError, FactsResult};
use crate::model::FactsReportEntry;

#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchingCollector;

#[async_trait]
impl Collector for SwitchingCollector {
    async fn collect(
        &self,
        driver: &dyn NetworkDriver,
        device: &Device,
        ctx: &mut RunContext,
    ) -> FactsResult<()> {
        let table = driver.get_mac_address_table().await?;

        for row in &table {
            let Some(mac) = row.mac else {
                continue;
            };
            let name = row.interface.trim();
            if name.is_empty() || !ctx.interface_matches(name) {
                continue;
            }

            if ctx.inventory().interface(device.id, name).await?.is_none() {
                ctx.log.warning(format!(
                    "Could not find interface `{}` in NetBox. Skipping.",
                    name
                ));
                continue;
            }

            let existing = ctx.inventory().find_mac(&mac).await?;
            let detected = fact_values! {
                "mac" => mac.to_string(),
                "interface" => name,
                "vlan" => row.vlan,
            };
            let fact = Fact::existing_or_new(
                existing.map(|m| m.id.into()),
                format!("MAC {} on {}", mac, name),
                detected,
            );
            ctx.commit(device, fact).await;
        }

        ctx.log.success("Ethernet switching collection completed");
        Ok(())
    }
}

/// Links a learned MAC address to the interface it was seen on.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchingApplier;

#[async_trait]
impl ApplyHandler for SwitchingApplier {
    async fn apply(
        &self,
        entry: &FactsReportEntry,
        cx: &mut ApplyContext<'_>,
    ) -> FactsResult<Option<ObjectRef>> {
        let values = &entry.detected_values;
        let Some(raw) = values.get_non_empty("mac") else {
            return Ok(None);
        };
        let mac: MacAddress = raw.parse().map_err(|e| {
            FactsError::invalid_entry(format!("Invalid MAC address `{}`: {}", raw, e))
        })?;

        let (record, created) = cx.inventory.get_or_create_mac(mac, cx.creation()).await?;
        if created {
            cx.log.success(format!(
                "Created MAC address {}.",
                record.markdown(false, true)
            ));
        }

        let mut update = MacUpdate::seen(cx.now, CollectorType::EthernetSwitching);
        if let Some(name) = values.get_non_empty("interface") {
            update.add_interface = cx
                .inventory
                .interface(entry.device, name)
                .await?
                .map(|iface| iface.id);
        }
        let record = cx.inventory.update_mac(record.id, update).await?;
        Ok(Some(record.id.into()))
    }
}
