//! Interface hardware addresses.

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
pub struct InterfacesCollector;

#[async_trait]
impl Collector for InterfacesCollector {
    async fn collect(
        &self,
        driver: &dyn NetworkDriver,
        device: &Device,
        ctx: &mut RunContext,
    ) -> FactsResult<()> {
        let interfaces = driver.get_interfaces().await?;

        for (name, detail) in &interfaces {
            if !ctx.interface_matches(name) {
                continue;
            }
            let Some(mac) = detail.mac_address else {
                continue;
            };

            let Some(interface) = ctx.inventory().interface(device.id, name).await? else {
                ctx.log.warning(format!(
                    "Could not find interface `{}` in NetBox. Skipping.",
                    name
                ));
                continue;
            };

            let existing = ctx.inventory().find_mac(&mac).await?;
            let action_object = existing
                .as_ref()
                .map(|m| ObjectRef::from(m.id))
                .unwrap_or_else(|| interface.id.into());

            let detected = fact_values! {
                "interface" => name,
                "mac_address" => mac.to_string(),
                "is_enabled" => detail.is_enabled,
                "speed" => detail.speed,
                "mtu" => detail.mtu,
                "is_up" => detail.is_up,
            };
            let fact = Fact::existing_or_new(
                existing.map(|m| m.id.into()),
                format!("Interface {} MAC {}", name, mac),
                detected,
            )
            .with_object(Some(action_object));

            ctx.commit(device, fact).await;
        }

        ctx.log.success("Interface collection completed");
        Ok(())
    }
}

/// Makes the interface the owner of its MAC address.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterfaceMacApplier;

#[async_trait]
impl ApplyHandler for InterfaceMacApplier {
    async fn apply(
        &self,
        entry: &FactsReportEntry,
        cx: &mut ApplyContext<'_>,
    ) -> FactsResult<Option<ObjectRef>> {
        let values = &entry.detected_values;
        let Some(raw) = values.get_non_empty("mac_address") else {
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

        let mut update = MacUpdate::seen(cx.now, CollectorType::Interfaces);
        if let Some(name) = values.get_non_empty("interface") {
            update.device_interface = cx
                .inventory
                .interface(entry.device, name)
                .await?
                .map(|iface| iface.id);
        }
        let record = cx.inventory.update_mac(record.id, update).await?;
        Ok(Some(record.id.into()))
    }
}
