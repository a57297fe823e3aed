//! Cabling from LLDP adjacencies.
//!
//! A cable is proposed only when both ends resolve, both devices share a
//! site, and neither interface is cabled yet. The applier checks the same
//! conditions again since the inventory may have moved on since detection.

use async_trait::async_trait;
use netfacts_common::{fact_values, AbsoluteUrl, EntryAction, ObjectRef, ValuesExt};
use netfacts_driver::NetworkDriver;
use netfacts_inventory::{Device, InventoryError};

use super::Collector;
use crate::apply::{ApplyContext, ApplyHandler};
use crate::context::{Fact, RunContext};
use crate::error::{FactsError, FactsResult};
use crate::model::FactsReportEntry;

#[derive(Debug, Clone, Copy, Default)]
pub struct LldpCollector;

#[async_trait]
impl Collector for LldpCollector {
    async fn collect(
        &self,
        driver: &dyn NetworkDriver,
        device: &Device,
        ctx: &mut RunContext,
    ) -> FactsResult<()> {
        let table = driver.get_lldp_neighbors_detail().await?;

        for (local_name, neighbors) in &table {
            let Some(mut local) = ctx.inventory().interface(device.id, local_name).await? else {
                ctx.log.warning(format!(
                    "Could not find local interface `{}` in NetBox. Skipping.",
                    local_name
                ));
                continue;
            };

            for neighbor in neighbors {
                let remote_name = neighbor.remote_system_name.trim();
                let remote_port = neighbor.remote_port.trim();
                if remote_name.is_empty() || remote_port.is_empty() {
                    continue;
                }

                let Some(remote_device) = ctx.inventory().device_by_name(remote_name).await? else {
                    ctx.log.info(format!(
                        "Remote device `{}` not found in NetBox. Skipping cable creation.",
                        remote_name
                    ));
                    continue;
                };

                if remote_device.site != device.site {
                    ctx.log.info(format!(
                        "Remote device `{}` is in a different site. Skipping cable creation.",
                        remote_name
                    ));
                    continue;
                }

                let Some(remote) = ctx
                    .inventory()
                    .interface(remote_device.id, remote_port)
                    .await?
                else {
                    ctx.log.warning(format!(
                        "Could not find remote interface `{}` on `{}`. Skipping.",
                        remote_port, remote_name
                    ));
                    continue;
                };

                if local.cable.is_some() {
                    ctx.log.info(format!(
                        "Local interface `{}` already has a cable. Skipping.",
                        local_name
                    ));
                    continue;
                }
                if remote.cable.is_some() {
                    ctx.log.info(format!(
                        "Remote interface `{}` on `{}` already has a cable. Skipping.",
                        remote_port, remote_name
                    ));
                    continue;
                }

                let detected = fact_values! {
                    "local_interface" => local_name,
                    "remote_device" => remote_name,
                    "remote_interface" => remote_port,
                    "remote_chassis_id" => neighbor.remote_chassis_id,
                };
                let fact = Fact::new(
                    EntryAction::New,
                    format!("Cable {} ↔ {}:{}", local_name, remote_name, remote_port),
                    detected,
                );
                ctx.commit(device, fact).await;

                if let Some(refreshed) = ctx.inventory().interface(device.id, local_name).await? {
                    local = refreshed;
                }
            }
        }

        ctx.log.success("LLDP collection completed");
        Ok(())
    }
}

/// Creates the cable for an LLDP entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct CableApplier;

#[async_trait]
impl ApplyHandler for CableApplier {
    async fn apply(
        &self,
        entry: &FactsReportEntry,
        cx: &mut ApplyContext<'_>,
    ) -> FactsResult<Option<ObjectRef>> {
        let values = &entry.detected_values;
        let (Some(local_name), Some(remote_name), Some(remote_port)) = (
            values.get_non_empty("local_interface"),
            values.get_non_empty("remote_device"),
            values.get_non_empty("remote_interface"),
        ) else {
            return Err(FactsError::invalid_entry("Missing LLDP entry data"));
        };

        let device = cx.device(entry.device).await?;
        let local = cx
            .inventory
            .interface(device.id, local_name)
            .await?
            .ok_or_else(|| InventoryError::not_found("interface", local_name))?;
        let remote_device = cx
            .inventory
            .device_by_name(remote_name)
            .await?
            .ok_or_else(|| InventoryError::not_found("device", remote_name))?;
        let remote = cx
            .inventory
            .interface(remote_device.id, remote_port)
            .await?
            .ok_or_else(|| InventoryError::not_found("interface", remote_port))?;

        if local.cable.is_some() || remote.cable.is_some() {
            return Err(FactsError::invalid_entry("Interface already has a cable"));
        }

        let cable = match cx
            .inventory
            .create_cable(local.id, remote.id, cx.creation())
            .await
        {
            Ok(cable) => cable,
            Err(e) => {
                cx.log.warning(format!(
                    "Could not create cable between `{}` and `{}:{}`: {}",
                    local_name, remote_name, remote_port, e
                ));
                return Err(e.into());
            }
        };

        cx.inventory
            .add_journal_entry(
                device.id.into(),
                format!(
                    "LLDP: Created cable between `{}` and `{}:{}`.",
                    local_name, remote_name, remote_port
                ),
            )
            .await?;
        cx.log.success(format!(
            "Created cable {} between `{}` and `{}:{}`.",
            cable.markdown(false, true),
            local_name,
            remote_name,
            remote_port
        ));

        Ok(Some(cable.id.into()))
    }
}
