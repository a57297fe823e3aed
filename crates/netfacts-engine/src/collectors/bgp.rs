//! BGP peers as host-route IP addresses, and their ASNs.

use async_trait::async_trait;
use netfacts_common::{fact_values, AbsoluteUrl, ObjectRef, ValuesExt};
use netfacts_driver::NetworkDriver;
use netfacts_inventory::Device;
use netfacts_types::{IpAddress, IpPrefix};
use tracing::debug;

use super::Collector;
use crate::apply::{ApplyContext, ApplyHandler};
use crate::context::{Fact, RunContext};
use crate::error::{FactsError, FactsResult};
use crate::model::FactsReportEntry;

/// Returns true if a BGP table key means the global routing table.
pub fn is_global_table(vrf: &str) -> bool {
    let vrf = vrf.trim();
    vrf.is_empty() || vrf.eq_ignore_ascii_case("global") || vrf.eq_ignore_ascii_case("default")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BgpCollector;

#[async_trait]
impl Collector for BgpCollector {
    async fn collect(
        &self,
        driver: &dyn NetworkDriver,
        device: &Device,
        ctx: &mut RunContext,
    ) -> FactsResult<()> {
        let table = driver.get_bgp_neighbors_detail().await?;

        for (vrf_name, peers_by_as) in &table {
            let vrf = if is_global_table(vrf_name) {
                None
            } else {
                let vrf = ctx.inventory().vrf_by_name(vrf_name).await?;
                if vrf.is_none() {
                    ctx.log.warning(format!(
                        "Could not find VRF `{}` in NetBox. Peers will be created in the global table.",
                        vrf_name
                    ));
                }
                vrf
            };

            for (remote_as, peers) in peers_by_as {
                for peer in peers {
                    let raw = peer.remote_address.trim();
                    if raw.is_empty() {
                        continue;
                    }
                    let Ok(address) = IpAddress::parse_scoped(raw) else {
                        ctx.log
                            .warning(format!("Invalid IP address `{}`. Skipping.", raw));
                        continue;
                    };
                    let host = IpPrefix::host(address);

                    let existing = ctx
                        .inventory()
                        .find_ip(&host, vrf.as_ref().map(|v| v.id))
                        .await?;
                    let detected = fact_values! {
                        "remote_address" => address.to_string(),
                        "remote_as" => remote_as,
                        "vrf" => vrf.as_ref().map(|v| v.name.clone()),
                        "state" => if peer.up { "up" } else { "down" },
                    };
                    let fact = Fact::existing_or_new(
                        existing.map(|ip| ip.id.into()),
                        format!("BGP peer {} AS{}", address, remote_as),
                        detected,
                    );
                    ctx.commit(device, fact).await;
                }
            }
        }

        ctx.log.success("BGP collection completed");
        Ok(())
    }
}

/// Creates the peer address and, when an RIR is configured, its ASN.
#[derive(Debug, Clone, Copy, Default)]
pub struct BgpPeerApplier;

impl BgpPeerApplier {
    async fn ensure_asn(asn: u32, cx: &mut ApplyContext<'_>) -> FactsResult<()> {
        let rir = match cx.config.asn.rir.as_deref() {
            Some(name) => cx.inventory.rir_by_name(name).await?,
            None => None,
        };
        let Some(rir) = rir else {
            cx.log.warning(format!(
                "No RIR exists in NetBox. Cannot create ASN {}.",
                asn
            ));
            return Ok(());
        };

        let (record, created) = cx
            .inventory
            .get_or_create_asn(asn, rir.id, cx.creation())
            .await?;
        if created {
            debug!(asn = record.asn, rir = %rir.name, "Created ASN");
        }
        Ok(())
    }
}

#[async_trait]
impl ApplyHandler for BgpPeerApplier {
    async fn apply(
        &self,
        entry: &FactsReportEntry,
        cx: &mut ApplyContext<'_>,
    ) -> FactsResult<Option<ObjectRef>> {
        let values = &entry.detected_values;
        let Some(raw) = values.get_non_empty("remote_address") else {
            return Ok(None);
        };
        let address = IpAddress::parse_scoped(raw)
            .map_err(|_| FactsError::invalid_entry(format!("Invalid IP: {}", raw)))?;
        let remote_as = values.get_u64("remote_as").and_then(|n| u32::try_from(n).ok());
        let as_label = remote_as.map(|n| n.to_string()).unwrap_or_default();

        let vrf = match values.get_non_empty("vrf") {
            Some(name) => cx.inventory.vrf_by_name(name).await?,
            None => None,
        };

        if let Some(asn) = remote_as {
            Self::ensure_asn(asn, cx).await?;
        }

        let creation = cx.creation().with_description(format!(
            "BGP peer AS{} discovered on {}",
            as_label, cx.now
        ));
        let (ip, created) = cx
            .inventory
            .get_or_create_ip(IpPrefix::host(address), vrf.as_ref().map(|v| v.id), creation)
            .await?;

        if created {
            let device = cx.device(entry.device).await?;
            let mut note = format!(
                "BGP peer discovered by {}: AS{} remote address `{}`",
                device.markdown(false, true),
                as_label,
                address
            );
            if let Some(vrf) = &vrf {
                note.push_str(&format!(" in VRF `{}`", vrf.name));
            }
            note.push('.');
            cx.inventory.add_journal_entry(ip.id.into(), note).await?;
            cx.log.success(format!(
                "Created peer IP {} (AS{}).",
                ip.markdown(false, true),
                as_label
            ));
        } else {
            cx.log.info(format!(
                "Found existing peer IP {}.",
                ip.markdown(false, true)
            ));
        }

        Ok(Some(ip.id.into()))
    }
}
