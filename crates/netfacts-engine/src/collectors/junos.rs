//! Junos-only collectors built on raw CLI output.
//!
//! These run only for plans whose driver is Junos; see
//! [`VendorRegistry`](super::vendor::VendorRegistry).

use async_trait::async_trait;
use netfacts_common::{fact_values, AbsoluteUrl, CollectorType, EntryAction, ObjectRef, ValuesExt};
use netfacts_driver::NetworkDriver;
use netfacts_inventory::{Device, MacUpdate};
use netfacts_types::{IpAddress, IpPrefix, MacAddress};
use once_cell::sync::Lazy;
use regex::Regex;

use super::Collector;
use crate::apply::{ApplyContext, ApplyHandler};
use crate::context::{Fact, RunContext};
use crate::error::{FactsError, FactsResult};
use crate::model::FactsReportEntry;

pub const SHOW_OSPF_NEIGHBOR: &str = "show ospf neighbor";
pub const SHOW_EVPN_MAC_TABLE: &str = "show evpn mac-table";
pub const SHOW_L2CIRCUIT_CONNECTIONS: &str = "show l2circuit connections";

/// Raw output stored in journals and entries is cut to this many characters.
const MAX_RAW_OUTPUT: usize = 2000;

static OSPF_NEIGHBOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(\d+\.\d+\.\d+\.\d+)\s+(\S+)\s+(\S+)\s+(\d+\.\d+\.\d+\.\d+)")
        .expect("Invalid regex pattern")
});

static EVPN_MAC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2}){5})").expect("Invalid regex pattern")
});

fn truncate(raw: &str) -> String {
    raw.chars().take(MAX_RAW_OUTPUT).collect()
}

/// Runs one CLI command. `None` means there is nothing to parse and the
/// reason has been logged.
async fn run_command(
    driver: &dyn NetworkDriver,
    ctx: &mut RunContext,
    command: &str,
    topic: &str,
) -> Option<String> {
    match driver.cli(&[command]).await {
        Ok(mut output) => {
            let raw = output.remove(command).unwrap_or_default();
            if raw.trim().is_empty() {
                ctx.log.info(format!("No {} data found.", topic));
                None
            } else {
                Some(raw)
            }
        }
        Err(e) => {
            ctx.log
                .failure(format!("Failed to retrieve {} data: {}", topic, e));
            None
        }
    }
}

/// One row of `show ospf neighbor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OspfNeighbor {
    pub address: IpAddress,
    pub interface: String,
    pub state: String,
    pub router_id: String,
}

/// Parses `show ospf neighbor` output. Header and malformed rows are ignored.
pub fn parse_ospf_neighbors(raw: &str) -> Vec<OspfNeighbor> {
    OSPF_NEIGHBOR_RE
        .captures_iter(raw)
        .filter_map(|caps| {
            Some(OspfNeighbor {
                address: caps[1].parse().ok()?,
                interface: caps[2].to_string(),
                state: caps[3].to_string(),
                router_id: caps[4].to_string(),
            })
        })
        .collect()
}

/// Parses `show evpn mac-table`, one MAC per matching line.
pub fn parse_evpn_macs(raw: &str) -> Vec<MacAddress> {
    raw.lines()
        .filter_map(|line| EVPN_MAC_RE.find(line))
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OspfCollector;

#[async_trait]
impl Collector for OspfCollector {
    async fn collect(
        &self,
        driver: &dyn NetworkDriver,
        device: &Device,
        ctx: &mut RunContext,
    ) -> FactsResult<()> {
        let Some(raw) = run_command(driver, ctx, SHOW_OSPF_NEIGHBOR, "OSPF neighbor").await else {
            return Ok(());
        };

        let neighbors = parse_ospf_neighbors(&raw);
        for neighbor in &neighbors {
            let existing = ctx
                .inventory()
                .find_ip(&IpPrefix::host(neighbor.address), None)
                .await?;
            let detected = fact_values! {
                "address" => neighbor.address.to_string(),
                "interface" => neighbor.interface,
                "state" => neighbor.state,
                "router_id" => neighbor.router_id,
            };
            let fact = Fact::existing_or_new(
                existing.map(|ip| ip.id.into()),
                format!("OSPF neighbor {} (RID: {})", neighbor.address, neighbor.router_id),
                detected,
            );
            ctx.commit(device, fact).await;
        }

        if ctx.should_apply() && !neighbors.is_empty() {
            let lines: Vec<String> = neighbors
                .iter()
                .map(|n| {
                    format!(
                        "- `{}` on `{}` (State: {}, Router ID: {})",
                        n.address, n.interface, n.state, n.router_id
                    )
                })
                .collect();
            ctx.inventory()
                .add_journal_entry(
                    device.id.into(),
                    format!("OSPF neighbors discovered:\n{}", lines.join("\n")),
                )
                .await?;
        }

        ctx.log.success("OSPF collection completed");
        Ok(())
    }
}

/// Creates the neighbor address as a global host route.
#[derive(Debug, Clone, Copy, Default)]
pub struct OspfApplier;

#[async_trait]
impl ApplyHandler for OspfApplier {
    async fn apply(
        &self,
        entry: &FactsReportEntry,
        cx: &mut ApplyContext<'_>,
    ) -> FactsResult<Option<ObjectRef>> {
        let values = &entry.detected_values;
        let Some(raw) = values.get_non_empty("address") else {
            return Err(FactsError::invalid_entry("Missing OSPF neighbor address"));
        };
        let address: IpAddress = raw
            .parse()
            .map_err(|_| FactsError::invalid_entry(format!("Invalid IP: {}", raw)))?;
        let router_id = values.get_str_or("router_id", "");

        let device = cx.device(entry.device).await?;
        let creation = cx.creation().with_description(format!(
            "OSPF neighbor (Router ID: {}) discovered on {} ({})",
            router_id,
            device.name,
            cx.now.date_naive()
        ));
        let (ip, created) = cx
            .inventory
            .get_or_create_ip(IpPrefix::host(address), None, creation)
            .await?;
        if created {
            cx.log.success(format!(
                "Created OSPF neighbor IP {} (Router ID: {}).",
                ip.markdown(false, true),
                router_id
            ));
        }
        Ok(Some(ip.id.into()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EvpnCollector;

#[async_trait]
impl Collector for EvpnCollector {
    async fn collect(
        &self,
        driver: &dyn NetworkDriver,
        device: &Device,
        ctx: &mut RunContext,
    ) -> FactsResult<()> {
        let Some(raw) = run_command(driver, ctx, SHOW_EVPN_MAC_TABLE, "EVPN").await else {
            return Ok(());
        };

        for mac in parse_evpn_macs(&raw) {
            let existing = ctx.inventory().find_mac(&mac).await?;
            let fact = Fact::existing_or_new(
                existing.map(|m| m.id.into()),
                format!("EVPN MAC {}", mac),
                fact_values! { "mac" => mac.to_string() },
            );
            ctx.commit(device, fact).await;
        }

        if ctx.should_apply() {
            ctx.inventory()
                .add_journal_entry(
                    device.id.into(),
                    format!("EVPN data collected:\n```\n{}\n```", truncate(&raw)),
                )
                .await?;
        }

        ctx.log.success("EVPN collection completed");
        Ok(())
    }
}

/// Creates EVPN-learned MAC addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvpnApplier;

#[async_trait]
impl ApplyHandler for EvpnApplier {
    async fn apply(
        &self,
        entry: &FactsReportEntry,
        cx: &mut ApplyContext<'_>,
    ) -> FactsResult<Option<ObjectRef>> {
        let Some(raw) = entry.detected_values.get_non_empty("mac") else {
            return Err(FactsError::invalid_entry("Missing EVPN MAC address"));
        };
        let mac: MacAddress = raw.parse().map_err(|e| {
            FactsError::invalid_entry(format!("Invalid MAC address `{}`: {}", raw, e))
        })?;

        let (record, created) = cx.inventory.get_or_create_mac(mac, cx.creation()).await?;
        if created {
            cx.log
                .success(format!("Created EVPN MAC {}.", record.markdown(false, true)));
        }
        let record = cx
            .inventory
            .update_mac(record.id, MacUpdate::seen(cx.now, CollectorType::Evpn))
            .await?;
        Ok(Some(record.id.into()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct L2CircuitCollector;

#[async_trait]
impl Collector for L2CircuitCollector {
    async fn collect(
        &self,
        driver: &dyn NetworkDriver,
        device: &Device,
        ctx: &mut RunContext,
    ) -> FactsResult<()> {
        let Some(raw) = run_command(driver, ctx, SHOW_L2CIRCUIT_CONNECTIONS, "L2 circuit").await
        else {
            return Ok(());
        };

        let fact = Fact::new(
            EntryAction::Confirmed,
            format!("L2 circuit data on {}", device.name),
            fact_values! { "raw_output" => truncate(&raw) },
        )
        .with_object(Some(device.id.into()));
        ctx.commit(device, fact).await;

        ctx.log.success("L2 circuit collection completed");
        Ok(())
    }
}

/// Journals the captured L2 circuit output on the device.
#[derive(Debug, Clone, Copy, Default)]
pub struct L2CircuitApplier;

#[async_trait]
impl ApplyHandler for L2CircuitApplier {
    async fn apply(
        &self,
        entry: &FactsReportEntry,
        cx: &mut ApplyContext<'_>,
    ) -> FactsResult<Option<ObjectRef>> {
        let raw = entry.detected_values.get_str_or("raw_output", "");
        cx.inventory
            .add_journal_entry(
                entry.device.into(),
                format!("L2 circuit data collected:\n```\n{}\n```", raw),
            )
            .await?;
        Ok(Some(entry.device.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const OSPF_OUTPUT: &str = "\
Address          Interface              State           ID               Pri  Dead
10.0.0.1         ge-0/0/0.0             Full            192.168.0.1      128    33
10.0.0.5         ge-0/0/1.0             Init            192.168.0.5      128    37
";

    #[test]
    fn test_parse_ospf_neighbors() {
        let neighbors = parse_ospf_neighbors(OSPF_OUTPUT);
        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].address.to_string(), "10.0.0.1");
        assert_eq!(neighbors[0].interface, "ge-0/0/0.0");
        assert_eq!(neighbors[0].state, "Full");
        assert_eq!(neighbors[1].router_id, "192.168.0.5");
    }

    #[test]
    fn test_parse_evpn_macs_per_line() {
        let raw = "\
MAC address       Logical interface   Active source
00:1c:73:00:00:01 vtep.32769          10.1.1.1
00:1c:73:00:00:02 ae0.0
00:1c:73:00:00:01 vtep.32770          10.1.1.2
";
        let macs: Vec<String> = parse_evpn_macs(raw).iter().map(|m| m.to_string()).collect();
        assert_eq!(
            macs,
            vec!["00:1C:73:00:00:01", "00:1C:73:00:00:02", "00:1C:73:00:00:01"]
        );
    }

    #[test]
    fn test_truncate_counts_chars() {
        let raw = "é".repeat(MAX_RAW_OUTPUT + 10);
        assert_eq!(truncate(&raw).chars().count(), MAX_RAW_OUTPUT);
    }
}
