//! ARP and IPv6 neighbor discovery.
//!
//! Every usable neighbor yields two entries sharing one value bag: a MAC
//! entry and an IP entry, told apart by [`FactKind`].

use async_trait::async_trait;
use itertools::Itertools;
use netfacts_common::{
    fact_values, AbsoluteUrl, CollectorType, FactKind, ObjectRef, ValuesExt,
};
use netfacts_driver::{IpNeighbor, NetworkDriver};
use netfacts_inventory::{Device, MacUpdate};
use netfacts_types::{IpPrefix, MacAddress};

use super::Collector;
use crate::apply::{ApplyContext, ApplyHandler};
use crate::context::{Fact, RunContext};
use crate::error::{FactsError, FactsResult};
use crate::helpers::{
    network_instances_by_interface, parse_network_instances, resolve_interfaces_ip,
    resolve_network_instances, InterfaceAddress, VrfResolution,
};
use crate::model::FactsReportEntry;

/// Above this many neighbors, a missing interface is reported by count.
const MAX_LISTED_NEIGHBORS: usize = 5;

/// Collects the ARP table (`arp`) or the IPv6 neighbor table (`ndp`).
#[derive(Debug, Clone, Copy)]
pub struct NeighborCollector {
    collector_type: CollectorType,
}

impl NeighborCollector {
    pub const ARP: Self = Self {
        collector_type: CollectorType::Arp,
    };

    pub const NDP: Self = Self {
        collector_type: CollectorType::Ndp,
    };
}

#[async_trait]
impl Collector for NeighborCollector {
    async fn collect(
        &self,
        driver: &dyn NetworkDriver,
        device: &Device,
        ctx: &mut RunContext,
    ) -> FactsResult<()> {
        let (table, done) = match self.collector_type {
            CollectorType::Ndp => (
                driver.get_ipv6_neighbors_table().await?,
                "IPv6 Neighbor Discovery collection completed",
            ),
            _ => (driver.get_arp_table(None).await?, "ARP collection completed"),
        };

        collect_ip_neighbors(driver, device, ctx, table).await?;
        ctx.log.success(done);
        Ok(())
    }
}

fn missing_interface_message(interface: &str, neighbors: &[IpNeighbor]) -> String {
    let mut message = format!("Could not find interface `{}` in NetBox for ", interface);
    if neighbors.len() > MAX_LISTED_NEIGHBORS {
        message.push_str(&format!("{} ARP entries", neighbors.len()));
    } else {
        let listed = neighbors
            .iter()
            .map(|n| {
                let mac = n.mac.map(|m| m.to_string()).unwrap_or_default();
                format!("`{} ({})`", n.ip, mac)
            })
            .join(", ");
        message.push_str(&listed);
    }
    message
}

async fn collect_ip_neighbors(
    driver: &dyn NetworkDriver,
    device: &Device,
    ctx: &mut RunContext,
    table: Vec<IpNeighbor>,
) -> FactsResult<()> {
    let instances = parse_network_instances(&driver.get_network_instances().await?);
    let instances = resolve_network_instances(instances, ctx.inventory()).await?;
    let by_interface = network_instances_by_interface(&instances);
    let interfaces_ip =
        resolve_interfaces_ip(&driver.get_interfaces_ip().await?, &by_interface, ctx.inventory())
            .await?;

    // Consecutive runs only, the way the device lists them.
    let groups: Vec<(String, Vec<IpNeighbor>)> = table
        .into_iter()
        .chunk_by(|n| n.interface.clone())
        .into_iter()
        .map(|(interface, group)| (interface, group.collect()))
        .collect();

    for (interface_name, neighbors) in groups {
        if !ctx.interface_matches(&interface_name) {
            continue;
        }

        let Some(_interface) = ctx.inventory().interface(device.id, &interface_name).await? else {
            ctx.log
                .warning(missing_interface_message(&interface_name, &neighbors));
            continue;
        };

        let addresses: &[InterfaceAddress] = interfaces_ip
            .get(&interface_name)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for neighbor in &neighbors {
            let Some(mac) = neighbor.mac else {
                continue;
            };
            if neighbor.is_unreachable() {
                continue;
            }

            let mut matched = None;
            for data in addresses {
                if let VrfResolution::Unresolved(name) = &data.vrf {
                    ctx.log.warning(format!(
                        "Could not find a VRF named `{}` in NetBox for interface `{}`.",
                        name, interface_name
                    ));
                    continue;
                }
                if data.address.contains(&neighbor.ip) {
                    matched = Some(data);
                    break;
                }
            }

            let address = matched.and_then(|data| {
                IpPrefix::new(neighbor.ip, data.address.prefix_len())
                    .ok()
                    .map(|address| (address, data))
            });
            let Some((address, data)) = address else {
                ctx.log.warning(format!(
                    "Could not determine prefix length for `{}` on interface `{}`. Skipping.",
                    neighbor.ip, interface_name
                ));
                continue;
            };

            let vrf = data.vrf.vrf();
            if !data.has_prefix {
                let message = format!(
                    "Could not find a NetBox prefix for `{}` on interface `{}`",
                    neighbor.ip, interface_name
                );
                ctx.log.warning(match vrf {
                    Some(vrf) => format!("{} in VRF `{}`.", message, vrf.name),
                    None => format!("{}.", message),
                });
                continue;
            }

            let existing_mac = ctx.inventory().find_mac(&mac).await?;
            let existing_ip = ctx
                .inventory()
                .find_ip(&address, vrf.map(|v| v.id))
                .await?;

            let detected = fact_values! {
                "mac" => mac.to_string(),
                "ip" => address.to_string(),
                "interface" => interface_name.as_str(),
                "vrf" => vrf.map(|v| v.name.clone()),
            };

            let mac_fact = Fact::existing_or_new(
                existing_mac.map(|m| m.id.into()),
                format!("MAC {}", mac),
                detected.clone(),
            )
            .with_kind(FactKind::MacDiscovery);
            let ip_fact = Fact::existing_or_new(
                existing_ip.map(|ip| ip.id.into()),
                format!("IP {}", address),
                detected,
            )
            .with_kind(FactKind::IpDiscovery);

            ctx.commit(device, mac_fact).await;
            ctx.commit(device, ip_fact).await;
        }
    }

    Ok(())
}

fn parse_mac(raw: &str) -> FactsResult<MacAddress> {
    raw.parse()
        .map_err(|e| FactsError::invalid_entry(format!("Invalid MAC address `{}`: {}", raw, e)))
}

/// Applies ARP and NDP entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeighborApplier;

impl NeighborApplier {
    async fn apply_mac(
        entry: &FactsReportEntry,
        cx: &mut ApplyContext<'_>,
    ) -> FactsResult<Option<ObjectRef>> {
        let values = &entry.detected_values;
        let Some(raw) = values.get_non_empty("mac") else {
            return Ok(None);
        };
        let mac = parse_mac(raw)?;

        let (record, created) = cx.inventory.get_or_create_mac(mac, cx.creation()).await?;
        if created {
            cx.log.success(format!(
                "Successfully created MAC address {}.",
                record.markdown(false, true)
            ));
        } else {
            cx.log.info(format!(
                "Found existing MAC address {}.",
                record.markdown(false, true)
            ));
        }

        let mut update = MacUpdate::seen(cx.now, entry.collector_type);
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

    async fn apply_ip(
        entry: &FactsReportEntry,
        cx: &mut ApplyContext<'_>,
    ) -> FactsResult<Option<ObjectRef>> {
        let values = &entry.detected_values;
        let Some(raw) = values.get_non_empty("ip") else {
            return Ok(None);
        };
        let address: IpPrefix = raw
            .parse()
            .map_err(|e| FactsError::invalid_entry(format!("Invalid IP address `{}`: {}", raw, e)))?;

        let vrf = match values.get_non_empty("vrf") {
            Some(name) => cx.inventory.vrf_by_name(name).await?,
            None => None,
        };

        let creation = cx
            .creation()
            .with_description(format!("Automatically discovered on {}", cx.now));
        let (ip, created) = cx
            .inventory
            .get_or_create_ip(address, vrf.as_ref().map(|v| v.id), creation)
            .await?;

        let mac = match values.get_non_empty("mac") {
            Some(raw) => {
                let mac = parse_mac(raw)?;
                Some(cx.inventory.get_or_create_mac(mac, cx.creation()).await?.0)
            }
            None => None,
        };

        if created {
            let device = cx.device(entry.device).await?;
            let interface_name = values.get_str_or("interface", "");
            let interface = cx.inventory.interface(device.id, interface_name).await?;
            let mac_link = mac
                .as_ref()
                .map(|m| m.markdown(false, true))
                .unwrap_or_else(|| "`unknown`".to_string());
            let interface_link = interface
                .as_ref()
                .map(|i| i.markdown(false, true))
                .unwrap_or_else(|| format!("`{}`", interface_name));

            cx.inventory
                .add_journal_entry(
                    ip.id.into(),
                    format!(
                        "Discovered by {} with MAC {} on interface {} via {} collection.",
                        device.name,
                        mac_link,
                        interface_link,
                        entry.collector_type.label()
                    ),
                )
                .await?;
            cx.log.success(format!(
                "Successfully created IP address {}.",
                ip.markdown(false, true)
            ));
        } else {
            cx.log.info(format!(
                "Found existing IP address {}.",
                ip.markdown(false, true)
            ));
        }

        if let Some(mac) = mac {
            let update = MacUpdate {
                add_ip_address: Some(ip.id),
                ..MacUpdate::default()
            };
            cx.inventory.update_mac(mac.id, update).await?;
        }

        Ok(Some(ip.id.into()))
    }
}

#[async_trait]
impl ApplyHandler for NeighborApplier {
    async fn apply(
        &self,
        entry: &FactsReportEntry,
        cx: &mut ApplyContext<'_>,
    ) -> FactsResult<Option<ObjectRef>> {
        let is_mac = match entry.fact_kind {
            FactKind::MacDiscovery => true,
            FactKind::IpDiscovery => false,
            FactKind::Generic => entry.object_repr.starts_with("MAC"),
        };
        if is_mac {
            Self::apply_mac(entry, cx).await
        } else {
            Self::apply_ip(entry, cx).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn neighbor(ip: &str, mac: &str) -> IpNeighbor {
        IpNeighbor {
            interface: "xe-0/0/9.0".to_string(),
            mac: Some(mac.parse().unwrap()),
            ip: ip.parse().unwrap(),
            age: None,
            state: None,
        }
    }

    #[test]
    fn test_missing_interface_lists_few_neighbors() {
        let neighbors = vec![
            neighbor("10.0.0.2", "00:1c:73:00:00:02"),
            neighbor("10.0.0.3", "00:1c:73:00:00:03"),
        ];
        assert_eq!(
            missing_interface_message("xe-0/0/9.0", &neighbors),
            "Could not find interface `xe-0/0/9.0` in NetBox for \
             `10.0.0.2 (00:1C:73:00:00:02)`, `10.0.0.3 (00:1C:73:00:00:03)`"
        );
    }

    #[test]
    fn test_missing_interface_counts_many_neighbors() {
        let neighbors: Vec<_> = (2..9)
            .map(|i| neighbor(&format!("10.0.0.{}", i), "00:1c:73:00:00:02"))
            .collect();
        assert_eq!(
            missing_interface_message("xe-0/0/9.0", &neighbors),
            "Could not find interface `xe-0/0/9.0` in NetBox for 7 ARP entries"
        );
    }
}
