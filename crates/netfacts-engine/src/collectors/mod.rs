//! Collectors, one per collector type.
//!
//! A collector reads one device through its driver and records what it
//! finds as report entries through [`RunContext::commit`]. Inventory writes
//! happen only in the matching [`ApplyHandler`](crate::apply::ApplyHandler).

use async_trait::async_trait;
use netfacts_common::CollectorType;
use netfacts_driver::NetworkDriver;
use netfacts_inventory::Device;
use std::sync::Arc;

use crate::context::RunContext;
use crate::error::FactsResult;

pub mod arp;
pub mod bgp;
pub mod interfaces;
pub mod inventory;
pub mod junos;
pub mod lldp;
pub mod switching;
pub mod vendor;

pub use vendor::VendorRegistry;

/// Gathers one kind of fact from a connected device.
#[async_trait]
pub trait Collector: Send + Sync {
    async fn collect(
        &self,
        driver: &dyn NetworkDriver,
        device: &Device,
        ctx: &mut RunContext,
    ) -> FactsResult<()>;
}

/// Runs the collector for `ctx.collector_type` against one device.
///
/// Vendor-specific types are looked up by the plan's driver name and fail
/// with [`FactsError::NotSupported`](crate::FactsError::NotSupported) when
/// the driver has no implementation.
pub async fn collect(
    driver: &dyn NetworkDriver,
    device: &Device,
    ctx: &mut RunContext,
    vendors: &VendorRegistry,
) -> FactsResult<()> {
    let collector: Arc<dyn Collector> = match ctx.collector_type {
        CollectorType::Arp => Arc::new(arp::NeighborCollector::ARP),
        CollectorType::Ndp => Arc::new(arp::NeighborCollector::NDP),
        CollectorType::Inventory => Arc::new(inventory::InventoryCollector),
        CollectorType::Interfaces => Arc::new(interfaces::InterfacesCollector),
        CollectorType::EthernetSwitching => Arc::new(switching::SwitchingCollector),
        CollectorType::Bgp => Arc::new(bgp::BgpCollector),
        CollectorType::Lldp => Arc::new(lldp::LldpCollector),
        ct @ (CollectorType::Ospf | CollectorType::Evpn | CollectorType::L2Circuits) => {
            vendors.lookup(ct, &ctx.driver)?
        }
    };
    collector.collect(driver, device, ctx).await
}
