//! Per-collector apply handlers.
//!
//! A handler turns one pending entry into inventory writes. The same handler
//! runs for entries applied inline during a run and for entries applied later
//! from review, so all data it needs comes from the entry's value bag.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use netfacts_common::{CollectorType, DeviceId, ObjectRef, RunLog};
use netfacts_inventory::{Creation, Device, InventoryError, InventoryStore};
use std::collections::HashMap;
use std::sync::Arc;

use crate::collectors;
use crate::config::FactsConfig;
use crate::error::{FactsError, FactsResult};
use crate::model::FactsReportEntry;

/// Everything a handler may touch while applying one entry.
pub struct ApplyContext<'a> {
    pub inventory: &'a dyn InventoryStore,
    pub config: &'a FactsConfig,
    pub log: &'a mut RunLog,
    pub now: DateTime<Utc>,
}

impl ApplyContext<'_> {
    /// Creation attributes for objects made by a collector.
    pub fn creation(&self) -> Creation {
        Creation::tagged(self.config.collection.auto_discovered_tag.clone())
    }

    /// Loads the device an entry was recorded for.
    pub async fn device(&self, id: DeviceId) -> FactsResult<Device> {
        self.inventory
            .device(id)
            .await?
            .ok_or_else(|| InventoryError::not_found("device", id).into())
    }
}

/// Applies entries of one collector type.
#[async_trait]
pub trait ApplyHandler: Send + Sync {
    /// Writes the entry's facts to the inventory.
    ///
    /// Returns the object the entry now refers to, if any.
    async fn apply(
        &self,
        entry: &FactsReportEntry,
        cx: &mut ApplyContext<'_>,
    ) -> FactsResult<Option<ObjectRef>>;
}

/// Handlers keyed by collector type.
#[derive(Clone, Default)]
pub struct ApplyRegistry {
    handlers: HashMap<CollectorType, Arc<dyn ApplyHandler>>,
}

impl ApplyRegistry {
    /// Registry without any handler.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with a handler for every collector type.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(CollectorType::Arp, Arc::new(collectors::arp::NeighborApplier));
        registry.register(CollectorType::Ndp, Arc::new(collectors::arp::NeighborApplier));
        registry.register(
            CollectorType::Inventory,
            Arc::new(collectors::inventory::InventoryApplier),
        );
        registry.register(
            CollectorType::Interfaces,
            Arc::new(collectors::interfaces::InterfaceMacApplier),
        );
        registry.register(CollectorType::Lldp, Arc::new(collectors::lldp::CableApplier));
        registry.register(
            CollectorType::EthernetSwitching,
            Arc::new(collectors::switching::SwitchingApplier),
        );
        registry.register(CollectorType::Bgp, Arc::new(collectors::bgp::BgpPeerApplier));
        registry.register(CollectorType::Ospf, Arc::new(collectors::junos::OspfApplier));
        registry.register(CollectorType::Evpn, Arc::new(collectors::junos::EvpnApplier));
        registry.register(
            CollectorType::L2Circuits,
            Arc::new(collectors::junos::L2CircuitApplier),
        );
        registry
    }

    pub fn register(&mut self, collector_type: CollectorType, handler: Arc<dyn ApplyHandler>) {
        self.handlers.insert(collector_type, handler);
    }

    pub fn remove(&mut self, collector_type: CollectorType) -> bool {
        self.handlers.remove(&collector_type).is_some()
    }

    pub fn contains(&self, collector_type: CollectorType) -> bool {
        self.handlers.contains_key(&collector_type)
    }

    /// Dispatches `entry` to its handler.
    pub async fn apply(
        &self,
        entry: &FactsReportEntry,
        cx: &mut ApplyContext<'_>,
    ) -> FactsResult<Option<ObjectRef>> {
        let handler = self
            .handlers
            .get(&entry.collector_type)
            .ok_or(FactsError::NoApplyHandler(entry.collector_type))?;
        handler.apply(entry, cx).await
    }
}

impl std::fmt::Debug for ApplyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.handlers.keys().map(|t| t.as_str()).collect();
        types.sort_unstable();
        f.debug_struct("ApplyRegistry").field("handlers", &types).finish()
    }
}
