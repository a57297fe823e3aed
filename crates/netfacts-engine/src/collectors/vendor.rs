//! Vendor-specific collector lookup.

use netfacts_common::CollectorType;
use std::collections::HashMap;
use std::sync::Arc;

use super::junos::{EvpnCollector, L2CircuitCollector, OspfCollector};
use super::Collector;
use crate::error::{FactsError, FactsResult};

/// Driver names that select the Junos implementations.
pub const JUNOS_DRIVERS: &[&str] = &["junos", "netfacts.junos"];

/// Collectors keyed by collector type and driver name.
#[derive(Clone, Default)]
pub struct VendorRegistry {
    collectors: HashMap<(CollectorType, &'static str), Arc<dyn Collector>>,
}

impl VendorRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the built-in Junos collectors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for driver in JUNOS_DRIVERS {
            registry.register(CollectorType::Ospf, driver, Arc::new(OspfCollector));
            registry.register(CollectorType::Evpn, driver, Arc::new(EvpnCollector));
            registry.register(
                CollectorType::L2Circuits,
                driver,
                Arc::new(L2CircuitCollector),
            );
        }
        registry
    }

    pub fn register(
        &mut self,
        collector_type: CollectorType,
        driver: &'static str,
        collector: Arc<dyn Collector>,
    ) {
        self.collectors.insert((collector_type, driver), collector);
    }

    /// Drivers that implement `collector_type`, sorted.
    pub fn supported_drivers(&self, collector_type: CollectorType) -> Vec<String> {
        let mut drivers: Vec<String> = self
            .collectors
            .keys()
            .filter(|(ct, _)| *ct == collector_type)
            .map(|(_, d)| d.to_string())
            .collect();
        drivers.sort();
        drivers
    }

    /// Finds the implementation of `collector_type` for `driver`.
    pub fn lookup(
        &self,
        collector_type: CollectorType,
        driver: &str,
    ) -> FactsResult<Arc<dyn Collector>> {
        self.collectors
            .iter()
            .find(|((ct, d), _)| *ct == collector_type && *d == driver)
            .map(|(_, c)| Arc::clone(c))
            .ok_or_else(|| FactsError::NotSupported {
                operation: collector_type.as_str().to_string(),
                driver: driver.to_string(),
                supported: self.supported_drivers(collector_type),
            })
    }
}

impl std::fmt::Debug for VendorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<String> = self
            .collectors
            .keys()
            .map(|(ct, d)| format!("{}/{}", ct, d))
            .collect();
        keys.sort();
        f.debug_struct("VendorRegistry")
            .field("collectors", &keys)
            .finish()
    }
}
