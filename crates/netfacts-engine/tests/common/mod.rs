//! Shared setup for the engine integration tests.

#![allow(dead_code)]

use netfacts_common::{LogLevel, LogLine, PlanId};
use netfacts_driver::DriverFactory;
use netfacts_engine::{
    CollectionRunner, FactsConfig, FactsResult, NewPlan, Reconciler, RunOutcome, StagingStore,
};
use netfacts_inventory::{InventoryStore, MemoryInventory};
use netfacts_test::ScriptedConnector;
use std::sync::Arc;

pub struct Harness {
    pub inventory: Arc<MemoryInventory>,
    pub staging: Arc<StagingStore>,
    pub connector: Arc<ScriptedConnector>,
    pub config: Arc<FactsConfig>,
    pub runner: CollectionRunner,
}

impl Harness {
    pub fn new(inventory: Arc<MemoryInventory>, connector: ScriptedConnector) -> Self {
        Self::with_config(inventory, connector, FactsConfig::default())
    }

    pub fn with_config(
        inventory: Arc<MemoryInventory>,
        connector: ScriptedConnector,
        config: FactsConfig,
    ) -> Self {
        let staging = Arc::new(StagingStore::new());
        let connector = Arc::new(connector);
        let config = Arc::new(config);
        let runner = CollectionRunner::new(
            Arc::clone(&inventory) as Arc<dyn InventoryStore>,
            Arc::clone(&staging),
            DriverFactory::new(Arc::clone(&connector) as Arc<dyn netfacts_driver::Connector>),
            Arc::clone(&config),
        );
        Self {
            inventory,
            staging,
            connector,
            config,
            runner,
        }
    }

    pub fn create(&self, plan: NewPlan) -> PlanId {
        self.staging.create_plan(plan).unwrap().id
    }

    /// Creates `plan` and runs it once.
    pub async fn run(&self, plan: NewPlan) -> FactsResult<RunOutcome> {
        let id = self.create(plan);
        self.runner.run(id).await
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(
            Arc::clone(&self.inventory) as Arc<dyn InventoryStore>,
            Arc::clone(&self.staging),
            Arc::clone(self.runner.appliers()),
            Arc::clone(&self.config),
        )
    }
}

/// Returns true if a line at `level` contains `needle`.
pub fn logged(log: &[LogLine], level: LogLevel, needle: &str) -> bool {
    log.iter()
        .any(|l| l.level == level && l.message.contains(needle))
}

/// Same as [`logged`], restricted to lines prefixed with `device`.
pub fn logged_for(log: &[LogLine], level: LogLevel, device: &str, needle: &str) -> bool {
    let prefix = format!("**[{}](", device);
    log.iter()
        .any(|l| l.level == level && l.message.starts_with(&prefix) && l.message.contains(needle))
}
