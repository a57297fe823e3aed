//! Network facts collection and reconciliation.
//!
//! A [`CollectionPlan`] names a collector type, a device filter and a
//! driver. [`CollectionRunner::run`] visits every selected device, records
//! one [`FactsReportEntry`] per detected fact on a fresh [`FactsReport`] and,
//! unless the plan is detect-only, applies each entry to the inventory right
//! away. Entries left pending are resolved later through the [`Reconciler`].
//!
//! ```text
//! CollectionPlan ──▶ CollectionRunner ──▶ Collector ──▶ RunContext::commit
//!                          │                                  │
//!                     DriverFactory                    StagingStore (entries)
//!                          │                                  │
//!                    NetworkDriver                     ApplyRegistry ──▶ InventoryStore
//! ```

pub mod apply;
pub mod collectors;
pub mod config;
pub mod context;
pub mod error;
pub mod helpers;
pub mod model;
pub mod reconcile;
pub mod runner;
pub mod staging;

pub use apply::{ApplyContext, ApplyHandler, ApplyRegistry};
pub use collectors::{Collector, VendorRegistry};
pub use config::{FactsConfig, DEFAULT_CONFIG_PATH};
pub use context::{Fact, RunContext};
pub use error::{FactsError, FactsResult};
pub use model::{CollectionPlan, FactsReport, FactsReportEntry, NewPlan, ReportSummary};
pub use reconcile::{recompute_report_status, report_status_for, Reconciler};
pub use runner::{CollectionRunner, RunOutcome};
pub use staging::{EntryDraft, StagingStore};
