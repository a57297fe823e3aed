//! Per-run state threaded through every collector.

use chrono::{DateTime, Utc};
use netfacts_common::{
    AbsoluteUrl, CollectorType, EntryAction, EntryId, EntryStatus, FactKind, FactValues,
    ObjectRef, ReportId, RunLog,
};
use netfacts_inventory::{Creation, Device, InventoryStore};
use regex::Regex;
use std::sync::Arc;
use tracing::warn;

use crate::apply::{ApplyContext, ApplyRegistry};
use crate::config::FactsConfig;
use crate::error::{FactsError, FactsResult};
use crate::model::FactsReportEntry;
use crate::staging::{EntryDraft, StagingStore};

/// One detected fact, before it is recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Fact {
    pub action: EntryAction,
    pub kind: FactKind,
    pub label: String,
    pub detected: FactValues,
    pub current: FactValues,
    pub object: Option<ObjectRef>,
}

impl Fact {
    pub fn new(action: EntryAction, label: impl Into<String>, detected: FactValues) -> Self {
        Self {
            action,
            kind: FactKind::Generic,
            label: label.into(),
            detected,
            current: FactValues::new(),
            object: None,
        }
    }

    /// `confirmed` when the object already exists, `new` otherwise.
    pub fn existing_or_new(
        existing: Option<ObjectRef>,
        label: impl Into<String>,
        detected: FactValues,
    ) -> Self {
        let action = if existing.is_some() {
            EntryAction::Confirmed
        } else {
            EntryAction::New
        };
        Self::new(action, label, detected).with_object(existing)
    }

    pub fn with_kind(mut self, kind: FactKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_current(mut self, current: FactValues) -> Self {
        self.current = current;
        self
    }

    pub fn with_object(mut self, object: Option<ObjectRef>) -> Self {
        self.object = object;
        self
    }
}

/// State of one collection run.
///
/// Owns the run log and gives collectors access to the inventory, the
/// staging store and the apply handlers. Entries are recorded against
/// `report`; unless the run is detect-only each entry is applied right after
/// it is recorded.
pub struct RunContext {
    pub log: RunLog,
    pub now: DateTime<Utc>,
    pub report: ReportId,
    pub collector_type: CollectorType,
    /// Driver name from the plan, used for vendor dispatch.
    pub driver: String,
    pub detect_only: bool,
    pub config: Arc<FactsConfig>,
    interfaces_re: Regex,
    inventory: Arc<dyn InventoryStore>,
    staging: Arc<StagingStore>,
    appliers: Arc<ApplyRegistry>,
}

impl RunContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        report: ReportId,
        collector_type: CollectorType,
        driver: impl Into<String>,
        detect_only: bool,
        config: Arc<FactsConfig>,
        inventory: Arc<dyn InventoryStore>,
        staging: Arc<StagingStore>,
        appliers: Arc<ApplyRegistry>,
    ) -> FactsResult<Self> {
        let interfaces_re = config.interfaces_regex()?;
        Ok(Self {
            log: RunLog::new(),
            now: Utc::now(),
            report,
            collector_type,
            driver: driver.into(),
            detect_only,
            config,
            interfaces_re,
            inventory,
            staging,
            appliers,
        })
    }

    pub fn inventory(&self) -> &dyn InventoryStore {
        self.inventory.as_ref()
    }

    pub fn staging(&self) -> &StagingStore {
        &self.staging
    }

    pub fn should_apply(&self) -> bool {
        !self.detect_only
    }

    /// Returns true if collectors should look at `interface`.
    pub fn interface_matches(&self, interface: &str) -> bool {
        self.interfaces_re.is_match(interface)
    }

    /// Creation attributes for objects made during this run.
    pub fn creation(&self) -> Creation {
        Creation::tagged(self.config.collection.auto_discovered_tag.clone())
    }

    /// Prefixes subsequent log lines with a link to `device`.
    pub fn enter_device(&mut self, device: &Device) {
        self.log.set_prefix(device.markdown(false, true));
    }

    pub fn leave_device(&mut self) {
        self.log.clear_prefix();
    }

    /// Persists a pending entry for `device`. Never touches the inventory.
    pub fn record_entry(&self, device: &Device, fact: Fact) -> FactsReportEntry {
        self.staging.insert_entry(
            self.report,
            EntryDraft {
                collector_type: self.collector_type,
                device: device.id,
                fact_kind: fact.kind,
                action: fact.action,
                detected_values: fact.detected,
                current_values: fact.current,
                object: fact.object,
                object_repr: fact.label,
            },
        )
    }

    /// Marks a recorded entry applied, pointing it at `object` when given.
    pub fn mark_applied(&self, entry: EntryId, object: Option<ObjectRef>) {
        let now = Utc::now();
        let updated = self
            .staging
            .update_pending_entry(self.report, entry, |e| {
                e.status = EntryStatus::Applied;
                e.applied_at = Some(now);
                if object.is_some() {
                    e.object = object;
                }
            });
        if updated.is_none() {
            warn!(entry = %entry, "Entry was no longer pending when marked applied");
        }
    }

    fn mark_failed(&self, entry: EntryId, error: &FactsError) {
        self.staging.update_pending_entry(self.report, entry, |e| {
            e.status = EntryStatus::Failed;
            e.error_message = error.entry_message();
        });
    }

    /// Records `fact` and, unless the run is detect-only, applies it.
    ///
    /// An apply error fails only this entry; it is logged and the run goes on.
    pub async fn commit(&mut self, device: &Device, fact: Fact) -> FactsReportEntry {
        let entry = self.record_entry(device, fact);
        if self.detect_only {
            return entry;
        }

        let appliers = Arc::clone(&self.appliers);
        let result = {
            let mut cx = ApplyContext {
                inventory: self.inventory.as_ref(),
                config: &self.config,
                log: &mut self.log,
                now: self.now,
            };
            appliers.apply(&entry, &mut cx).await
        };

        match result {
            Ok(object) => self.mark_applied(entry.id, object),
            Err(e) => {
                self.log
                    .warning(format!("Could not apply {}: {}", entry.object_repr, e));
                self.mark_failed(entry.id, &e);
            }
        }

        self.staging.entry(entry.id).unwrap_or(entry)
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("report", &self.report)
            .field("collector_type", &self.collector_type)
            .field("driver", &self.driver)
            .field("detect_only", &self.detect_only)
            .field("log_lines", &self.log.len())
            .finish()
    }
}
