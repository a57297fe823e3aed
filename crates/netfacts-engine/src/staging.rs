//! In-process store for plans, reports and report entries.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use netfacts_common::{
    CollectorType, DeviceId, EntryAction, EntryId, EntryStatus, FactKind, FactValues, ObjectRef,
    PlanId, ReportId, ReportStatus,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use crate::error::{FactsError, FactsResult};
use crate::model::{CollectionPlan, FactsReport, FactsReportEntry, NewPlan, ReportSummary};

/// Data for a new pending entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub collector_type: CollectorType,
    pub device: DeviceId,
    pub fact_kind: FactKind,
    pub action: EntryAction,
    pub detected_values: FactValues,
    pub current_values: FactValues,
    pub object: Option<ObjectRef>,
    pub object_repr: String,
}

/// Staging area shared by the runner and reviewers.
///
/// Every mutation goes through a closure run under the row's lock, which is
/// what makes the plan `working` guard and the entry `pending` guard atomic.
#[derive(Debug)]
pub struct StagingStore {
    next_id: AtomicU64,
    plans: DashMap<PlanId, CollectionPlan>,
    plan_names: DashMap<String, PlanId>,
    reports: DashMap<ReportId, FactsReport>,
    entries: DashMap<EntryId, FactsReportEntry>,
}

impl Default for StagingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StagingStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            plans: DashMap::new(),
            plan_names: DashMap::new(),
            reports: DashMap::new(),
            entries: DashMap::new(),
        }
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    // --- plans ---

    /// Stores a new plan. Plan names are unique.
    pub fn create_plan(&self, definition: NewPlan) -> FactsResult<CollectionPlan> {
        if definition.name.trim().is_empty() {
            return Err(FactsError::InvalidPlan("name must not be empty".to_string()));
        }
        if definition.driver.trim().is_empty() {
            return Err(FactsError::InvalidPlan("driver must not be empty".to_string()));
        }

        let id = match self.plan_names.entry(definition.name.clone()) {
            Entry::Occupied(_) => {
                return Err(FactsError::InvalidPlan(format!(
                    "a plan named '{}' already exists",
                    definition.name
                )));
            }
            Entry::Vacant(slot) => *slot.insert(PlanId(self.allocate_id())),
        };

        let plan = CollectionPlan::from_definition(id, definition);
        self.plans.insert(plan.id, plan.clone());
        info!(plan = %plan.name, id = %plan.id, collector = %plan.collector_type, "Created collection plan");
        Ok(plan)
    }

    pub fn plan(&self, id: PlanId) -> Option<CollectionPlan> {
        self.plans.get(&id).map(|p| p.value().clone())
    }

    pub fn plan_by_name(&self, name: &str) -> Option<CollectionPlan> {
        let id = *self.plan_names.get(name)?;
        self.plan(id)
    }

    pub fn plans(&self) -> Vec<CollectionPlan> {
        let mut plans: Vec<_> = self.plans.iter().map(|p| p.value().clone()).collect();
        plans.sort_by_key(|p| p.id);
        plans
    }

    /// Runs `f` on the stored plan under its lock. `f` must not rename the plan.
    pub fn update_plan<R>(
        &self,
        id: PlanId,
        f: impl FnOnce(&mut CollectionPlan) -> R,
    ) -> FactsResult<R> {
        let mut plan = self.plans.get_mut(&id).ok_or(FactsError::PlanNotFound(id))?;
        Ok(f(&mut plan))
    }

    // --- reports ---

    pub fn create_report(&self, plan: PlanId, now: DateTime<Utc>) -> FactsReport {
        let report = FactsReport {
            id: ReportId(self.allocate_id()),
            plan,
            status: ReportStatus::Pending,
            summary: ReportSummary::default(),
            created_at: now,
            completed_at: None,
        };
        self.reports.insert(report.id, report.clone());
        debug!(report = %report.id, plan = %plan, "Created report");
        report
    }

    pub fn report(&self, id: ReportId) -> Option<FactsReport> {
        self.reports.get(&id).map(|r| r.value().clone())
    }

    pub fn reports_for(&self, plan: PlanId) -> Vec<FactsReport> {
        let mut reports: Vec<_> = self
            .reports
            .iter()
            .filter(|r| r.plan == plan)
            .map(|r| r.value().clone())
            .collect();
        reports.sort_by_key(|r| r.id);
        reports
    }

    pub fn update_report<R>(
        &self,
        id: ReportId,
        f: impl FnOnce(&mut FactsReport) -> R,
    ) -> FactsResult<R> {
        let mut report = self
            .reports
            .get_mut(&id)
            .ok_or(FactsError::ReportNotFound(id))?;
        Ok(f(&mut report))
    }

    // --- entries ---

    /// Stores a pending entry on `report`.
    pub fn insert_entry(&self, report: ReportId, draft: EntryDraft) -> FactsReportEntry {
        let entry = FactsReportEntry {
            id: EntryId(self.allocate_id()),
            report,
            collector_type: draft.collector_type,
            device: draft.device,
            object_repr: draft.object_repr,
            fact_kind: draft.fact_kind,
            action: draft.action,
            status: EntryStatus::Pending,
            detected_values: draft.detected_values,
            current_values: draft.current_values,
            object: draft.object,
            error_message: String::new(),
            applied_at: None,
        };
        self.entries.insert(entry.id, entry.clone());
        entry
    }

    pub fn entry(&self, id: EntryId) -> Option<FactsReportEntry> {
        self.entries.get(&id).map(|e| e.value().clone())
    }

    /// Entries of `report`, in recording order.
    pub fn entries(&self, report: ReportId) -> Vec<FactsReportEntry> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .filter(|e| e.report == report)
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by_key(|e| e.id);
        entries
    }

    /// Runs `f` on a pending entry of `report` under its lock.
    ///
    /// Returns `None` when the entry does not belong to the report or is no
    /// longer pending; `f` is not called then.
    pub fn update_pending_entry<R>(
        &self,
        report: ReportId,
        id: EntryId,
        f: impl FnOnce(&mut FactsReportEntry) -> R,
    ) -> Option<R> {
        let mut entry = self.entries.get_mut(&id)?;
        if entry.report != report || !entry.is_pending() {
            return None;
        }
        Some(f(&mut entry))
    }
}
