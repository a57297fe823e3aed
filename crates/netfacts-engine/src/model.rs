//! Collection plans, reports and report entries.

use chrono::{DateTime, Duration, Utc};
use netfacts_common::{
    CollectorType, DeviceId, EntryAction, EntryId, EntryStatus, FactKind, FactValues, ObjectRef,
    PlanId, PlanStatus, Priority, ReportId, ReportStatus,
};
use netfacts_inventory::DeviceFilter;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_true() -> bool {
    true
}

/// Definition of a plan, as written by an operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlan {
    pub name: String,
    pub collector_type: CollectorType,
    #[serde(default)]
    pub filter: DeviceFilter,
    /// Driver name, e.g. `junos`.
    pub driver: String,
    #[serde(default)]
    pub driver_args: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub schedule_at: Option<DateTime<Utc>>,
    /// Recurrence in minutes.
    #[serde(default)]
    pub interval: Option<u32>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Record entries for review without touching the inventory.
    #[serde(default)]
    pub detect_only: bool,
}

impl NewPlan {
    pub fn new(
        name: impl Into<String>,
        collector_type: CollectorType,
        driver: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            collector_type,
            filter: DeviceFilter::default(),
            driver: driver.into(),
            driver_args: serde_json::Map::new(),
            schedule_at: None,
            interval: None,
            priority: Priority::default(),
            enabled: true,
            detect_only: false,
        }
    }

    pub fn detect_only(mut self) -> Self {
        self.detect_only = true;
        self
    }

    pub fn with_filter(mut self, filter: DeviceFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// A stored collection plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionPlan {
    pub id: PlanId,
    pub name: String,
    pub collector_type: CollectorType,
    pub filter: DeviceFilter,
    pub driver: String,
    pub driver_args: serde_json::Map<String, serde_json::Value>,
    pub schedule_at: Option<DateTime<Utc>>,
    pub interval: Option<u32>,
    pub priority: Priority,
    pub enabled: bool,
    pub detect_only: bool,
    pub status: PlanStatus,
    pub last_run: Option<DateTime<Utc>>,
}

impl CollectionPlan {
    pub fn from_definition(id: PlanId, plan: NewPlan) -> Self {
        Self {
            id,
            name: plan.name,
            collector_type: plan.collector_type,
            filter: plan.filter,
            driver: plan.driver,
            driver_args: plan.driver_args,
            schedule_at: plan.schedule_at,
            interval: plan.interval,
            priority: plan.priority,
            enabled: plan.enabled,
            detect_only: plan.detect_only,
            status: PlanStatus::New,
            last_run: None,
        }
    }

    /// Returns true if the plan may be enqueued.
    pub fn ready(&self) -> bool {
        self.enabled && !matches!(self.status, PlanStatus::Queued | PlanStatus::Working)
    }

    /// Time of the next recurring run.
    pub fn scheduled_at_next(&self) -> Option<DateTime<Utc>> {
        let last_run = self.last_run?;
        let interval = self.interval?;
        Some(last_run + Duration::minutes(i64::from(interval)))
    }

    /// Marks a working plan without an active job as stalled.
    ///
    /// Returns true if the status changed.
    pub fn check_stalled(&mut self, has_active_job: bool) -> bool {
        if self.status == PlanStatus::Working && !has_active_job {
            self.status = PlanStatus::Stalled;
            return true;
        }
        false
    }

    /// Hands the plan to the job system and returns the job id.
    pub fn enqueue(&mut self, now: DateTime<Utc>) -> Uuid {
        self.status = match self.schedule_at {
            Some(at) if at > now => PlanStatus::Scheduled,
            _ => PlanStatus::Queued,
        };
        Uuid::new_v4()
    }

    pub fn mark_failed(&mut self) {
        self.status = PlanStatus::Failed;
    }
}

/// Entry counts by detected action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub new: usize,
    pub changed: usize,
    pub confirmed: usize,
    pub stale: usize,
}

impl ReportSummary {
    pub fn from_actions<'a>(actions: impl IntoIterator<Item = &'a EntryAction>) -> Self {
        let mut summary = Self::default();
        for action in actions {
            match action {
                EntryAction::New => summary.new += 1,
                EntryAction::Changed => summary.changed += 1,
                EntryAction::Confirmed => summary.confirmed += 1,
                EntryAction::Stale => summary.stale += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.new + self.changed + self.confirmed + self.stale
    }
}

/// Outcome of one collection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactsReport {
    pub id: ReportId,
    pub plan: PlanId,
    pub status: ReportStatus,
    pub summary: ReportSummary,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One detected fact awaiting, or past, review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactsReportEntry {
    pub id: EntryId,
    pub report: ReportId,
    pub collector_type: CollectorType,
    pub device: DeviceId,
    /// Human readable label, e.g. `MAC 00:1C:73:00:00:01`.
    pub object_repr: String,
    pub fact_kind: FactKind,
    pub action: EntryAction,
    pub status: EntryStatus,
    pub detected_values: FactValues,
    pub current_values: FactValues,
    pub object: Option<ObjectRef>,
    pub error_message: String,
    pub applied_at: Option<DateTime<Utc>>,
}

impl FactsReportEntry {
    pub fn is_pending(&self) -> bool {
        self.status == EntryStatus::Pending
    }
}
