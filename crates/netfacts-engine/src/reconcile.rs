//! Review-time apply and skip, and report status recomputation.

use chrono::Utc;
use netfacts_common::{EntryId, EntryStatus, ReportId, ReportStatus, RunLog};
use netfacts_inventory::InventoryStore;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::apply::{ApplyContext, ApplyRegistry};
use crate::config::FactsConfig;
use crate::error::{FactsError, FactsResult};
use crate::model::{FactsReport, ReportSummary};
use crate::staging::StagingStore;

/// Report status for a set of distinct entry statuses.
///
/// Returns the status and whether the report counts as completed.
pub fn report_status_for(statuses: &BTreeSet<EntryStatus>) -> (ReportStatus, bool) {
    let pending = statuses.contains(&EntryStatus::Pending);
    let only = |s: EntryStatus| statuses.len() == 1 && statuses.contains(&s);

    if statuses.is_empty() || only(EntryStatus::Pending) {
        (ReportStatus::Pending, false)
    } else if only(EntryStatus::Applied) {
        (ReportStatus::Applied, true)
    } else if only(EntryStatus::Failed) {
        (ReportStatus::Failed, true)
    } else if !pending {
        if statuses.contains(&EntryStatus::Applied) {
            (ReportStatus::Applied, true)
        } else {
            (ReportStatus::Completed, true)
        }
    } else {
        (ReportStatus::Partial, false)
    }
}

/// Applies and skips staged entries after review.
#[derive(Clone)]
pub struct Reconciler {
    inventory: Arc<dyn InventoryStore>,
    staging: Arc<StagingStore>,
    appliers: Arc<ApplyRegistry>,
    config: Arc<FactsConfig>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("appliers", &self.appliers)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        staging: Arc<StagingStore>,
        appliers: Arc<ApplyRegistry>,
        config: Arc<FactsConfig>,
    ) -> Self {
        Self {
            inventory,
            staging,
            appliers,
            config,
        }
    }

    /// Applies the pending entries of `report` whose id is in `ids`.
    ///
    /// Returns `(applied, failed)`.
    pub async fn apply_entries(
        &self,
        report: ReportId,
        ids: &[EntryId],
    ) -> FactsResult<(usize, usize)> {
        let mut log = RunLog::new();
        self.apply_entries_logged(report, ids, &mut log).await
    }

    /// Same as [`Reconciler::apply_entries`], collecting handler messages in `log`.
    #[instrument(skip(self, ids, log), fields(requested = ids.len()))]
    pub async fn apply_entries_logged(
        &self,
        report: ReportId,
        ids: &[EntryId],
        log: &mut RunLog,
    ) -> FactsResult<(usize, usize)> {
        self.staging
            .report(report)
            .ok_or(FactsError::ReportNotFound(report))?;

        let wanted: HashSet<EntryId> = ids.iter().copied().collect();
        let selected: Vec<_> = self
            .staging
            .entries(report)
            .into_iter()
            .filter(|e| wanted.contains(&e.id) && e.is_pending())
            .collect();
        debug!(selected = selected.len(), "Applying entries");

        let now = Utc::now();
        let mut applied = 0;
        let mut failed = 0;

        for entry in &selected {
            let result = {
                let mut cx = ApplyContext {
                    inventory: self.inventory.as_ref(),
                    config: &self.config,
                    log: &mut *log,
                    now,
                };
                self.appliers.apply(entry, &mut cx).await
            };

            let updated = match result {
                Ok(object) => self
                    .staging
                    .update_pending_entry(report, entry.id, |e| {
                        e.status = EntryStatus::Applied;
                        e.applied_at = Some(now);
                        if object.is_some() {
                            e.object = object;
                        }
                        true
                    }),
                Err(err) => {
                    warn!(entry = %entry.id, error = %err, "Failed to apply entry");
                    self.staging
                        .update_pending_entry(report, entry.id, |e| {
                            e.status = EntryStatus::Failed;
                            e.error_message = err.entry_message();
                            false
                        })
                }
            };

            match updated {
                Some(true) => applied += 1,
                Some(false) => failed += 1,
                None => debug!(entry = %entry.id, "Entry left pending state concurrently"),
            }
        }

        self.recompute_report_status(report)?;
        info!(applied, failed, "Applied entries");
        Ok((applied, failed))
    }

    /// Moves the pending entries of `report` whose id is in `ids` to skipped.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub fn skip_entries(&self, report: ReportId, ids: &[EntryId]) -> FactsResult<usize> {
        self.staging
            .report(report)
            .ok_or(FactsError::ReportNotFound(report))?;

        let count = ids
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter_map(|id| {
                self.staging
                    .update_pending_entry(report, *id, |e| e.status = EntryStatus::Skipped)
            })
            .count();

        self.recompute_report_status(report)?;
        info!(skipped = count, "Skipped entries");
        Ok(count)
    }

    /// Recomputes the summary and status of `report` from its entries.
    pub fn recompute_report_status(&self, report: ReportId) -> FactsResult<FactsReport> {
        recompute_report_status(&self.staging, report)
    }
}

/// Recomputes the summary and status of `report` from its entries.
pub fn recompute_report_status(staging: &StagingStore, report: ReportId) -> FactsResult<FactsReport> {
    let entries = staging.entries(report);
    let statuses: BTreeSet<_> = entries.iter().map(|e| e.status).collect();
    let summary = ReportSummary::from_actions(entries.iter().map(|e| &e.action));
    let (status, completed) = report_status_for(&statuses);

    staging.update_report(report, |r| {
        r.summary = summary;
        r.status = status;
        if completed {
            r.completed_at = Some(Utc::now());
        }
        r.clone()
    })
}
