//! Plan execution.
//!
//! A run visits every device selected by the plan's filter, one at a time.
//! Connection failures and timeouts are contained to the device; any other
//! error fails the report and the plan and is returned to the caller.

use chrono::Utc;
use netfacts_common::{AbsoluteUrl, LogLine, PlanId, PlanStatus, ReportId, ReportStatus, RunLog};
use netfacts_driver::{ConnectParams, DriverError, DriverFactory, NetworkDriver, ResolvedDriver};
use netfacts_inventory::{Device, InventoryStore};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

use crate::apply::ApplyRegistry;
use crate::collectors::{self, VendorRegistry};
use crate::config::FactsConfig;
use crate::context::RunContext;
use crate::error::{FactsError, FactsResult};
use crate::model::{CollectionPlan, FactsReport, FactsReportEntry, ReportSummary};
use crate::reconcile::recompute_report_status;
use crate::staging::StagingStore;

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub report: FactsReport,
    pub entries: Vec<FactsReportEntry>,
    pub log: Vec<LogLine>,
}

/// Runs collection plans against devices.
pub struct CollectionRunner {
    inventory: Arc<dyn InventoryStore>,
    staging: Arc<StagingStore>,
    appliers: Arc<ApplyRegistry>,
    factory: DriverFactory,
    vendors: VendorRegistry,
    config: Arc<FactsConfig>,
}

impl CollectionRunner {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        staging: Arc<StagingStore>,
        factory: DriverFactory,
        config: Arc<FactsConfig>,
    ) -> Self {
        Self {
            inventory,
            staging,
            appliers: Arc::new(ApplyRegistry::with_defaults()),
            factory,
            vendors: VendorRegistry::with_defaults(),
            config,
        }
    }

    pub fn with_appliers(mut self, appliers: ApplyRegistry) -> Self {
        self.appliers = Arc::new(appliers);
        self
    }

    pub fn with_vendors(mut self, vendors: VendorRegistry) -> Self {
        self.vendors = vendors;
        self
    }

    pub fn staging(&self) -> &Arc<StagingStore> {
        &self.staging
    }

    pub fn appliers(&self) -> &Arc<ApplyRegistry> {
        &self.appliers
    }

    /// Runs `plan` once.
    ///
    /// Fails with [`FactsError::AlreadyWorking`] if the plan is mid-run.
    pub async fn run(&self, plan: PlanId) -> FactsResult<RunOutcome> {
        let snapshot = self.staging.update_plan(plan, |p| {
            if p.status == PlanStatus::Working {
                return Err(FactsError::AlreadyWorking(p.id));
            }
            p.status = PlanStatus::Working;
            Ok(p.clone())
        })??;

        match self.execute(&snapshot).await {
            Ok(outcome) => {
                let now = Utc::now();
                self.staging.update_plan(plan, |p| {
                    p.status = PlanStatus::Completed;
                    p.last_run = Some(now);
                })?;
                Ok(outcome)
            }
            Err(e) => {
                self.staging.update_plan(plan, |p| p.mark_failed())?;
                Err(e)
            }
        }
    }

    /// Moves a `working` plan with no live run to `stalled`.
    ///
    /// Returns true if the status changed.
    pub fn recover_stalled(&self, plan: PlanId, has_active_job: bool) -> FactsResult<bool> {
        let changed = self
            .staging
            .update_plan(plan, |p| p.check_stalled(has_active_job))?;
        if changed {
            warn!(plan = %plan, "Plan marked stalled");
        }
        Ok(changed)
    }

    #[instrument(skip(self, plan), fields(plan = %plan.name, collector = %plan.collector_type))]
    async fn execute(&self, plan: &CollectionPlan) -> FactsResult<RunOutcome> {
        let report = self.staging.create_report(plan.id, Utc::now());

        let log = match self.collect_devices(plan, report.id).await {
            Ok(log) => log,
            Err(e) => {
                error!(report = %report.id, error = %e, "Collection run failed");
                let entries = self.staging.entries(report.id);
                let summary =
                    ReportSummary::from_actions(entries.iter().map(|entry| &entry.action));
                self.staging.update_report(report.id, |r| {
                    r.summary = summary;
                    r.status = ReportStatus::Failed;
                    r.completed_at = Some(Utc::now());
                })?;
                return Err(e);
            }
        };

        let mut report = recompute_report_status(&self.staging, report.id)?;
        let entries = self.staging.entries(report.id);
        if entries.is_empty() && !plan.detect_only {
            report = self.staging.update_report(report.id, |r| {
                r.status = ReportStatus::Completed;
                r.completed_at = Some(Utc::now());
                r.clone()
            })?;
        }

        info!(
            report = %report.id,
            status = %report.status,
            entries = entries.len(),
            "Collection run finished"
        );
        Ok(RunOutcome {
            report,
            entries,
            log: log.into_lines(),
        })
    }

    async fn collect_devices(
        &self,
        plan: &CollectionPlan,
        report: ReportId,
    ) -> FactsResult<RunLog> {
        let mut ctx = RunContext::new(
            report,
            plan.collector_type,
            plan.driver.clone(),
            plan.detect_only,
            Arc::clone(&self.config),
            Arc::clone(&self.inventory),
            Arc::clone(&self.staging),
            Arc::clone(&self.appliers),
        )?;

        let resolved = self.factory.resolve(&plan.driver)?;
        let devices = self.inventory.select_devices(&plan.filter).await?;
        if devices.is_empty() {
            ctx.log.warning("No devices matched the plan filter.");
        }
        let args = self.config.merged_driver_args(&plan.driver_args);

        for device in &devices {
            ctx.enter_device(device);
            ctx.log.info(format!(
                "Starting {} collection",
                plan.collector_type.label()
            ));

            match self.visit_device(resolved, &args, device, &mut ctx).await {
                Ok(()) => {}
                Err(e) if e.is_connection_failure() => {
                    warn!(device = %device.name, error = %e, "Device unreachable");
                    ctx.log.failure(format!(
                        "An error occurred while connecting to the device: {}",
                        e
                    ));
                }
                Err(e) if e.is_not_supported() => {
                    ctx.log.failure(e.to_string());
                }
                Err(e) => {
                    ctx.log.failure(format!(
                        "Collection failed on {}: {}",
                        device.markdown(false, false),
                        e
                    ));
                    return Err(e);
                }
            }
            ctx.leave_device();
        }

        Ok(ctx.log)
    }

    /// Connects to one device, runs the collector and closes the session.
    async fn visit_device(
        &self,
        resolved: ResolvedDriver,
        args: &serde_json::Map<String, serde_json::Value>,
        device: &Device,
        ctx: &mut RunContext,
    ) -> FactsResult<()> {
        let Some(address) = device.primary_address() else {
            ctx.log
                .warning("Device has no primary IP address configured. Skipping.");
            return Ok(());
        };

        let params = ConnectParams {
            device: device.name.clone(),
            hostname: address.to_string(),
            username: self.config.driver.username.clone(),
            password: self.config.driver.password.clone(),
            optional_args: args.clone(),
            timeout_secs: self.config.driver.connect_timeout_secs,
        };

        let connect_budget = self.config.connect_timeout();
        let driver = match timeout(connect_budget, self.factory.connect(resolved, &params)).await {
            Ok(driver) => driver?,
            Err(_) => return Err(timed_out(&params.hostname, connect_budget)),
        };

        let device_budget = self.config.device_timeout();
        let result = match timeout(
            device_budget,
            collectors::collect(driver.as_ref(), device, ctx, &self.vendors),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(timed_out(&params.hostname, device_budget)),
        };

        close_driver(driver.as_ref(), ctx).await;
        result
    }
}

fn timed_out(host: &str, budget: Duration) -> FactsError {
    DriverError::Timeout {
        host: host.to_string(),
        seconds: budget.as_secs(),
    }
    .into()
}

async fn close_driver(driver: &dyn NetworkDriver, ctx: &mut RunContext) {
    if let Err(e) = driver.close().await {
        ctx.log
            .warning(format!("Could not close the device session: {}", e));
    }
}

impl std::fmt::Debug for CollectionRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionRunner")
            .field("appliers", &self.appliers)
            .field("vendors", &self.vendors)
            .finish_non_exhaustive()
    }
}
