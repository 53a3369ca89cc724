//! Daily refresh trigger
//!
//! Scheduled runs have no caller to answer, so outcomes are only logged.

#![allow(clippy::result_large_err)]

use crate::config::ScheduleConfig;
use chrono_tz::Tz;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use trailhead_core::errors::{ExError, Result, TrailError};
use trailhead_engine::{Orchestrator, RefreshOutcome, Trigger};

fn invalid(reason: impl Into<String>) -> ExError {
    TrailError::InvalidSchedule {
        reason: reason.into(),
    }
    .into()
}

/// Six-field cron expression (`sec min hour dom mon dow`) firing daily at `HH:MM`
pub fn cron_expression(time: &str) -> Result<String> {
    let (hour, minute) = time
        .split_once(':')
        .ok_or_else(|| invalid(format!("expected HH:MM, got '{}'", time)))?;
    let hour: u8 = hour
        .trim()
        .parse()
        .map_err(|_| invalid(format!("bad hour in '{}'", time)))?;
    let minute: u8 = minute
        .trim()
        .parse()
        .map_err(|_| invalid(format!("bad minute in '{}'", time)))?;
    if hour > 23 || minute > 59 {
        return Err(invalid(format!("'{}' is not a time of day", time)));
    }
    Ok(format!("0 {} {} * * *", minute, hour))
}

pub fn timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| invalid(format!("unknown timezone '{}': {}", name, e)))
}

/// Register the daily job and start the scheduler
///
/// The returned handle must be kept alive for the job to keep firing.
pub async fn start(
    orchestrator: Arc<Orchestrator>,
    schedule: &ScheduleConfig,
) -> Result<JobScheduler> {
    let cron = cron_expression(&schedule.time)?;
    let tz = timezone(&schedule.timezone)?;

    let job = Job::new_async_tz(cron.as_str(), tz, move |_id, _scheduler| {
        let orchestrator = orchestrator.clone();
        Box::pin(async move {
            log_scheduled_outcome(orchestrator.refresh(Trigger::Scheduled).await);
        })
    })
    .map_err(|e| invalid(format!("{:?}", e)))?;

    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| invalid(format!("{:?}", e)))?;
    scheduler
        .add(job)
        .await
        .map_err(|e| invalid(format!("{:?}", e)))?;
    scheduler
        .start()
        .await
        .map_err(|e| invalid(format!("{:?}", e)))?;

    tracing::info!(
        component = module_path!(),
        op = "schedule",
        cron = %cron,
        timezone = %schedule.timezone,
        "daily refresh scheduled"
    );
    Ok(scheduler)
}

fn log_scheduled_outcome(result: Result<RefreshOutcome>) {
    match result {
        Ok(RefreshOutcome::Promoted(run)) => {
            tracing::info!(
                component = module_path!(),
                op = "scheduled_refresh",
                run_id = %run.run_id,
                snapshot = %run.snapshot,
                record_count = run.count as u64,
                "scheduled refresh promoted"
            );
        }
        Ok(RefreshOutcome::Rejected(run)) => {
            tracing::error!(
                component = module_path!(),
                op = "scheduled_refresh",
                run_id = %run.run_id,
                fault_count = run.details.len() as u64,
                "daily refresh failed validation, keeping last good snapshot"
            );
        }
        Err(e) => {
            tracing::error!(
                component = module_path!(),
                op = "scheduled_refresh",
                err_code = e.code(),
                error = %e,
                "daily refresh failed"
            );
        }
    }
}
