// src/services/scheduler.rs
use log::{error, info};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::state::SharedDashboard;

/// Runs the dashboard's freshness check on `schedule` so a stale dataset is
/// reloaded before the next request needs it.
pub async fn start_refresh_job(
    dashboard: SharedDashboard,
    schedule: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let sched = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let dashboard = dashboard.clone();
        Box::pin(async move {
            let mut dashboard = dashboard.lock().await;
            match dashboard.current_data().await {
                Ok(data) => info!("Scheduled freshness check done; data ends on {}", data.last_date()),
                Err(e) => error!("Scheduled refresh failed: {}", e),
            }
        })
    })?;

    sched.add(job).await?;
    sched.start().await?;
    info!("Refresh job scheduled with '{}'", schedule);
    Ok(sched)
}
