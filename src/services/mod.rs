// src/services/mod.rs
pub mod aggregation;
pub mod country_codes;
pub mod covid_csv;
pub mod scheduler;

use async_trait::async_trait;

use crate::error::DashboardError;
use crate::models::TimeSeriesRow;

/// Anything that can produce the aggregated time series.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn load(&self) -> Result<Vec<TimeSeriesRow>, DashboardError>;

    /// Short human-readable origin for log lines.
    fn describe(&self) -> String;
}
