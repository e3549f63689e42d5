// src/handlers/data.rs
use log::info;
use serde_json::json;
use warp::reply::Json;
use warp::Rejection;

use super::error::reject;
use crate::state::SharedDashboard;

pub async fn get_filtered_data(dashboard: SharedDashboard) -> Result<Json, Rejection> {
    let mut dashboard = dashboard.lock().await;
    let rows = dashboard.filtered_rows().await.map_err(reject)?;
    Ok(warp::reply::json(&rows))
}

pub async fn reload_data(dashboard: SharedDashboard) -> Result<Json, Rejection> {
    info!("Handling forced reload");
    let mut dashboard = dashboard.lock().await;
    let data = dashboard.reload().await.map_err(reject)?;

    Ok(warp::reply::json(&json!({
        "countries": data.countries().len(),
        "first_date": data.first_date(),
        "last_date": data.last_date(),
        "state": dashboard.state(),
    })))
}
