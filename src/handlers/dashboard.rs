// src/handlers/dashboard.rs
use log::info;
use warp::reply::Json;
use warp::Rejection;

use super::error::reject;
use crate::state::SharedDashboard;

pub async fn get_dashboard(dashboard: SharedDashboard) -> Result<Json, Rejection> {
    info!("Handling request to compose the dashboard");
    let mut dashboard = dashboard.lock().await;
    let layout = dashboard.layout().await.map_err(reject)?;
    Ok(warp::reply::json(&layout))
}

pub async fn get_schema(dashboard: SharedDashboard) -> Result<Json, Rejection> {
    let mut dashboard = dashboard.lock().await;
    dashboard.current_data().await.map_err(reject)?;
    Ok(warp::reply::json(&dashboard.schema()))
}

pub async fn get_state(dashboard: SharedDashboard) -> Result<Json, Rejection> {
    let dashboard = dashboard.lock().await;
    Ok(warp::reply::json(dashboard.state()))
}
