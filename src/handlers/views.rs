// src/handlers/views.rs
use log::info;
use warp::reply::Json;
use warp::Rejection;

use super::error::reject;
use crate::state::SharedDashboard;
use crate::views::ViewKind;

pub async fn get_view(name: String, dashboard: SharedDashboard) -> Result<Json, Rejection> {
    info!("Handling request for view '{}'", name);
    let kind: ViewKind = name.parse().map_err(|_| warp::reject::not_found())?;

    let mut dashboard = dashboard.lock().await;
    let view = dashboard.view(kind).await.map_err(reject)?;
    Ok(warp::reply::json(&view))
}
