// src/handlers/fields.rs
use log::info;
use serde_json::{json, Value};
use warp::reply::Json;
use warp::Rejection;

use super::error::reject;
use crate::state::fields::{Field, FieldValue};
use crate::state::SharedDashboard;

pub async fn update_field(name: String, body: Value, dashboard: SharedDashboard) -> Result<Json, Rejection> {
    info!("Handling update of field '{}'", name);

    let field: Field = name.parse().map_err(reject)?;
    let value = FieldValue::from_json(field, body).map_err(reject)?;

    let mut dashboard = dashboard.lock().await;
    dashboard.current_data().await.map_err(reject)?;
    let invalidated = dashboard.update(field, value).map_err(reject)?;

    Ok(warp::reply::json(&json!({
        "state": dashboard.state(),
        "invalidated": invalidated,
    })))
}
