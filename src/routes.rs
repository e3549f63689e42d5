// src/routes.rs
use log::info;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::dashboard::{get_dashboard, get_schema, get_state};
use crate::handlers::data::{get_filtered_data, reload_data};
use crate::handlers::error::ApiError;
use crate::handlers::fields::update_field;
use crate::handlers::views::get_view;
use crate::state::SharedDashboard;

/// Maps rejections to JSON `{"error": ...}` bodies.
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        code = StatusCode::BAD_REQUEST;
        message = format!("Invalid JSON body: {}", e);
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(dashboard: SharedDashboard) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let dashboard_filter = warp::any().map(move || dashboard.clone());

    let dashboard_route = warp::path!("api" / "v1" / "dashboard")
        .and(warp::get())
        .and(dashboard_filter.clone())
        .and_then(get_dashboard);

    let schema_route = warp::path!("api" / "v1" / "schema")
        .and(warp::get())
        .and(dashboard_filter.clone())
        .and_then(get_schema);

    let state_route = warp::path!("api" / "v1" / "state")
        .and(warp::get())
        .and(dashboard_filter.clone())
        .and_then(get_state);

    let update_route = warp::path!("api" / "v1" / "state" / String)
        .and(warp::put())
        .and(warp::body::content_length_limit(64 * 1024))
        .and(warp::body::json())
        .and(dashboard_filter.clone())
        .and_then(update_field);

    let view_route = warp::path!("api" / "v1" / "views" / String)
        .and(warp::get())
        .and(dashboard_filter.clone())
        .and_then(get_view);

    let data_route = warp::path!("api" / "v1" / "data")
        .and(warp::get())
        .and(dashboard_filter.clone())
        .and_then(get_filtered_data);

    let reload_route = warp::path!("api" / "v1" / "reload")
        .and(warp::post())
        .and(dashboard_filter.clone())
        .and_then(reload_data);

    info!("All routes configured successfully.");

    dashboard_route
        .or(schema_route)
        .or(state_route)
        .or(update_route)
        .or(view_route)
        .or(data_route)
        .or(reload_route)
        .recover(handle_rejection)
}
