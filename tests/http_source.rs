use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use warp::http::StatusCode;
use warp::Filter;

use covid_dashboard::error::DashboardError;
use covid_dashboard::services::covid_csv::HttpCsvSource;
use covid_dashboard::services::DataSource;

const CSV: &str = "\
Date,Country/Region,Province/State,Confirmed,Recovered,Deaths,Lat,Long
2020-04-01,Australia,Victoria,10,1,0,-37.8,144.9
2020-04-01,Australia,Queensland,5,0,0,-27.5,153.0
2020-04-01,Czechia,,1000,20,5,49.8,15.5
";

/// Serves the fixture after `failures` initial 503 responses.
fn spawn_server(failures: usize) -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let route = warp::path("data.csv").map(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        if n < failures {
            warp::reply::with_status(String::new(), StatusCode::SERVICE_UNAVAILABLE)
        } else {
            warp::reply::with_status(CSV.to_string(), StatusCode::OK)
        }
    });
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (addr, hits)
}

fn source(addr: SocketAddr, retries: u32) -> HttpCsvSource {
    HttpCsvSource::new(
        format!("http://{}/data.csv", addr),
        Duration::from_secs(5),
        retries,
        Duration::from_millis(10),
    )
    .unwrap()
}

#[tokio::test]
async fn test_loads_and_aggregates_over_http() {
    let (addr, hits) = spawn_server(0);
    let rows = source(addr, 0).load().await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(rows.len(), 2);
    let australia = rows.iter().find(|r| r.country == "Australia").unwrap();
    assert_eq!(australia.confirmed, 15);
    assert_eq!(australia.iso_alpha3.as_deref(), Some("AUS"));
}

#[tokio::test]
async fn test_retries_transient_failures() {
    let (addr, hits) = spawn_server(2);
    let rows = source(addr, 3).load().await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_gives_up_after_retries() {
    let (addr, hits) = spawn_server(10);
    let err = source(addr, 1).load().await.unwrap_err();

    assert!(matches!(err, DashboardError::Network(_)));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
