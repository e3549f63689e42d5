use anyhow::{anyhow, Context};
use dotenv::dotenv;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use covid_dashboard::config::Config;
use covid_dashboard::routes;
use covid_dashboard::services::covid_csv::{CsvFileSource, HttpCsvSource};
use covid_dashboard::services::scheduler::start_refresh_job;
use covid_dashboard::services::DataSource;
use covid_dashboard::state::{Dashboard, DashboardSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Logger initialized. Starting the application...");

    let config = Config::from_env()?;

    let source: Arc<dyn DataSource> = match &config.data_file {
        Some(path) => Arc::new(CsvFileSource::new(path.clone())),
        None => Arc::new(HttpCsvSource::from_config(&config)?),
    };

    let dashboard = Dashboard::new(source, DashboardSettings::from(&config))
        .await
        .context("initial data load failed")?
        .into_shared();

    let _scheduler = start_refresh_job(dashboard.clone(), &config.refresh_schedule)
        .await
        .map_err(|e| anyhow!("failed to start refresh job: {:?}", e))?;

    // Bind to 0.0.0.0 for container platforms
    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Will bind to: {}", addr);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST", "PUT"]);

    let api = routes::routes(dashboard).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
