// src/bin/fetch_snapshot.rs
use covid_dashboard::config::Config;
use covid_dashboard::models::{Dataset, Metric};
use covid_dashboard::services::covid_csv::HttpCsvSource;
use covid_dashboard::services::DataSource;
use dotenv::dotenv;
use log::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    let source = HttpCsvSource::from_config(&config)?;
    info!("Fetching snapshot from {}", source.describe());

    let dataset = Dataset::new(source.load().await?)?;
    let missing_codes = dataset
        .rows_on(dataset.last_date())
        .filter(|r| r.iso_alpha3.is_none())
        .map(|r| r.country.as_str())
        .collect::<Vec<_>>();

    println!("Countries:      {}", dataset.countries().len());
    println!("Date range:     {} .. {}", dataset.first_date(), dataset.last_date());
    println!("Rows:           {}", dataset.rows().len());
    println!("Without ISO:    {:?}", missing_codes);

    let mut latest: Vec<_> = dataset.rows_on(dataset.last_date()).collect();
    latest.sort_by_key(|r| std::cmp::Reverse(r.value(Metric::Confirmed)));
    println!("Top 5 by confirmed on {}:", dataset.last_date());
    for row in latest.iter().take(5) {
        println!("  {:<24} {:>12} {:>10}", row.country, row.confirmed, row.deaths);
    }
    Ok(())
}
