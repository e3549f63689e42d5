// src/services/covid_csv.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::aggregation::aggregate;
use super::country_codes::CountryCodes;
use super::DataSource;
use crate::config::Config;
use crate::error::DashboardError;
use crate::models::TimeSeriesRow;

/// One line of the source CSV, with its columns renamed to canonical names.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Country/Region")]
    pub country: String,
    #[serde(rename = "Province/State", default)]
    pub province: Option<String>,
    #[serde(rename = "Confirmed", default)]
    pub confirmed: Option<f64>,
    #[serde(rename = "Recovered", default)]
    pub recovered: Option<f64>,
    #[serde(rename = "Deaths", default)]
    pub deaths: Option<f64>,
    #[serde(rename = "Lat", default)]
    pub lat: Option<f64>,
    #[serde(rename = "Long", default)]
    pub long: Option<f64>,
}

pub fn parse_records(csv_text: &str) -> Result<Vec<RawRecord>, DashboardError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(csv_text.as_bytes());

    let mut records = Vec::new();
    for (idx, result) in rdr.deserialize::<RawRecord>().enumerate() {
        // +2: header line and 1-based numbering
        let record = result.map_err(|e| DashboardError::Parse(format!("line {}: {}", idx + 2, e)))?;
        records.push(record);
    }
    Ok(records)
}

/// Parses, aggregates and annotates a full CSV document.
pub fn rows_from_csv(csv_text: &str, codes: &CountryCodes) -> Result<Vec<TimeSeriesRow>, DashboardError> {
    let records = parse_records(csv_text)?;
    let mut rows = aggregate(records);
    codes.annotate(&mut rows);
    Ok(rows)
}

/// Downloads the dataset over HTTP, retrying network failures with
/// exponential backoff.
pub struct HttpCsvSource {
    client: Client,
    url: String,
    retries: u32,
    backoff: Duration,
    codes: CountryCodes,
}

impl HttpCsvSource {
    pub fn new(url: impl Into<String>, timeout: Duration, retries: u32, backoff: Duration) -> Result<Self, DashboardError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpCsvSource {
            client,
            url: url.into(),
            retries,
            backoff,
            codes: CountryCodes::embedded(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, DashboardError> {
        Self::new(
            config.data_url.clone(),
            config.fetch_timeout,
            config.fetch_retries,
            config.retry_backoff,
        )
    }

    async fn fetch_once(&self) -> Result<String, DashboardError> {
        let text = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }

    pub async fn fetch_csv(&self) -> Result<String, DashboardError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once().await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.retries => {
                    let delay = backoff_delay(self.backoff, attempt);
                    warn!(
                        "Fetch of {} failed (attempt {}/{}): {}; retrying in {:?}",
                        self.url,
                        attempt + 1,
                        self.retries + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// `base * 2^attempt`, capped at one minute.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    2u32.checked_pow(attempt)
        .and_then(|factor| base.checked_mul(factor))
        .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
}

#[async_trait]
impl DataSource for HttpCsvSource {
    async fn load(&self) -> Result<Vec<TimeSeriesRow>, DashboardError> {
        info!("Fetching COVID-19 CSV from URL: {}", self.url);
        let csv_text = self.fetch_csv().await?;
        let rows = rows_from_csv(&csv_text, &self.codes)?;
        info!("Loaded {} aggregated rows from {}", rows.len(), self.url);
        Ok(rows)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Reads the same CSV layout from a local file.
pub struct CsvFileSource {
    path: PathBuf,
    codes: CountryCodes,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvFileSource {
            path: path.into(),
            codes: CountryCodes::embedded(),
        }
    }
}

#[async_trait]
impl DataSource for CsvFileSource {
    async fn load(&self) -> Result<Vec<TimeSeriesRow>, DashboardError> {
        info!("Reading COVID-19 CSV from file: {}", self.path.display());
        let csv_text = tokio::fs::read_to_string(&self.path).await?;
        rows_from_csv(&csv_text, &self.codes)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Date,Country/Region,Province/State,Confirmed,Recovered,Deaths,Lat,Long
2020-04-01,Czechia,,1000,20,5,49.8,15.5
2020-04-01,Slovakia,,500,,1,48.7,19.7
2020-04-01,Atlantis,,3,0,0,,
2020-04-02, Czechia ,,1100,25,6,49.8,15.5
";

    #[test]
    fn test_parse_renames_columns_and_blank_cells() {
        let records = parse_records(SAMPLE).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].country, "Czechia");
        assert_eq!(records[0].province, None);
        assert_eq!(records[1].recovered, None);
        assert_eq!(records[2].lat, None);
        assert_eq!(records[3].country, "Czechia");
    }

    #[test]
    fn test_rows_from_csv_aggregates_and_annotates() {
        let rows = rows_from_csv(SAMPLE, &CountryCodes::embedded()).unwrap();
        assert_eq!(rows.len(), 4);

        let czechia: Vec<_> = rows.iter().filter(|r| r.country == "Czechia").collect();
        assert_eq!(czechia.len(), 2);
        assert_eq!(czechia[0].confirmed, 1000);
        assert_eq!(czechia[0].iso_alpha3.as_deref(), Some("CZE"));

        let atlantis = rows.iter().find(|r| r.country == "Atlantis").unwrap();
        assert_eq!(atlantis.iso_alpha3, None);
        assert_eq!(atlantis.latitude, None);
    }

    #[test]
    fn test_backoff_doubles_and_is_capped() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 0), base);
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 40), MAX_BACKOFF);
        assert_eq!(backoff_delay(Duration::from_secs(u64::MAX), 1), MAX_BACKOFF);
        assert_eq!(backoff_delay(Duration::from_secs(3600), 0), MAX_BACKOFF);
    }

    #[test]
    fn test_bad_date_reports_line() {
        let text = "Date,Country/Region,Province/State,Confirmed,Recovered,Deaths,Lat,Long\n\
                    2020-04-01,Czechia,,1,0,0,1,1\n\
                    yesterday,Czechia,,1,0,0,1,1\n";
        match parse_records(text) {
            Err(DashboardError::Parse(msg)) => assert!(msg.contains("line 3"), "{}", msg),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let source = CsvFileSource::new("/nonexistent/covid.csv");
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, DashboardError::Io(_)));
        assert!(err.is_load_error());
    }
}
