// src/models.rs
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::DashboardError;

/// One aggregated observation for a country on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRow {
    pub country: String,
    pub date: NaiveDate,
    pub confirmed: u64,
    pub recovered: u64,
    pub deaths: u64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub iso_alpha3: Option<String>,
}

impl TimeSeriesRow {
    pub fn value(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Confirmed => self.confirmed,
            Metric::Recovered => self.recovered,
            Metric::Deaths => self.deaths,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Confirmed,
    Recovered,
    Deaths,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Confirmed, Metric::Recovered, Metric::Deaths];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Confirmed => "confirmed",
            Metric::Recovered => "recovered",
            Metric::Deaths => "deaths",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Confirmed => "Confirmed cases",
            Metric::Recovered => "Recovered",
            Metric::Deaths => "Deaths",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Metric {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DashboardError::validation("selected_metric", format!("unknown metric '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotKind {
    Line,
    Bar,
}

impl PlotKind {
    pub const ALL: [PlotKind; 2] = [PlotKind::Line, PlotKind::Bar];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlotKind::Line => "line",
            PlotKind::Bar => "bar",
        }
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The user-editable controls of a dashboard instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    pub selected_countries: BTreeSet<String>,
    pub selected_metric: Metric,
    pub log_scale: bool,
    pub plot_kind: PlotKind,
    pub selected_date: NaiveDate,
}

/// Aggregated rows, sorted by (country, date), with the bounds the
/// controls are derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    rows: Vec<TimeSeriesRow>,
    countries: BTreeSet<String>,
    first_date: NaiveDate,
    last_date: NaiveDate,
}

impl Dataset {
    pub fn new(mut rows: Vec<TimeSeriesRow>) -> Result<Self, DashboardError> {
        rows.sort_by(|a, b| a.country.cmp(&b.country).then(a.date.cmp(&b.date)));
        let rows = merge_duplicates(rows);

        let first_date = rows.iter().map(|r| r.date).min().ok_or(DashboardError::EmptyDataset)?;
        let last_date = rows.iter().map(|r| r.date).max().ok_or(DashboardError::EmptyDataset)?;
        let countries = rows.iter().map(|r| r.country.clone()).collect();

        Ok(Dataset {
            rows,
            countries,
            first_date,
            last_date,
        })
    }

    pub fn rows(&self) -> &[TimeSeriesRow] {
        &self.rows
    }

    pub fn countries(&self) -> &BTreeSet<String> {
        &self.countries
    }

    pub fn first_date(&self) -> NaiveDate {
        self.first_date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    pub fn rows_for<'a>(&'a self, country: &'a str) -> impl Iterator<Item = &'a TimeSeriesRow> + 'a {
        self.rows.iter().filter(move |r| r.country == country)
    }

    pub fn rows_on(&self, date: NaiveDate) -> impl Iterator<Item = &TimeSeriesRow> + '_ {
        self.rows.iter().filter(move |r| r.date == date)
    }

    /// Stale when the newest observation is more than `max_age_days` older than `today`.
    pub fn is_stale(&self, today: NaiveDate, max_age_days: i64) -> bool {
        (today - self.last_date).num_days() > max_age_days
    }
}

/// Folds rows sharing a (country, date) key into the first one, summing
/// counts. Expects `rows` sorted by that key.
fn merge_duplicates(rows: Vec<TimeSeriesRow>) -> Vec<TimeSeriesRow> {
    let mut merged: Vec<TimeSeriesRow> = Vec::with_capacity(rows.len());
    let mut duplicates = 0usize;

    for row in rows {
        match merged.last_mut() {
            Some(last) if last.country == row.country && last.date == row.date => {
                last.confirmed = last.confirmed.saturating_add(row.confirmed);
                last.recovered = last.recovered.saturating_add(row.recovered);
                last.deaths = last.deaths.saturating_add(row.deaths);
                if last.latitude.is_none() && last.longitude.is_none() {
                    last.latitude = row.latitude;
                    last.longitude = row.longitude;
                }
                if last.iso_alpha3.is_none() {
                    last.iso_alpha3 = row.iso_alpha3;
                }
                duplicates += 1;
            }
            _ => merged.push(row),
        }
    }

    if duplicates > 0 {
        warn!("Merged {} duplicate country/date rows", duplicates);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(country: &str, date: NaiveDate, confirmed: u64) -> TimeSeriesRow {
        TimeSeriesRow {
            country: country.to_string(),
            date,
            confirmed,
            recovered: 0,
            deaths: 0,
            latitude: None,
            longitude: None,
            iso_alpha3: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 4, d).unwrap()
    }

    #[test]
    fn test_dataset_bounds_and_order() {
        let data = Dataset::new(vec![
            row("Slovakia", day(2), 10),
            row("Czechia", day(3), 30),
            row("Czechia", day(1), 20),
        ])
        .unwrap();

        assert_eq!(data.first_date(), day(1));
        assert_eq!(data.last_date(), day(3));
        assert_eq!(data.countries().len(), 2);
        assert_eq!(data.rows()[0].country, "Czechia");
        assert_eq!(data.rows()[0].date, day(1));
        assert_eq!(data.rows_for("Czechia").count(), 2);
        assert_eq!(data.rows_on(day(2)).count(), 1);
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        assert!(matches!(Dataset::new(Vec::new()), Err(DashboardError::EmptyDataset)));
    }

    #[test]
    fn test_staleness_threshold() {
        let data = Dataset::new(vec![row("Czechia", day(10), 1)]).unwrap();

        assert!(!data.is_stale(day(10), 1));
        assert!(!data.is_stale(day(11), 1));
        assert!(data.is_stale(day(12), 1));
        assert!(!data.is_stale(day(12), 2));
    }

    #[test]
    fn test_staleness_with_huge_max_age() {
        let data = Dataset::new(vec![row("Czechia", day(10), 1)]).unwrap();
        assert!(!data.is_stale(day(12), 999_999_999_999));
        assert!(!data.is_stale(day(12), i64::MAX));
    }

    #[test]
    fn test_duplicate_keys_are_merged() {
        let mut with_coords = row("Czechia", day(1), 5);
        with_coords.latitude = Some(49.8);
        with_coords.longitude = Some(15.5);
        with_coords.deaths = 2;

        let data = Dataset::new(vec![
            row("Czechia", day(1), 10),
            row("Slovakia", day(1), 3),
            with_coords,
            row("Czechia", day(2), 20),
        ])
        .unwrap();

        assert_eq!(data.rows().len(), 3);
        let first = &data.rows()[0];
        assert_eq!((first.country.as_str(), first.date), ("Czechia", day(1)));
        assert_eq!(first.confirmed, 15);
        assert_eq!(first.deaths, 2);
        assert_eq!(first.latitude, Some(49.8));
        assert_eq!(data.rows_on(day(1)).filter(|r| r.country == "Czechia").count(), 1);
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("Deaths".parse::<Metric>().unwrap(), Metric::Deaths);
        assert!("hospitalized".parse::<Metric>().is_err());
        assert_eq!(row("X", day(1), 7).value(Metric::Confirmed), 7);
    }
}
