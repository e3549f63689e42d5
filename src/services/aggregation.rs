// src/services/aggregation.rs
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;

use crate::models::TimeSeriesRow;
use crate::services::covid_csv::RawRecord;

#[derive(Default)]
struct Totals {
    confirmed: u64,
    recovered: u64,
    deaths: u64,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Source cells may be blank, fractional or (after corrections) negative.
fn count(value: Option<f64>) -> u64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.round() as u64,
        _ => 0,
    }
}

/// Collapses province-level records into one row per (country, date).
///
/// Counts are summed; the coordinates are those of the first record in the
/// group that carries them. Output is ordered by country, then date.
pub fn aggregate(records: Vec<RawRecord>) -> Vec<TimeSeriesRow> {
    let input_len = records.len();
    let mut groups: BTreeMap<(String, NaiveDate), Totals> = BTreeMap::new();

    for record in records {
        let totals = groups
            .entry((record.country.trim().to_string(), record.date))
            .or_default();

        totals.confirmed = totals.confirmed.saturating_add(count(record.confirmed));
        totals.recovered = totals.recovered.saturating_add(count(record.recovered));
        totals.deaths = totals.deaths.saturating_add(count(record.deaths));

        if totals.latitude.is_none() && totals.longitude.is_none() {
            if let (Some(lat), Some(long)) = (record.lat, record.long) {
                totals.latitude = Some(lat);
                totals.longitude = Some(long);
            }
        }
    }

    debug!("Aggregated {} records into {} country/date rows", input_len, groups.len());

    groups
        .into_iter()
        .map(|((country, date), totals)| TimeSeriesRow {
            country,
            date,
            confirmed: totals.confirmed,
            recovered: totals.recovered,
            deaths: totals.deaths,
            latitude: totals.latitude,
            longitude: totals.longitude,
            iso_alpha3: None,
        })
        .collect()
}
