// src/services/country_codes.rs
use csv::Reader;
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};

use crate::models::TimeSeriesRow;

const EMBEDDED_TABLE: &str = include_str!("../../data/country_codes.csv");

/// Country display name -> ISO 3166-1 alpha-3 lookup.
#[derive(Debug, Clone, Default)]
pub struct CountryCodes {
    by_name: HashMap<String, String>,
}

fn normalize(name: &str) -> String {
    name.trim().trim_end_matches('*').trim().to_lowercase()
}

impl CountryCodes {
    /// Table shipped with the crate. Malformed lines are skipped.
    pub fn embedded() -> Self {
        Self::from_csv(EMBEDDED_TABLE)
    }

    /// Reads a two-column `name,iso_alpha3` table with a header line.
    pub fn from_csv(text: &str) -> Self {
        let mut rdr = Reader::from_reader(text.as_bytes());
        let mut by_name = HashMap::new();

        for record in rdr.records() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    warn!("Skipping malformed country code entry: {}", e);
                    continue;
                }
            };
            match (record.get(0), record.get(1)) {
                (Some(name), Some(code)) if code.trim().len() == 3 => {
                    by_name.insert(normalize(name), code.trim().to_uppercase());
                }
                _ => warn!("Skipping country code entry without a 3-letter code: {:?}", record),
            }
        }

        CountryCodes { by_name }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn code_for(&self, country: &str) -> Option<&str> {
        self.by_name.get(&normalize(country)).map(String::as_str)
    }

    /// Fills `iso_alpha3` on every row; unknown names are left empty.
    pub fn annotate(&self, rows: &mut [TimeSeriesRow]) {
        let mut unmatched = BTreeSet::new();
        for row in rows.iter_mut() {
            row.iso_alpha3 = self.code_for(&row.country).map(str::to_string);
            if row.iso_alpha3.is_none() {
                unmatched.insert(row.country.clone());
            }
        }
        if !unmatched.is_empty() {
            debug!("No ISO alpha-3 code for {} countries: {:?}", unmatched.len(), unmatched);
        }
    }
}
