// src/state/schema.rs
use chrono::NaiveDate;
use serde::Serialize;

use super::fields::{Field, FieldValue};
use crate::models::{Dataset, Metric, PlotKind};

/// The set of admissible values for a field, plus the widget that edits it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum Domain {
    MultiSelect { options: Vec<String> },
    Select { options: Vec<String> },
    Toggle,
    DatePicker { start: NaiveDate, end: NaiveDate },
}

impl Domain {
    /// `Err` carries a human-readable reason.
    pub fn admits(&self, value: &FieldValue) -> Result<(), String> {
        match (self, value) {
            (Domain::MultiSelect { options }, FieldValue::Countries(selected)) => {
                let unknown: Vec<&str> = selected
                    .iter()
                    .filter(|c| !options.contains(*c))
                    .map(String::as_str)
                    .collect();
                if unknown.is_empty() {
                    Ok(())
                } else {
                    Err(format!("unknown countries: {}", unknown.join(", ")))
                }
            }
            (Domain::Select { options }, FieldValue::Metric(m)) => check_option(options, m.as_str()),
            (Domain::Select { options }, FieldValue::PlotKind(k)) => check_option(options, k.as_str()),
            (Domain::Toggle, FieldValue::Flag(_)) => Ok(()),
            (Domain::DatePicker { start, end }, FieldValue::Date(date)) => {
                if date < start || date > end {
                    Err(format!("{} is outside [{}, {}]", date, start, end))
                } else {
                    Ok(())
                }
            }
            (domain, value) => Err(format!("{:?} does not fit a {:?} control", value, domain)),
        }
    }
}

fn check_option(options: &[String], value: &str) -> Result<(), String> {
    if options.iter().any(|o| o == value) {
        Ok(())
    } else {
        Err(format!("'{}' is not one of {:?}", value, options))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: Field,
    pub label: &'static str,
    pub domain: Domain,
}

pub fn domain_for(field: Field, data: &Dataset) -> Domain {
    match field {
        Field::SelectedCountries => Domain::MultiSelect {
            options: data.countries().iter().cloned().collect(),
        },
        Field::SelectedMetric => Domain::Select {
            options: Metric::ALL.iter().map(|m| m.as_str().to_string()).collect(),
        },
        Field::LogScale => Domain::Toggle,
        Field::PlotKind => Domain::Select {
            options: PlotKind::ALL.iter().map(|k| k.as_str().to_string()).collect(),
        },
        Field::SelectedDate => Domain::DatePicker {
            start: data.first_date(),
            end: data.last_date(),
        },
    }
}

/// Control descriptions for every field, bounded by `data`.
pub fn schema(data: &Dataset) -> Vec<FieldSpec> {
    Field::ALL
        .into_iter()
        .map(|field| FieldSpec {
            name: field,
            label: field.label(),
            domain: domain_for(field, data),
        })
        .collect()
}
