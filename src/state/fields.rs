// src/state/fields.rs
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::DashboardError;
use crate::models::{DashboardState, Metric, PlotKind};

/// The editable fields of [`DashboardState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    SelectedCountries,
    SelectedMetric,
    LogScale,
    PlotKind,
    SelectedDate,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::SelectedCountries,
        Field::SelectedMetric,
        Field::LogScale,
        Field::PlotKind,
        Field::SelectedDate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::SelectedCountries => "selected_countries",
            Field::SelectedMetric => "selected_metric",
            Field::LogScale => "log_scale",
            Field::PlotKind => "plot_kind",
            Field::SelectedDate => "selected_date",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::SelectedCountries => "Countries",
            Field::SelectedMetric => "Metric",
            Field::LogScale => "Log scale",
            Field::PlotKind => "Plot type",
            Field::SelectedDate => "Date",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Field {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| DashboardError::UnknownField(s.to_string()))
    }
}

/// A typed value for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Countries(BTreeSet<String>),
    Metric(Metric),
    Flag(bool),
    PlotKind(PlotKind),
    Date(NaiveDate),
}

fn decode<T: DeserializeOwned>(field: Field, value: Value, expected: &str) -> Result<T, DashboardError> {
    serde_json::from_value(value).map_err(|e| DashboardError::validation(field.name(), format!("expected {}: {}", expected, e)))
}

impl FieldValue {
    /// Decodes a JSON payload into the value type `field` expects.
    pub fn from_json(field: Field, value: Value) -> Result<Self, DashboardError> {
        Ok(match field {
            Field::SelectedCountries => {
                FieldValue::Countries(decode(field, value, "a list of country names")?)
            }
            Field::SelectedMetric => FieldValue::Metric(decode(field, value, "a metric name")?),
            Field::LogScale => FieldValue::Flag(decode(field, value, "a boolean")?),
            Field::PlotKind => FieldValue::PlotKind(decode(field, value, "a plot kind")?),
            Field::SelectedDate => FieldValue::Date(decode(field, value, "a YYYY-MM-DD date")?),
        })
    }

    /// Reads the current value of `field` out of `state`.
    pub fn read(state: &DashboardState, field: Field) -> Self {
        match field {
            Field::SelectedCountries => FieldValue::Countries(state.selected_countries.clone()),
            Field::SelectedMetric => FieldValue::Metric(state.selected_metric),
            Field::LogScale => FieldValue::Flag(state.log_scale),
            Field::PlotKind => FieldValue::PlotKind(state.plot_kind),
            Field::SelectedDate => FieldValue::Date(state.selected_date),
        }
    }

    /// Writes the value into `state`. Fails on a type mismatch, leaving `state` untouched.
    pub fn apply(self, state: &mut DashboardState, field: Field) -> Result<(), DashboardError> {
        match (field, self) {
            (Field::SelectedCountries, FieldValue::Countries(v)) => state.selected_countries = v,
            (Field::SelectedMetric, FieldValue::Metric(v)) => state.selected_metric = v,
            (Field::LogScale, FieldValue::Flag(v)) => state.log_scale = v,
            (Field::PlotKind, FieldValue::PlotKind(v)) => state.plot_kind = v,
            (Field::SelectedDate, FieldValue::Date(v)) => state.selected_date = v,
            (field, value) => {
                return Err(DashboardError::validation(
                    field.name(),
                    format!("value {:?} has the wrong type", value),
                ))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_names_round_trip_through_from_str() {
        for field in Field::ALL {
            assert_eq!(field.name().parse::<Field>().unwrap(), field);
        }
        assert!(matches!("colour".parse::<Field>(), Err(DashboardError::UnknownField(_))));
    }

    #[test]
    fn test_from_json_decodes_expected_types() {
        assert_eq!(
            FieldValue::from_json(Field::SelectedDate, json!("2020-04-01")).unwrap(),
            FieldValue::Date(NaiveDate::from_ymd_opt(2020, 4, 1).unwrap())
        );
        assert_eq!(
            FieldValue::from_json(Field::PlotKind, json!("bar")).unwrap(),
            FieldValue::PlotKind(PlotKind::Bar)
        );
        let countries = FieldValue::from_json(Field::SelectedCountries, json!(["Czechia", "Czechia"])).unwrap();
        assert_eq!(countries, FieldValue::Countries(BTreeSet::from(["Czechia".to_string()])));
    }

    #[test]
    fn test_from_json_rejects_wrong_types() {
        for (field, value) in [
            (Field::LogScale, json!("yes")),
            (Field::SelectedMetric, json!("active")),
            (Field::SelectedDate, json!("04/01/2020")),
            (Field::SelectedCountries, json!("Czechia")),
        ] {
            let err = FieldValue::from_json(field, value).unwrap_err();
            assert!(matches!(err, DashboardError::Validation { .. }), "{:?}", err);
        }
    }

    #[test]
    fn test_apply_type_mismatch_leaves_state() {
        let mut state = DashboardState {
            selected_countries: BTreeSet::new(),
            selected_metric: Metric::Confirmed,
            log_scale: false,
            plot_kind: PlotKind::Line,
            selected_date: NaiveDate::from_ymd_opt(2020, 4, 1).unwrap(),
        };
        let before = state.clone();
        assert!(FieldValue::Flag(true).apply(&mut state, Field::PlotKind).is_err());
        assert_eq!(state, before);

        FieldValue::Flag(true).apply(&mut state, Field::LogScale).unwrap();
        assert!(state.log_scale);
        assert_eq!(FieldValue::read(&state, Field::LogScale), FieldValue::Flag(true));
    }
}
