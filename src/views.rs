// src/views.rs
//! Pure composition of renderable view descriptions from state and data.
//!
//! Nothing here draws pixels: each view is a JSON-serializable description
//! that a browser-side charting layer renders.
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::DashboardError;
use crate::models::{Dataset, DashboardState, Metric, PlotKind};
use crate::state::fields::Field;
use crate::state::schema::FieldSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    TimeSeries,
    Map,
    SummaryTable,
}

impl ViewKind {
    pub const ALL: [ViewKind; 3] = [ViewKind::TimeSeries, ViewKind::Map, ViewKind::SummaryTable];

    /// The state fields the view reads. Updates to any other field leave it valid.
    pub fn dependencies(self) -> &'static [Field] {
        match self {
            ViewKind::TimeSeries => &[
                Field::SelectedCountries,
                Field::SelectedMetric,
                Field::LogScale,
                Field::PlotKind,
            ],
            ViewKind::Map => &[Field::SelectedMetric, Field::LogScale, Field::SelectedDate],
            ViewKind::SummaryTable => &[Field::SelectedCountries, Field::SelectedDate],
        }
    }

    pub fn depends_on(self, field: Field) -> bool {
        self.dependencies().contains(&field)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ViewKind::TimeSeries => "time_series",
            ViewKind::Map => "map",
            ViewKind::SummaryTable => "summary_table",
        }
    }

    pub fn render(self, state: &DashboardState, data: &Dataset) -> View {
        match self {
            ViewKind::TimeSeries => View::TimeSeries(time_series_view(state, data)),
            ViewKind::Map => View::Map(map_view(state, data)),
            ViewKind::SummaryTable => View::SummaryTable(summary_table_view(state, data)),
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ViewKind {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| DashboardError::validation("view", format!("unknown view '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    TimeSeries(TimeSeriesChart),
    Map(ChoroplethMap),
    SummaryTable(SummaryTable),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisScale {
    Linear,
    Log,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub date: NaiveDate,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub country: String,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesChart {
    pub title: String,
    pub metric: Metric,
    pub plot_kind: PlotKind,
    pub y_scale: AxisScale,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapRegion {
    pub country: String,
    pub iso_alpha3: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub value: u64,
    /// Value the region is colored by; `None` when it has no logarithm.
    pub color_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoroplethMap {
    pub title: String,
    pub date: NaiveDate,
    pub metric: Metric,
    pub color_column: String,
    pub regions: Vec<MapRegion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub country: String,
    pub iso_alpha3: Option<String>,
    pub confirmed: u64,
    pub recovered: u64,
    pub deaths: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub date: NaiveDate,
    pub columns: Vec<&'static str>,
    pub rows: Vec<SummaryRow>,
    pub totals: SummaryRow,
}

/// Everything a page needs to draw the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardLayout {
    pub title: String,
    pub controls: Vec<FieldSpec>,
    pub state: DashboardState,
    pub time_series: View,
    pub map: View,
    pub summary_table: View,
}

pub fn time_series_view(state: &DashboardState, data: &Dataset) -> TimeSeriesChart {
    let metric = state.selected_metric;
    let series = state
        .selected_countries
        .iter()
        .filter(|country| data.countries().contains(*country))
        .map(|country| Series {
            country: country.clone(),
            points: data
                .rows_for(country)
                .map(|r| Point {
                    date: r.date,
                    value: r.value(metric),
                })
                .collect(),
        })
        .collect();

    TimeSeriesChart {
        title: format!("{} over time", metric.label()),
        metric,
        plot_kind: state.plot_kind,
        y_scale: if state.log_scale { AxisScale::Log } else { AxisScale::Linear },
        series,
    }
}

fn log10_value(value: u64) -> Option<f64> {
    if value == 0 {
        None
    } else {
        Some((value as f64).log10())
    }
}

pub fn map_view(state: &DashboardState, data: &Dataset) -> ChoroplethMap {
    let metric = state.selected_metric;
    let color_column = if state.log_scale {
        format!("log10_{}", metric.as_str())
    } else {
        metric.as_str().to_string()
    };

    let regions = data
        .rows_on(state.selected_date)
        .map(|r| {
            let value = r.value(metric);
            MapRegion {
                country: r.country.clone(),
                iso_alpha3: r.iso_alpha3.clone(),
                latitude: r.latitude,
                longitude: r.longitude,
                value,
                color_value: if state.log_scale {
                    log10_value(value)
                } else {
                    Some(value as f64)
                },
            }
        })
        .collect();

    ChoroplethMap {
        title: format!("{} on {}", metric.label(), state.selected_date),
        date: state.selected_date,
        metric,
        color_column,
        regions,
    }
}

pub fn summary_table_view(state: &DashboardState, data: &Dataset) -> SummaryTable {
    let rows: Vec<SummaryRow> = data
        .rows_on(state.selected_date)
        .filter(|r| state.selected_countries.contains(&r.country))
        .map(|r| SummaryRow {
            country: r.country.clone(),
            iso_alpha3: r.iso_alpha3.clone(),
            confirmed: r.confirmed,
            recovered: r.recovered,
            deaths: r.deaths,
        })
        .collect();

    let totals = SummaryRow {
        country: "Total".to_string(),
        iso_alpha3: None,
        confirmed: rows.iter().map(|r| r.confirmed).sum(),
        recovered: rows.iter().map(|r| r.recovered).sum(),
        deaths: rows.iter().map(|r| r.deaths).sum(),
    };

    SummaryTable {
        date: state.selected_date,
        columns: vec!["country", "confirmed", "recovered", "deaths"],
        rows,
        totals,
    }
}
