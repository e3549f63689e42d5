// src/state/mod.rs
//! The reactive state model.
//!
//! A [`Dashboard`] owns the cached dataset, the current [`DashboardState`] and
//! the last rendering of every view. Field updates invalidate only the views
//! whose dependency list names the field; views are recomputed lazily on the
//! next read.
pub mod fields;
pub mod schema;

use chrono::{NaiveDate, Utc};
use log::{debug, error, info, warn};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::DashboardError;
use crate::models::{Dataset, DashboardState, Metric, PlotKind, TimeSeriesRow};
use crate::services::DataSource;
use crate::views::{DashboardLayout, View, ViewKind};
use fields::{Field, FieldValue};
use schema::{domain_for, FieldSpec};

pub type SharedDashboard = Arc<Mutex<Dashboard>>;

#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub title: String,
    pub max_data_age_days: i64,
    pub default_countries: Vec<String>,
}

impl From<&Config> for DashboardSettings {
    fn from(config: &Config) -> Self {
        DashboardSettings {
            title: config.title.clone(),
            max_data_age_days: config.max_data_age_days,
            default_countries: config.default_countries.clone(),
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn default_selection(data: &Dataset, preferred: &[String]) -> BTreeSet<String> {
    let selected: BTreeSet<String> = preferred
        .iter()
        .filter(|c| data.countries().contains(*c))
        .cloned()
        .collect();
    if selected.is_empty() {
        data.countries().iter().next().cloned().into_iter().collect()
    } else {
        selected
    }
}

impl DashboardState {
    pub fn initial(data: &Dataset, default_countries: &[String]) -> Self {
        DashboardState {
            selected_countries: default_selection(data, default_countries),
            selected_metric: Metric::Confirmed,
            log_scale: false,
            plot_kind: PlotKind::Line,
            selected_date: data.last_date(),
        }
    }

    /// Brings the selection back inside the bounds of `data`.
    pub fn rebound(&mut self, data: &Dataset, default_countries: &[String]) {
        let (start, end) = (data.first_date(), data.last_date());
        let clamped = self.selected_date.clamp(start, end);
        if clamped != self.selected_date {
            info!("Selected date {} is outside [{}, {}], clamping to {}", self.selected_date, start, end, clamped);
            self.selected_date = clamped;
        }

        let before = self.selected_countries.len();
        self.selected_countries.retain(|c| data.countries().contains(c));
        if self.selected_countries.len() != before {
            warn!("Dropped {} selected countries missing from the reloaded data", before - self.selected_countries.len());
            if self.selected_countries.is_empty() {
                self.selected_countries = default_selection(data, default_countries);
            }
        }
    }
}

#[derive(Debug, Default)]
struct ViewCache {
    rendered: HashMap<ViewKind, View>,
    recomputes: HashMap<ViewKind, usize>,
}

impl ViewCache {
    fn invalidate(&mut self, kind: ViewKind) -> bool {
        self.rendered.remove(&kind).is_some()
    }

    fn invalidate_all(&mut self) {
        self.rendered.clear();
    }
}

pub struct Dashboard {
    source: Arc<dyn DataSource>,
    settings: DashboardSettings,
    dataset: Arc<Dataset>,
    state: DashboardState,
    views: ViewCache,
    /// Day of the last automatic reload attempt, successful or not.
    reload_attempted_on: NaiveDate,
    loads: usize,
}

impl Dashboard {
    pub async fn new(source: Arc<dyn DataSource>, settings: DashboardSettings) -> Result<Self, DashboardError> {
        Self::new_at(source, settings, today()).await
    }

    pub async fn new_at(
        source: Arc<dyn DataSource>,
        settings: DashboardSettings,
        today: NaiveDate,
    ) -> Result<Self, DashboardError> {
        info!("Initializing dashboard '{}' from {}", settings.title, source.describe());
        let dataset = Arc::new(load_dataset(source.as_ref()).await?);
        let state = DashboardState::initial(&dataset, &settings.default_countries);
        info!(
            "Dashboard initialized: {} countries, {} to {}",
            dataset.countries().len(),
            dataset.first_date(),
            dataset.last_date()
        );

        Ok(Dashboard {
            source,
            settings,
            dataset,
            state,
            views: ViewCache::default(),
            reload_attempted_on: today,
            loads: 1,
        })
    }

    pub fn into_shared(self) -> SharedDashboard {
        Arc::new(Mutex::new(self))
    }

    pub fn title(&self) -> &str {
        &self.settings.title
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Number of successful loads, the initial one included.
    pub fn load_count(&self) -> usize {
        self.loads
    }

    pub fn recompute_count(&self, kind: ViewKind) -> usize {
        self.views.recomputes.get(&kind).copied().unwrap_or(0)
    }

    pub fn schema(&self) -> Vec<FieldSpec> {
        schema::schema(&self.dataset)
    }

    /// Validates and applies one field edit. Returns the views it invalidated.
    ///
    /// On error the previous state is kept.
    pub fn update(&mut self, field: Field, value: FieldValue) -> Result<Vec<ViewKind>, DashboardError> {
        domain_for(field, &self.dataset)
            .admits(&value)
            .map_err(|message| DashboardError::validation(field.name(), message))?;

        let old = FieldValue::read(&self.state, field);
        if old == value {
            debug!("Update of {} to the current value ignored", field);
            return Ok(Vec::new());
        }
        value.apply(&mut self.state, field)?;

        let invalidated: Vec<ViewKind> = ViewKind::ALL
            .into_iter()
            .filter(|kind| kind.depends_on(field))
            .filter(|kind| self.views.invalidate(*kind))
            .collect();
        info!("Updated {}; invalidated views: {:?}", field, invalidated);
        Ok(invalidated)
    }

    pub async fn current_data(&mut self) -> Result<Arc<Dataset>, DashboardError> {
        self.current_data_at(today()).await
    }

    /// Returns the cached dataset, reloading first when it is stale.
    ///
    /// At most one automatic reload is attempted per day. A failed attempt is
    /// logged and the cached data is served; only [`Dashboard::reload`]
    /// surfaces load errors.
    pub async fn current_data_at(&mut self, today: NaiveDate) -> Result<Arc<Dataset>, DashboardError> {
        if self.dataset.is_stale(today, self.settings.max_data_age_days) && self.reload_attempted_on < today {
            info!(
                "Data ends on {}, older than {} day(s); reloading",
                self.dataset.last_date(),
                self.settings.max_data_age_days
            );
            self.reload_attempted_on = today;
            if let Err(e) = self.reload_at(today).await {
                error!("Automatic reload failed, serving data ending on {}: {}", self.dataset.last_date(), e);
            }
        } else {
            debug!("Using cached data ending on {}", self.dataset.last_date());
        }
        Ok(Arc::clone(&self.dataset))
    }

    pub async fn reload(&mut self) -> Result<Arc<Dataset>, DashboardError> {
        self.reload_at(today()).await
    }

    /// Loads unconditionally. On failure the previous data and state remain.
    pub async fn reload_at(&mut self, today: NaiveDate) -> Result<Arc<Dataset>, DashboardError> {
        let dataset = load_dataset(self.source.as_ref()).await?;
        self.state.rebound(&dataset, &self.settings.default_countries);
        self.dataset = Arc::new(dataset);
        self.views.invalidate_all();
        self.reload_attempted_on = self.reload_attempted_on.max(today);
        self.loads += 1;
        info!(
            "Reloaded data from {}: {} countries, {} to {}",
            self.source.describe(),
            self.dataset.countries().len(),
            self.dataset.first_date(),
            self.dataset.last_date()
        );
        Ok(Arc::clone(&self.dataset))
    }

    pub async fn view(&mut self, kind: ViewKind) -> Result<View, DashboardError> {
        self.view_at(kind, today()).await
    }

    pub async fn view_at(&mut self, kind: ViewKind, today: NaiveDate) -> Result<View, DashboardError> {
        let data = self.current_data_at(today).await?;
        if let Some(view) = self.views.rendered.get(&kind) {
            debug!("View {} is up to date", kind);
            return Ok(view.clone());
        }

        debug!("Recomputing view {}", kind);
        let view = kind.render(&self.state, &data);
        self.views.rendered.insert(kind, view.clone());
        *self.views.recomputes.entry(kind).or_insert(0) += 1;
        Ok(view)
    }

    pub async fn filtered_rows(&mut self) -> Result<Vec<TimeSeriesRow>, DashboardError> {
        self.filtered_rows_at(today()).await
    }

    /// Rows of the currently selected countries.
    pub async fn filtered_rows_at(&mut self, today: NaiveDate) -> Result<Vec<TimeSeriesRow>, DashboardError> {
        let data = self.current_data_at(today).await?;
        Ok(data
            .rows()
            .iter()
            .filter(|r| self.state.selected_countries.contains(&r.country))
            .cloned()
            .collect())
    }

    pub async fn layout(&mut self) -> Result<DashboardLayout, DashboardError> {
        self.layout_at(today()).await
    }

    pub async fn layout_at(&mut self, today: NaiveDate) -> Result<DashboardLayout, DashboardError> {
        let time_series = self.view_at(ViewKind::TimeSeries, today).await?;
        let map = self.view_at(ViewKind::Map, today).await?;
        let summary_table = self.view_at(ViewKind::SummaryTable, today).await?;

        Ok(DashboardLayout {
            title: self.settings.title.clone(),
            controls: self.schema(),
            state: self.state.clone(),
            time_series,
            map,
            summary_table,
        })
    }
}

async fn load_dataset(source: &dyn DataSource) -> Result<Dataset, DashboardError> {
    let rows = source.load().await?;
    Dataset::new(rows)
}
