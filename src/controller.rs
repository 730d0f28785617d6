use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::errors::AppResult;
use crate::filter::FilterSelector;
use crate::grouping::LocationGroup;
use crate::inventory::{parse_inventory, InventoryItem};
use crate::record::parse_contracts;
use crate::render::{render, RenderPlan};
use crate::schema::DatasetSchema;
use crate::source::{dated_contract_path, DataSource};
use crate::state::DashboardState;

/// File locations relative to the data source.
#[derive(Debug, Clone)]
pub struct DataPaths {
    /// Fixed contract export; when unset the dated daily export is used.
    pub contract_file: Option<String>,
    pub inventory_file: String,
    pub date_file: String,
}

impl DataPaths {
    pub fn contract_path(&self, date: Option<NaiveDate>) -> String {
        match (date, &self.contract_file) {
            (Some(date), _) => dated_contract_path(date),
            (None, Some(fixed)) => fixed.clone(),
            (None, None) => dated_contract_path(chrono::Local::now().date_naive()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Applied { records: usize, visible: usize },
    /// A newer refresh was issued while this one was in flight.
    Stale,
    /// The fetch failed; the dataset was cleared.
    Failed,
}

/// Owns the dashboard state and serialises data refreshes against it.
pub struct DashboardController {
    source: Arc<dyn DataSource>,
    paths: DataPaths,
    state: Mutex<DashboardState>,
    latest_request: AtomicU64,
}

impl DashboardController {
    pub fn new(source: Arc<dyn DataSource>, schema: DatasetSchema, paths: DataPaths) -> Self {
        Self {
            source,
            paths,
            state: Mutex::new(DashboardState::new(schema)),
            latest_request: AtomicU64::new(0),
        }
    }

    /// Fetches and decodes a contract export, applying it only if no newer
    /// refresh was started in the meantime.
    pub async fn refresh(&self, date: Option<NaiveDate>) -> AppResult<RefreshOutcome> {
        let token = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        let path = self.paths.contract_path(date);
        debug!(target: "dashboard_refresh", token, %path, "refresh requested");

        let fetched = self.source.fetch_text(&path).await;

        let mut state = self.state.lock();
        if self.latest_request.load(Ordering::SeqCst) != token {
            debug!(target: "dashboard_refresh", token, %path, "discarding stale response");
            return Ok(RefreshOutcome::Stale);
        }

        match fetched {
            Ok(text) => {
                let records = parse_contracts(&text, state.schema());
                let count = records.len();
                state.replace_dataset(records);
                info!(
                    target: "dashboard_refresh",
                    token,
                    %path,
                    records = count,
                    visible = state.visible().len(),
                    "dataset replaced"
                );
                Ok(RefreshOutcome::Applied {
                    records: count,
                    visible: state.visible().len(),
                })
            }
            Err(err) => {
                error!(
                    target: "dashboard_refresh",
                    token,
                    %path,
                    source = %self.source.describe(),
                    error = %err,
                    "failed to fetch contract data"
                );
                state.clear();
                Ok(RefreshOutcome::Failed)
            }
        }
    }

    pub async fn load_inventory(&self) -> AppResult<Vec<InventoryItem>> {
        let text = self.source.fetch_text(&self.paths.inventory_file).await?;
        parse_inventory(&text)
    }

    pub async fn load_update_date(&self) -> AppResult<String> {
        let text = self.source.fetch_text(&self.paths.date_file).await?;
        Ok(text.trim().to_string())
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&DashboardState) -> R) -> R {
        f(&self.state.lock())
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state.lock().clone()
    }

    pub fn render(&self) -> RenderPlan {
        render(&self.state.lock())
    }

    pub fn apply_filter(&self, selector: FilterSelector) -> RenderPlan {
        let mut state = self.state.lock();
        state.apply_filter(selector);
        render(&state)
    }

    pub fn filter_by_delay_input(&self, input: &str) -> AppResult<RenderPlan> {
        let mut state = self.state.lock();
        state.filter_by_delay_input(input)?;
        Ok(render(&state))
    }

    pub fn show_selected(&self) -> RenderPlan {
        self.apply_filter(FilterSelector::SelectedOnly)
    }

    pub fn toggle_selection(&self, contract_no: &str) -> RenderPlan {
        let mut state = self.state.lock();
        state.toggle_selection(contract_no);
        render(&state)
    }

    pub fn set_selected(&self, contract_no: &str, selected: bool) -> RenderPlan {
        let mut state = self.state.lock();
        state.set_selected(contract_no, selected);
        render(&state)
    }

    pub fn marker_clicked(&self, key: &str) -> Option<LocationGroup> {
        self.state.lock().marker_clicked(key)
    }
}
