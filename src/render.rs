//! Pure projection of [`DashboardState`] into what the map and table draw.
//!
//! The UI layer clears and rebuilds both views from a fresh [`RenderPlan`]
//! after every change; nothing here is incremental.

use serde::Serialize;

use crate::filter::FilterSelector;
use crate::grouping::LocationGroup;
use crate::record::ContractRecord;
use crate::schema::FlagField;
use crate::state::DashboardState;

#[derive(Debug, Clone, Serialize)]
pub struct RenderPlan {
    pub filter: FilterSelector,
    pub filter_label: String,
    pub markers: Vec<MarkerSpec>,
    /// Visible contracts whose coordinates could not be parsed.
    pub unmapped: Vec<String>,
    pub rows: Vec<TableRow>,
    pub visible_count: usize,
    pub total_count: usize,
    pub selected_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkerSpec {
    /// Location key, handed back on marker click.
    pub key: String,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub contract_numbers: Vec<String>,
    pub info: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableRow {
    pub contract_no: String,
    pub selected: bool,
    pub cells: Vec<String>,
}

pub fn render(state: &DashboardState) -> RenderPlan {
    let mut markers = Vec::new();
    let mut unmapped = Vec::new();
    for group in state.groups() {
        if group.is_mappable() {
            markers.push(marker_for(group));
        } else {
            unmapped.extend(group.contract_numbers().into_iter().map(String::from));
        }
    }

    let flags = state.schema().flags();
    let rows = state
        .table_rows()
        .into_iter()
        .map(|record| TableRow {
            contract_no: record.contract_no.clone(),
            selected: state.selection().contains(&record.contract_no),
            cells: table_cells(record, &flags),
        })
        .collect();

    RenderPlan {
        filter: state.active_filter(),
        filter_label: state.active_filter().label(),
        markers,
        unmapped,
        rows,
        visible_count: state.visible().len(),
        total_count: state.full_dataset().len(),
        selected_count: state.selection().len(),
    }
}

fn marker_for(group: &LocationGroup) -> MarkerSpec {
    MarkerSpec {
        key: group.key.clone(),
        latitude: group.latitude(),
        longitude: group.longitude(),
        title: marker_title(group),
        contract_numbers: group
            .contract_numbers()
            .into_iter()
            .map(String::from)
            .collect(),
        info: info_lines(group),
    }
}

pub fn marker_title(group: &LocationGroup) -> String {
    format!("계약번호: {} (계약 건수: {})", group.label(), group.len())
}

/// Lines of the info overlay opened when a marker is clicked.
pub fn info_lines(group: &LocationGroup) -> Vec<String> {
    let mut lines: Vec<String> = group
        .records
        .iter()
        .map(|record| format!("계약번호: {}", record.contract_no))
        .collect();
    lines.push(format!("계약 건수: {}", group.len()));
    lines
}

pub fn table_cells(record: &ContractRecord, flags: &[FlagField]) -> Vec<String> {
    let mut cells = vec![
        record.contract_no.clone(),
        record.company_name.clone(),
        record.address.clone(),
        record.rental_machine.clone(),
        record.delay_days.clone(),
        format_coordinate(record.latitude),
        format_coordinate(record.longitude),
    ];
    cells.extend(flags.iter().map(|flag| {
        record
            .flag(*flag)
            .map(|value| value.to_string())
            .unwrap_or_default()
    }));
    cells
}

fn format_coordinate(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.6}")
    } else {
        "NaN".to_string()
    }
}
