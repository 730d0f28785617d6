use serde::Serialize;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::record::ContractRecord;
use crate::schema::FlagField;
use crate::selection::SelectionSet;

/// The single predicate that decides the visible subset. Applying a new one
/// replaces the previous view; selectors never compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilterSelector {
    All,
    DelayAtLeast(i64),
    Flag(FlagField),
    SelectedOnly,
}

impl FilterSelector {
    pub fn label(&self) -> String {
        match self {
            FilterSelector::All => "all".to_string(),
            FilterSelector::DelayAtLeast(days) => format!("delay >= {days}"),
            FilterSelector::Flag(flag) => format!("{} = 1", flag.as_str()),
            FilterSelector::SelectedOnly => "selected".to_string(),
        }
    }

    pub fn matches(&self, record: &ContractRecord, selection: &SelectionSet) -> bool {
        match self {
            FilterSelector::All => true,
            FilterSelector::DelayAtLeast(threshold) => record
                .delay_days_value()
                .map(|days| days >= *threshold)
                .unwrap_or(false),
            FilterSelector::Flag(flag) => record.flag(*flag) == Some(1),
            FilterSelector::SelectedOnly => selection.contains(&record.contract_no),
        }
    }
}

pub fn apply_filter(
    records: &[ContractRecord],
    selector: FilterSelector,
    selection: &SelectionSet,
) -> Vec<ContractRecord> {
    let visible: Vec<ContractRecord> = records
        .iter()
        .filter(|record| selector.matches(record, selection))
        .cloned()
        .collect();
    debug!(
        target: "filter",
        selector = %selector.label(),
        total = records.len(),
        visible = visible.len(),
        "applied filter"
    );
    visible
}

/// Validates a user-typed delay threshold.
pub fn parse_delay_threshold(input: &str) -> AppResult<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "enter the number of delay days to filter by".into(),
        ));
    }
    trimmed.parse::<i64>().map_err(|_| {
        AppError::Validation(format!("delay days must be a whole number, got \"{trimmed}\""))
    })
}
