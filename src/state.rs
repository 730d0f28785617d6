use tracing::debug;

use crate::errors::AppResult;
use crate::filter::{apply_filter, parse_delay_threshold, FilterSelector};
use crate::grouping::{group_by_location, LocationGroup};
use crate::record::ContractRecord;
use crate::schema::DatasetSchema;
use crate::selection::{order_selected_first, SelectionSet};

/// Everything both views are rendered from. The visible subset and the
/// location groups are always derived from `full_dataset` in one step, so a
/// failed operation leaves the previous derivation intact.
#[derive(Debug, Clone)]
pub struct DashboardState {
    schema: DatasetSchema,
    full_dataset: Vec<ContractRecord>,
    visible: Vec<ContractRecord>,
    groups: Vec<LocationGroup>,
    selection: SelectionSet,
    active_filter: FilterSelector,
}

impl DashboardState {
    pub fn new(schema: DatasetSchema) -> Self {
        let active_filter = schema.default_filter();
        Self {
            schema,
            full_dataset: Vec::new(),
            visible: Vec::new(),
            groups: Vec::new(),
            selection: SelectionSet::default(),
            active_filter,
        }
    }

    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    pub fn full_dataset(&self) -> &[ContractRecord] {
        &self.full_dataset
    }

    pub fn visible(&self) -> &[ContractRecord] {
        &self.visible
    }

    pub fn groups(&self) -> &[LocationGroup] {
        &self.groups
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn active_filter(&self) -> FilterSelector {
        self.active_filter
    }

    /// Swaps in a freshly decoded dataset, dropping the selection and falling
    /// back to the schema's default filter.
    pub fn replace_dataset(&mut self, records: Vec<ContractRecord>) {
        self.full_dataset = records;
        self.selection.clear();
        let selector = self.schema.default_filter();
        self.apply_filter(selector);
    }

    pub fn clear(&mut self) {
        self.replace_dataset(Vec::new());
    }

    pub fn apply_filter(&mut self, selector: FilterSelector) {
        let visible = apply_filter(&self.full_dataset, selector, &self.selection);
        self.set_visible(selector, visible);
    }

    /// Filters by a user-typed threshold; invalid input changes nothing.
    pub fn filter_by_delay_input(&mut self, input: &str) -> AppResult<()> {
        let threshold = parse_delay_threshold(input)?;
        self.apply_filter(FilterSelector::DelayAtLeast(threshold));
        Ok(())
    }

    pub fn show_selected(&mut self) {
        self.apply_filter(FilterSelector::SelectedOnly);
    }

    /// Flips a checkbox and returns its new state, or `None` when the
    /// contract is not in the current dataset.
    pub fn toggle_selection(&mut self, contract_no: &str) -> Option<bool> {
        if !self.knows(contract_no) {
            return None;
        }
        Some(self.selection.toggle(contract_no))
    }

    /// Returns false when the contract is unknown and nothing changed.
    pub fn set_selected(&mut self, contract_no: &str, selected: bool) -> bool {
        if !self.knows(contract_no) {
            return false;
        }
        self.selection.set(contract_no, selected);
        true
    }

    /// Marks every member of the group at `key` as selected. A key from an
    /// older render that no longer names a group is ignored.
    pub fn marker_clicked(&mut self, key: &str) -> Option<LocationGroup> {
        let Some(group) = self.groups.iter().find(|group| group.key == key).cloned() else {
            debug!(target: "selection", %key, "marker click for unknown group ignored");
            return None;
        };
        self.selection.select_all(group.contract_numbers());
        Some(group)
    }

    /// Visible rows in table order: selected first.
    pub fn table_rows(&self) -> Vec<&ContractRecord> {
        order_selected_first(&self.visible, &self.selection)
    }

    fn knows(&self, contract_no: &str) -> bool {
        let known = self
            .full_dataset
            .iter()
            .any(|record| record.contract_no == contract_no);
        if !known {
            debug!(target: "selection", %contract_no, "checkbox for unknown contract ignored");
        }
        known
    }

    fn set_visible(&mut self, selector: FilterSelector, visible: Vec<ContractRecord>) {
        self.groups = group_by_location(&visible);
        self.visible = visible;
        self.active_filter = selector;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FlagField, SchemaVersion};

    fn record(no: &str, delay: &str, latitude: f64, longitude: f64) -> ContractRecord {
        ContractRecord {
            contract_no: no.into(),
            company_name: format!("{no} company"),
            address: String::new(),
            rental_machine: String::new(),
            delay_days: delay.into(),
            latitude,
            longitude,
            toner_check: Some(0),
            viko_check: Some(if no == "B" { 1 } else { 0 }),
        }
    }

    fn sample() -> Vec<ContractRecord> {
        vec![
            record("A", "120", 37.1, 127.1),
            record("B", "10", 37.1, 127.1),
            record("C", "95", 37.2, 127.2),
        ]
    }

    fn viko_state() -> DashboardState {
        let mut state = DashboardState::new(DatasetSchema::for_version(SchemaVersion::Viko));
        state.replace_dataset(sample());
        state
    }

    #[test]
    fn loading_applies_default_delay_filter() {
        let state = viko_state();
        assert_eq!(state.active_filter(), FilterSelector::DelayAtLeast(90));
        assert_eq!(state.visible().len(), 2);
        assert_eq!(state.groups().len(), 2);
    }

    #[test]
    fn basic_schema_shows_everything_on_load() {
        let mut state = DashboardState::new(DatasetSchema::for_version(SchemaVersion::Basic));
        state.replace_dataset(sample());
        assert_eq!(state.active_filter(), FilterSelector::All);
        assert_eq!(state.visible().len(), 3);
    }

    #[test]
    fn filter_sequence_scenario() {
        let mut state = viko_state();
        state.apply_filter(FilterSelector::DelayAtLeast(90));
        assert!(state.visible().len() <= 3);
        state.apply_filter(FilterSelector::All);
        assert_eq!(state.visible().len(), 3);
        state.set_selected("C", true);
        state.show_selected();
        assert_eq!(state.visible().len(), 1);
        assert_eq!(state.visible()[0].contract_no, "C");
    }

    #[test]
    fn invalid_threshold_leaves_state_untouched() {
        let mut state = viko_state();
        state.apply_filter(FilterSelector::Flag(FlagField::Viko));
        let before = state.visible().to_vec();
        let err = state.filter_by_delay_input("lots").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(state.visible(), before.as_slice());
        assert_eq!(state.active_filter(), FilterSelector::Flag(FlagField::Viko));
    }

    #[test]
    fn marker_click_selects_members() {
        let mut state = viko_state();
        state.apply_filter(FilterSelector::All);
        let group = state.marker_clicked("37.1,127.1").expect("group");
        assert_eq!(group.contract_numbers(), vec!["A", "B"]);
        assert!(state.selection().contains("A"));
        assert!(state.selection().contains("B"));
        assert!(state.marker_clicked("1,1").is_none());
        assert_eq!(state.selection().len(), 2);
    }

    #[test]
    fn marker_click_from_previous_dataset_is_ignored() {
        let mut state = DashboardState::new(DatasetSchema::for_version(SchemaVersion::Basic));
        state.replace_dataset(vec![record("OLD-1", "1", 1.0, 127.0)]);
        let old_key = state.groups()[0].key.clone();

        state.replace_dataset(vec![record("NEW-9", "1", 2.0, 127.0)]);
        assert!(state.marker_clicked(&old_key).is_none());
        assert!(state.selection().is_empty());
    }

    #[test]
    fn unknown_contract_checkbox_is_ignored() {
        let mut state = DashboardState::new(DatasetSchema::for_version(SchemaVersion::Viko));
        assert_eq!(state.toggle_selection("NOT-IN-DATASET"), None);
        assert!(state.selection().is_empty());

        state.replace_dataset(sample());
        assert!(!state.set_selected("Z", true));
        assert_eq!(state.toggle_selection("A"), Some(true));
        assert_eq!(state.selection().len(), 1);
        assert_eq!(crate::render::render(&state).selected_count, 1);
    }

    #[test]
    fn table_rows_put_selection_first() {
        let mut state = viko_state();
        state.apply_filter(FilterSelector::All);
        state.toggle_selection("C");
        let order: Vec<&str> = state
            .table_rows()
            .into_iter()
            .map(|r| r.contract_no.as_str())
            .collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[test]
    fn replacing_dataset_resets_selection() {
        let mut state = viko_state();
        state.toggle_selection("A");
        state.replace_dataset(sample());
        assert!(state.selection().is_empty());
        state.clear();
        assert!(state.visible().is_empty());
        assert!(state.groups().is_empty());
    }
}
