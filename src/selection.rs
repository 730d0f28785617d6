use std::collections::HashSet;

use crate::record::ContractRecord;

/// Checkbox state keyed by contract number. Lives beside the dataset and is
/// never written into it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    selected: HashSet<String>,
}

impl SelectionSet {
    /// Flips the state of `contract_no` and returns the new state.
    pub fn toggle(&mut self, contract_no: &str) -> bool {
        if self.selected.remove(contract_no) {
            false
        } else {
            self.selected.insert(contract_no.to_string());
            true
        }
    }

    pub fn select(&mut self, contract_no: &str) {
        self.selected.insert(contract_no.to_string());
    }

    pub fn deselect(&mut self, contract_no: &str) {
        self.selected.remove(contract_no);
    }

    pub fn set(&mut self, contract_no: &str, selected: bool) {
        if selected {
            self.select(contract_no);
        } else {
            self.deselect(contract_no);
        }
    }

    pub fn select_all<'a>(&mut self, contract_nos: impl IntoIterator<Item = &'a str>) {
        for contract_no in contract_nos {
            self.select(contract_no);
        }
    }

    pub fn contains(&self, contract_no: &str) -> bool {
        self.selected.contains(contract_no)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}

/// Selected rows first, each partition keeping its incoming order.
pub fn order_selected_first<'a>(
    records: &'a [ContractRecord],
    selection: &SelectionSet,
) -> Vec<&'a ContractRecord> {
    let (mut selected, unselected): (Vec<_>, Vec<_>) = records
        .iter()
        .partition(|record| selection.contains(&record.contract_no));
    selected.extend(unselected);
    selected
}
