use std::collections::HashMap;

use crate::record::ContractRecord;

/// Exact `"lat,lon"` text key. Coordinates that differ only by float rounding
/// land in different groups; `-0` and `0` share one.
pub fn location_key(latitude: f64, longitude: f64) -> String {
    format!("{},{}", unsigned_zero(latitude), unsigned_zero(longitude))
}

fn unsigned_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationGroup {
    pub key: String,
    pub records: Vec<ContractRecord>,
}

impl LocationGroup {
    pub fn latitude(&self) -> f64 {
        self.records.first().map(|r| r.latitude).unwrap_or(f64::NAN)
    }

    pub fn longitude(&self) -> f64 {
        self.records.first().map(|r| r.longitude).unwrap_or(f64::NAN)
    }

    /// False for the bucket of records whose coordinates failed to parse.
    pub fn is_mappable(&self) -> bool {
        self.latitude().is_finite() && self.longitude().is_finite()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contract_numbers(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.contract_no.as_str()).collect()
    }

    pub fn label(&self) -> String {
        self.contract_numbers().join(", ")
    }
}

/// Partitions `records` by location, groups ordered by first appearance.
pub fn group_by_location(records: &[ContractRecord]) -> Vec<LocationGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<LocationGroup> = Vec::new();
    for record in records {
        let key = location_key(record.latitude, record.longitude);
        match index.get(&key) {
            Some(&position) => groups[position].records.push(record.clone()),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(LocationGroup {
                    key,
                    records: vec![record.clone()],
                });
            }
        }
    }
    groups
}
