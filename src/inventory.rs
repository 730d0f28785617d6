use csv::ReaderBuilder;
use serde::Serialize;

use crate::errors::AppResult;

/// One warehouse stock line; cells are shown exactly as exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItem {
    pub category: String,
    pub product_name: String,
    pub model: String,
    pub color: String,
    pub stock: String,
}

impl InventoryItem {
    pub fn cells(&self) -> [&str; 5] {
        [
            self.category.as_str(),
            self.product_name.as_str(),
            self.model.as_str(),
            self.color.as_str(),
            self.stock.as_str(),
        ]
    }
}

pub fn parse_inventory(text: &str) -> AppResult<Vec<InventoryItem>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut items = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let cell = |index: usize| record.get(index).unwrap_or_default().to_string();
        items.push(InventoryItem {
            category: cell(0),
            product_name: cell(1),
            model: cell(2),
            color: cell(3),
            stock: cell(4),
        });
    }
    Ok(items)
}
