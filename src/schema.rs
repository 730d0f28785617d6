//! Column layouts of the contract exports.
//!
//! The batch job that produces the CSV snapshots has grown columns over time;
//! each layout is declared here once and decoded generically.

use serde::Serialize;

use crate::errors::{AppError, AppResult};
use crate::filter::FilterSelector;

pub const DEFAULT_DELAY_THRESHOLD: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVersion {
    /// contract, company, address, machine, delay, lat, lon
    Basic,
    /// `Basic` plus the toner-check flag.
    Toner,
    /// `Toner` plus the viko-check flag.
    Viko,
}

impl SchemaVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::Basic => "basic",
            SchemaVersion::Toner => "toner",
            SchemaVersion::Viko => "viko",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(SchemaVersion::Basic),
            "toner" => Ok(SchemaVersion::Toner),
            "viko" => Ok(SchemaVersion::Viko),
            _ => Err(AppError::Config(format!("unknown dataset schema: {value}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagField {
    Toner,
    Viko,
}

impl FlagField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagField::Toner => "toner",
            FlagField::Viko => "viko",
        }
    }

    fn field(&self) -> ContractField {
        match self {
            FlagField::Toner => ContractField::TonerCheck,
            FlagField::Viko => ContractField::VikoCheck,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractField {
    ContractNo,
    CompanyName,
    Address,
    RentalMachine,
    DelayDays,
    Latitude,
    Longitude,
    TonerCheck,
    VikoCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Float,
    Flag,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub field: ContractField,
    pub kind: ColumnKind,
}

impl Column {
    const fn new(field: ContractField, kind: ColumnKind) -> Self {
        Self { field, kind }
    }
}

const BASE_COLUMNS: [Column; 7] = [
    Column::new(ContractField::ContractNo, ColumnKind::Text),
    Column::new(ContractField::CompanyName, ColumnKind::Text),
    Column::new(ContractField::Address, ColumnKind::Text),
    Column::new(ContractField::RentalMachine, ColumnKind::Text),
    Column::new(ContractField::DelayDays, ColumnKind::Text),
    Column::new(ContractField::Latitude, ColumnKind::Float),
    Column::new(ContractField::Longitude, ColumnKind::Float),
];

#[derive(Debug, Clone)]
pub struct DatasetSchema {
    pub version: SchemaVersion,
    pub columns: Vec<Column>,
    default_delay: i64,
}

impl DatasetSchema {
    pub fn for_version(version: SchemaVersion) -> Self {
        let mut columns = BASE_COLUMNS.to_vec();
        if matches!(version, SchemaVersion::Toner | SchemaVersion::Viko) {
            columns.push(Column::new(ContractField::TonerCheck, ColumnKind::Flag));
        }
        if version == SchemaVersion::Viko {
            columns.push(Column::new(ContractField::VikoCheck, ColumnKind::Flag));
        }
        Self {
            version,
            columns,
            default_delay: DEFAULT_DELAY_THRESHOLD,
        }
    }

    pub fn with_default_delay(mut self, days: i64) -> Self {
        self.default_delay = days;
        self
    }

    pub fn supports(&self, flag: FlagField) -> bool {
        let wanted = flag.field();
        self.columns.iter().any(|column| column.field == wanted)
    }

    pub fn flags(&self) -> Vec<FlagField> {
        [FlagField::Toner, FlagField::Viko]
            .into_iter()
            .filter(|flag| self.supports(*flag))
            .collect()
    }

    /// Older exports carry no meaningful delay column to default on.
    pub fn default_filter(&self) -> FilterSelector {
        match self.version {
            SchemaVersion::Basic => FilterSelector::All,
            SchemaVersion::Toner | SchemaVersion::Viko => {
                FilterSelector::DelayAtLeast(self.default_delay)
            }
        }
    }
}
