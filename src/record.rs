use tracing::debug;

use crate::schema::{ColumnKind, ContractField, DatasetSchema, FlagField};
use crate::tokenizer::split_row;

#[derive(Debug, Clone, PartialEq)]
pub struct ContractRecord {
    pub contract_no: String,
    pub company_name: String,
    pub address: String,
    pub rental_machine: String,
    /// Raw text; interpreted only when a delay filter runs.
    pub delay_days: String,
    pub latitude: f64,
    pub longitude: f64,
    pub toner_check: Option<i64>,
    pub viko_check: Option<i64>,
}

impl ContractRecord {
    fn blank() -> Self {
        Self {
            contract_no: String::new(),
            company_name: String::new(),
            address: String::new(),
            rental_machine: String::new(),
            delay_days: String::new(),
            latitude: f64::NAN,
            longitude: f64::NAN,
            toner_check: None,
            viko_check: None,
        }
    }

    pub fn delay_days_value(&self) -> Option<i64> {
        parse_leading_int(&self.delay_days)
    }

    pub fn flag(&self, flag: FlagField) -> Option<i64> {
        match flag {
            FlagField::Toner => self.toner_check,
            FlagField::Viko => self.viko_check,
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Decodes one tokenized row according to `schema`. Never fails: absent or
/// malformed cells become empty text, `NaN` or `None`.
pub fn decode_record(fields: &[String], schema: &DatasetSchema) -> ContractRecord {
    let mut record = ContractRecord::blank();
    for (index, column) in schema.columns.iter().enumerate() {
        let raw = fields.get(index).map(String::as_str);
        match column.kind {
            ColumnKind::Text => {
                let value = raw.unwrap_or_default().to_string();
                match column.field {
                    ContractField::ContractNo => record.contract_no = value,
                    ContractField::CompanyName => record.company_name = value,
                    ContractField::Address => record.address = value,
                    ContractField::RentalMachine => record.rental_machine = value,
                    ContractField::DelayDays => record.delay_days = value,
                    _ => {}
                }
            }
            ColumnKind::Float => {
                let value = raw.map(parse_leading_float).unwrap_or(f64::NAN);
                match column.field {
                    ContractField::Latitude => record.latitude = value,
                    ContractField::Longitude => record.longitude = value,
                    _ => {}
                }
            }
            ColumnKind::Flag => {
                let value = raw.and_then(parse_leading_int);
                match column.field {
                    ContractField::TonerCheck => record.toner_check = value,
                    ContractField::VikoCheck => record.viko_check = value,
                    _ => {}
                }
            }
        }
    }
    record
}

/// Parses a whole export: the first line is the header and is skipped, every
/// other line (a trailing blank one included) becomes a record in file order.
pub fn parse_contracts(text: &str, schema: &DatasetSchema) -> Vec<ContractRecord> {
    let records: Vec<ContractRecord> = text
        .split('\n')
        .skip(1)
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .map(|line| decode_record(&split_row(line), schema))
        .collect();
    debug!(
        target: "decoder",
        schema = schema.version.as_str(),
        rows = records.len(),
        "decoded contract export"
    );
    records
}

/// Longest numeric prefix after leading whitespace, `NaN` when there is none.
pub(crate) fn parse_leading_float(value: &str) -> f64 {
    let trimmed = value.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if trimmed[end..].starts_with("Infinity") {
        return if bytes.first() == Some(&b'-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return f64::NAN;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    trimmed[..end].parse().unwrap_or(f64::NAN)
}

/// Integer prefix after leading whitespace (`"120일"` is 120). Prefixes too
/// large for `i64` saturate.
pub(crate) fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    let saturated = if bytes.first() == Some(&b'-') {
        i64::MIN
    } else {
        i64::MAX
    };
    Some(trimmed[..end].parse().unwrap_or(saturated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaVersion;

    const VIKO_EXPORT: &str = "no,company,address,machine,delay,lat,lon,toner,viko\n\
        C-100,\"Alpha, Inc.\",Seoul,MX-1,120,37.5665,126.978,1,0\n\
        C-101,Bravo,Busan,MX-2,abc,35.1796,129.0756,0,1\n";

    #[test]
    fn decodes_rows_in_file_order() {
        let schema = DatasetSchema::for_version(SchemaVersion::Viko);
        let records = parse_contracts(VIKO_EXPORT, &schema);
        // trailing newline leaves one blank row behind
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].contract_no, "C-100");
        assert_eq!(records[0].company_name, "Alpha, Inc.");
        assert_eq!(records[0].latitude, 37.5665);
        assert_eq!(records[0].toner_check, Some(1));
        assert_eq!(records[0].viko_check, Some(0));
        assert_eq!(records[1].contract_no, "C-101");
        assert_eq!(records[1].delay_days, "abc");
        assert_eq!(records[1].delay_days_value(), None);
    }

    #[test]
    fn blank_row_decodes_without_panicking() {
        let schema = DatasetSchema::for_version(SchemaVersion::Viko);
        let records = parse_contracts(VIKO_EXPORT, &schema);
        let blank = &records[2];
        assert_eq!(blank.contract_no, "");
        assert!(blank.latitude.is_nan());
        assert!(blank.longitude.is_nan());
        assert_eq!(blank.toner_check, None);
        assert!(!blank.has_coordinates());
    }

    #[test]
    fn ignores_columns_the_schema_does_not_declare() {
        let schema = DatasetSchema::for_version(SchemaVersion::Basic);
        let fields: Vec<String> = "C-1,Co,Addr,M,5,1.5,2.5,1,1"
            .split(',')
            .map(String::from)
            .collect();
        let record = decode_record(&fields, &schema);
        assert_eq!(record.toner_check, None);
        assert_eq!(record.viko_check, None);
        assert_eq!(record.longitude, 2.5);
    }

    #[test]
    fn strips_carriage_returns() {
        let schema = DatasetSchema::for_version(SchemaVersion::Toner);
        let records = parse_contracts("header\r\nC-1,Co,Addr,M,5,1,2,1\r\n", &schema);
        assert_eq!(records[0].toner_check, Some(1));
    }

    #[test]
    fn numeric_prefixes_are_lenient() {
        assert_eq!(parse_leading_float("37.5abc"), 37.5);
        assert_eq!(parse_leading_float(" -12"), -12.0);
        assert_eq!(parse_leading_float(".5"), 0.5);
        assert_eq!(parse_leading_float("1e3x"), 1000.0);
        assert!(parse_leading_float("").is_nan());
        assert!(parse_leading_float("lat").is_nan());
        assert_eq!(parse_leading_int("120일"), Some(120));
        assert_eq!(parse_leading_int("12.9"), Some(12));
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_float("Infinity"), f64::INFINITY);
        assert_eq!(parse_leading_float("-Infinity km"), f64::NEG_INFINITY);
        assert!(parse_leading_float("Inf").is_nan());
    }

    #[test]
    fn oversized_delays_saturate() {
        assert_eq!(parse_leading_int("99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_leading_int("-99999999999999999999"), Some(i64::MIN));

        let schema = DatasetSchema::for_version(SchemaVersion::Basic);
        let records = parse_contracts("h
C-1,Co,Addr,M,99999999999999999999,1,2", &schema);
        let visible = crate::filter::apply_filter(
            &records,
            crate::filter::FilterSelector::DelayAtLeast(90),
            &crate::selection::SelectionSet::default(),
        );
        assert_eq!(visible.len(), 1);
    }
}
