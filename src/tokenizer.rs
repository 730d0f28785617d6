//! Line-level CSV splitting for the contract exports.
//!
//! The exports wrap fields containing commas in double quotes but never escape
//! a quote inside a quoted field, so a quote always toggles quoted mode and is
//! dropped from the output.

const SEPARATOR: char = ',';
const QUOTE: char = '"';

/// Splits a single line into trimmed fields.
///
/// An unmatched quote keeps the rest of the line in the current field; the
/// line end always terminates it. An empty line yields one empty field.
pub fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut inside_quotes = false;

    for ch in line.chars() {
        match ch {
            SEPARATOR if !inside_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            QUOTE => inside_quotes = !inside_quotes,
            _ => current.push(ch),
        }
    }

    fields.push(current.trim().to_string());
    fields
}
