//! Parsing of customer API documents into typed results
//!
//! The API omits whole branches of its documents when data is not published
//! yet. Navigation is therefore a chain of `Option` lookups that ends in a
//! "not available" result instead of an error. Only values that are present
//! but malformed are reported as errors.

mod charges;
mod readings;
mod series;

pub use charges::{normalize_tariff_name, parse_charges};
pub use readings::parse_meter_readings;
pub use series::{ParsedSeries, aggregate_per_month, parse_time_series};

use crate::error::{EloverblikError, Result};
use serde_json::Value;

/// Parse a response body as JSON
pub fn parse_json(body: &str) -> Result<Value> {
    Ok(serde_json::from_str(body)?)
}

/// `result[0]` of an API envelope
fn first_result(doc: &Value) -> Option<&Value> {
    doc.get("result")?.as_array()?.first()
}

/// `value[key]` as a non-empty array
fn non_empty_array<'a>(value: &'a Value, key: &str) -> Option<&'a [Value]> {
    value
        .get(key)?
        .as_array()
        .map(Vec::as_slice)
        .filter(|a| !a.is_empty())
}

/// Numeric field that the API sends either as a JSON number or as a string
fn number_field(value: &Value, field: &str) -> Result<f64> {
    match value.get(field) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| EloverblikError::validation(field, "number out of range")),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            EloverblikError::validation(field.to_string(), format!("not a number: {:?}", s))
        }),
        Some(other) => Err(EloverblikError::validation(
            field.to_string(),
            format!("unexpected value {}", other),
        )),
        None => Err(EloverblikError::api(format!("missing field '{}'", field))),
    }
}

/// Integer field sent as a number or a string
fn integer_field(value: &Value, field: &str) -> Result<i64> {
    match value.get(field) {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| EloverblikError::validation(field, "not an integer")),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| {
            EloverblikError::validation(field.to_string(), format!("not an integer: {:?}", s))
        }),
        Some(other) => Err(EloverblikError::validation(
            field.to_string(),
            format!("unexpected value {}", other),
        )),
        None => Err(EloverblikError::api(format!("missing field '{}'", field))),
    }
}

/// String field, required
fn str_field<'a>(value: &'a Value, field: &str) -> Result<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| EloverblikError::api(format!("missing field '{}'", field)))
}
