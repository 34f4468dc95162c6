use super::{first_result, str_field};
use crate::error::{EloverblikError, Result};
use crate::models::{MeterReading, STATUS_NOT_AVAILABLE};
use serde_json::Value;

/// Parse a getmeterreadings response and keep the newest reading.
///
/// Readings are compared on their `readingDate` string, which the API sends
/// as an ISO 8601 timestamp.
pub fn parse_meter_readings(doc: &Value) -> Result<MeterReading> {
    let Some(readings) = first_result(doc)
        .and_then(|r| r.get("result"))
        .and_then(|r| r.get("readings"))
        .and_then(Value::as_array)
    else {
        return Ok(MeterReading::failed(
            STATUS_NOT_AVAILABLE,
            "Result does not contain any readings.",
        ));
    };

    let mut newest: Option<(&str, &Value)> = None;
    for reading in readings {
        let date = str_field(reading, "readingDate")?;
        if newest.is_none_or(|(best, _)| date >= best) {
            newest = Some((date, reading));
        }
    }

    let Some((date, reading)) = newest else {
        return Ok(MeterReading::failed(
            STATUS_NOT_AVAILABLE,
            "No readings found in result.",
        ));
    };

    let value = match reading.get("meterReading") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(EloverblikError::api("reading without 'meterReading'")),
    };
    let unit = reading
        .get("measurementUnit")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(MeterReading::new(value, date.to_string(), unit))
}
