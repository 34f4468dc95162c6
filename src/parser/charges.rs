use super::{first_result, integer_field, number_field, str_field};
use crate::error::{EloverblikError, Result};
use crate::models::{Charges, Rate, STATUS_NO_TARIFFS};
use serde_json::Value;
use std::collections::BTreeMap;

/// Map key for a tariff: lowercase with spaces replaced by underscores
pub fn normalize_tariff_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Parse a getcharges response into tariff rates.
///
/// Only `result[0].result.tariffs` is read; subscriptions and fees are
/// ignored. A `P1D` tariff becomes a daily rate, a `PT1H` tariff an hourly
/// list ordered by `position`. Any other period type is an `Unsupported`
/// error and never skipped.
pub fn parse_charges(doc: &Value) -> Result<Charges> {
    let Some(tariffs) = first_result(doc)
        .and_then(|r| r.get("result"))
        .and_then(|r| r.get("tariffs"))
        .and_then(Value::as_array)
    else {
        return Ok(Charges::failed(
            STATUS_NO_TARIFFS,
            "Result does not contain any tariffs.",
        ));
    };

    let mut charges = BTreeMap::new();
    for tariff in tariffs {
        let name = normalize_tariff_name(str_field(tariff, "name")?);
        let rate = parse_rate(tariff)?;
        charges.insert(name, rate);
    }
    Ok(Charges::new(charges))
}

fn parse_rate(tariff: &Value) -> Result<Rate> {
    let period_type = str_field(tariff, "periodType")?;
    let prices = tariff
        .get("prices")
        .and_then(Value::as_array)
        .ok_or_else(|| EloverblikError::api("tariff without 'prices'"))?;

    match period_type {
        "P1D" => {
            let first = prices
                .first()
                .ok_or_else(|| EloverblikError::api("P1D tariff without prices"))?;
            Ok(Rate::Daily(number_field(first, "price")?))
        }
        "PT1H" => {
            let mut positioned = prices
                .iter()
                .map(|p| Ok((integer_field(p, "position")?, number_field(p, "price")?)))
                .collect::<Result<Vec<(i64, f64)>>>()?;
            positioned.sort_by_key(|(position, _)| *position);
            Ok(Rate::Hourly(
                positioned.into_iter().map(|(_, price)| price).collect(),
            ))
        }
        other => Err(EloverblikError::unsupported(format!(
            "Unsupported periodType for tariff '{}'",
            other
        ))),
    }
}
