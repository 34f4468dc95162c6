use super::{first_result, non_empty_array, number_field};
use crate::error::Result;
use crate::models::{STATUS_NOT_AVAILABLE, TimeSeries};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

/// Outcome of parsing a time series document
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedSeries {
    /// One series per period, keyed by the period's end
    Available(BTreeMap<DateTime<Utc>, TimeSeries>),
    /// The document had no periods; the series carries status 404 and the
    /// raw payload
    NotAvailable(TimeSeries),
}

impl ParsedSeries {
    fn not_available(missing: &str, doc: &Value) -> Self {
        Self::NotAvailable(TimeSeries::failed(
            STATUS_NOT_AVAILABLE,
            format!(
                "Data most likely not available yet (no {}): {}",
                missing, doc
            ),
        ))
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Number of dated entries
    pub fn len(&self) -> usize {
        match self {
            Self::Available(entries) => entries.len(),
            Self::NotAvailable(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most recent period, or the 404 series when nothing was available
    pub fn latest(self) -> TimeSeries {
        match self {
            Self::Available(mut entries) => match entries.pop_last() {
                Some((_, series)) => series,
                None => TimeSeries::failed(STATUS_NOT_AVAILABLE, "No periods in result."),
            },
            Self::NotAvailable(series) => series,
        }
    }
}

/// Parse a `MyEnergyData_MarketDocument` response.
///
/// Looks up `result[0].MyEnergyData_MarketDocument.TimeSeries[0].Period`. Each
/// period becomes one series of its `out_Quantity.quantity` values in point
/// order, dated by `timeInterval.end`.
pub fn parse_time_series(doc: &Value) -> Result<ParsedSeries> {
    let periods = match locate_periods(doc) {
        Ok(periods) => periods,
        Err(missing) => return Ok(ParsedSeries::not_available(missing, doc)),
    };

    let mut entries = BTreeMap::new();
    for period in periods {
        match parse_period(period)? {
            Ok((end, values)) => {
                entries.insert(end, TimeSeries::new(end, values));
            }
            Err(missing) => return Ok(ParsedSeries::not_available(missing, doc)),
        }
    }
    Ok(ParsedSeries::Available(entries))
}

/// Periods of the first time series, or the name of the first missing level
fn locate_periods(doc: &Value) -> std::result::Result<&[Value], &'static str> {
    let document = first_result(doc)
        .ok_or("result")?
        .get("MyEnergyData_MarketDocument")
        .ok_or("MyEnergyData_MarketDocument")?;
    let series = non_empty_array(document, "TimeSeries")
        .and_then(<[Value]>::first)
        .ok_or("TimeSeries")?;
    non_empty_array(series, "Period").ok_or("Period")
}

/// Inner `Err` names a missing branch; outer `Err` is a malformed value
type PeriodOutcome = std::result::Result<(DateTime<Utc>, Vec<f64>), &'static str>;

fn parse_period(period: &Value) -> Result<PeriodOutcome> {
    let Some(points) = period.get("Point").and_then(Value::as_array) else {
        return Ok(Err("Point"));
    };
    let Some(end) = period
        .get("timeInterval")
        .and_then(|t| t.get("end"))
        .and_then(Value::as_str)
    else {
        return Ok(Err("timeInterval.end"));
    };

    let mut values = Vec::with_capacity(points.len());
    for point in points {
        if point.get("out_Quantity.quantity").is_none() {
            return Ok(Err("out_Quantity.quantity"));
        }
        values.push(number_field(point, "out_Quantity.quantity")?);
    }

    let end = DateTime::parse_from_rfc3339(end)?.with_timezone(&Utc);
    Ok(Ok((end, values)))
}

/// Reduce month entries to one series of monthly totals.
///
/// Entries are taken in date order; value `n` is the sum of month `n`'s own
/// values and the result is dated by the last month.
pub fn aggregate_per_month(parsed: ParsedSeries) -> TimeSeries {
    match parsed {
        ParsedSeries::Available(entries) => {
            let Some(last) = entries.keys().next_back().copied() else {
                return TimeSeries::failed(STATUS_NOT_AVAILABLE, "No periods in result.");
            };
            let totals = entries
                .values()
                .map(TimeSeries::get_total_metering_data)
                .collect();
            TimeSeries::new(last, totals)
        }
        ParsedSeries::NotAvailable(series) => series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn period(end: &str, quantities: &[&str]) -> Value {
        let points: Vec<Value> = quantities
            .iter()
            .enumerate()
            .map(|(i, q)| {
                json!({
                    "position": (i + 1).to_string(),
                    "out_Quantity.quantity": q,
                    "out_Quantity.quality": "A04"
                })
            })
            .collect();
        json!({
            "resolution": "PT1H",
            "timeInterval": {"start": "2020-12-31T23:00:00Z", "end": end},
            "Point": points
        })
    }

    fn document(periods: Vec<Value>) -> Value {
        json!({
            "result": [{
                "MyEnergyData_MarketDocument": {
                    "mRID": "abc",
                    "TimeSeries": [{
                        "mRID": "571313000000000000",
                        "Period": periods
                    }]
                },
                "success": true,
                "errorCode": 10000
            }]
        })
    }

    #[test]
    fn single_period_keeps_point_order() {
        let doc = document(vec![period("2021-01-01T23:00:00Z", &["0.5", "0.25", "1.0"])]);
        let ParsedSeries::Available(entries) = parse_time_series(&doc).unwrap() else {
            panic!("expected data");
        };
        assert_eq!(entries.len(), 1);

        let end = Utc.with_ymd_and_hms(2021, 1, 1, 23, 0, 0).unwrap();
        let series = &entries[&end];
        assert_eq!(series.status(), 200);
        assert_eq!(series.data_date(), Some(end));
        assert_eq!(series.metering_data(), &[0.5, 0.25, 1.0]);
    }

    #[test]
    fn numeric_quantities_are_accepted() {
        let doc = document(vec![json!({
            "timeInterval": {"end": "2021-01-01T23:00:00Z"},
            "Point": [{"out_Quantity.quantity": 1.5}, {"out_Quantity.quantity": 2}]
        })]);
        let series = parse_time_series(&doc).unwrap().latest();
        assert_eq!(series.metering_data(), &[1.5, 2.0]);
    }

    #[test]
    fn missing_levels_are_not_available() {
        let cases = vec![
            json!({}),
            json!({"result": []}),
            json!({"result": [{}]}),
            json!({"result": [{"MyEnergyData_MarketDocument": {}}]}),
            json!({"result": [{"MyEnergyData_MarketDocument": {"TimeSeries": []}}]}),
            json!({"result": [{"MyEnergyData_MarketDocument": {"TimeSeries": [{}]}}]}),
            document(vec![]),
            document(vec![json!({"timeInterval": {"end": "2021-01-01T23:00:00Z"}})]),
            document(vec![json!({"Point": []})]),
            document(vec![json!({
                "timeInterval": {"end": "2021-01-01T23:00:00Z"},
                "Point": [{"position": "1"}]
            })]),
        ];
        for doc in cases {
            let parsed = parse_time_series(&doc).unwrap();
            let ParsedSeries::NotAvailable(series) = parsed else {
                panic!("expected not available for {}", doc);
            };
            assert_eq!(series.status(), 404);
            assert!(series.metering_data().is_empty());
            assert!(
                series
                    .detailed_status()
                    .unwrap()
                    .starts_with("Data most likely not available yet")
            );
        }
    }

    #[test]
    fn not_available_embeds_payload() {
        let doc = json!({"result": [{"MyEnergyData_MarketDocument": {"TimeSeries": []}}]});
        let series = parse_time_series(&doc).unwrap().latest();
        let detail = series.detailed_status().unwrap();
        assert!(detail.contains("(no TimeSeries)"));
        assert!(detail.contains("MyEnergyData_MarketDocument"));
    }

    #[test]
    fn malformed_values_are_errors() {
        let doc = document(vec![period("2021-01-01T23:00:00Z", &["n/a"])]);
        assert!(parse_time_series(&doc).is_err());

        let doc = document(vec![period("yesterday", &["1.0"])]);
        assert!(parse_time_series(&doc).is_err());
    }

    #[test]
    fn latest_picks_most_recent_period() {
        let doc = document(vec![
            period("2021-01-03T23:00:00Z", &["3.0"]),
            period("2021-01-01T23:00:00Z", &["1.0"]),
            period("2021-01-02T23:00:00Z", &["2.0"]),
        ]);
        let parsed = parse_time_series(&doc).unwrap();
        assert_eq!(parsed.len(), 3);
        let latest = parsed.latest();
        assert_eq!(
            latest.data_date(),
            Some(Utc.with_ymd_and_hms(2021, 1, 3, 23, 0, 0).unwrap())
        );
        assert_eq!(latest.metering_data(), &[3.0]);
    }

    #[test]
    fn per_month_is_sum_of_sums() {
        let doc = document(vec![
            period("2021-02-28T23:00:00Z", &["15.0", "5.0"]),
            period("2021-01-31T23:00:00Z", &["4.0", "6.0"]),
            period("2021-03-31T22:00:00Z", &["30.0"]),
        ]);
        let months = aggregate_per_month(parse_time_series(&doc).unwrap());
        assert_eq!(months.status(), 200);
        assert_eq!(months.metering_data(), &[10.0, 20.0, 30.0]);
        assert_eq!(months.get_total_metering_data(), 60.0);
        assert_eq!(
            months.data_date(),
            Some(Utc.with_ymd_and_hms(2021, 3, 31, 22, 0, 0).unwrap())
        );
    }

    #[test]
    fn per_month_passes_through_not_available() {
        let months = aggregate_per_month(parse_time_series(&json!({"result": []})).unwrap());
        assert_eq!(months.status(), 404);
    }

    #[test]
    fn empty_available_is_not_available() {
        let parsed = ParsedSeries::Available(BTreeMap::new());
        assert!(parsed.is_empty());
        assert_eq!(parsed.latest().status(), 404);
        assert_eq!(
            aggregate_per_month(ParsedSeries::Available(BTreeMap::new())).status(),
            404
        );
    }
}
