//! Result types returned by the client
//!
//! Every result carries an HTTP-like `status` so callers can branch on it
//! uniformly: 200 for data, the upstream status for API failures and 404 when
//! the data has not been published yet.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Status used for successfully parsed results
pub const STATUS_OK: u16 = 200;
/// Status used when the API answered but carried no data yet
pub const STATUS_NOT_AVAILABLE: u16 = 404;
/// Status used when a charges document has no tariff section
pub const STATUS_NO_TARIFFS: u16 = 400;

/// Unparsed HTTP result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new<S: Into<String>>(status: u16, body: S) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Granularity of the buckets in a time series request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Aggregation {
    #[default]
    Hour,
    Day,
    Month,
    Year,
}

impl Aggregation {
    /// Path segment used by the time series endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "Hour",
            Self::Day => "Day",
            Self::Month => "Month",
            Self::Year => "Year",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One period (day, month, ...) of metering values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    status: u16,
    data_date: Option<DateTime<Utc>>,
    metering_data: Vec<f64>,
    detailed_status: Option<String>,
}

impl TimeSeries {
    /// Successfully parsed series ending at `data_date`
    pub fn new(data_date: DateTime<Utc>, metering_data: Vec<f64>) -> Self {
        Self {
            status: STATUS_OK,
            data_date: Some(data_date),
            metering_data,
            detailed_status: None,
        }
    }

    /// Failed series; never carries metering data
    pub fn failed<S: Into<String>>(status: u16, detailed_status: S) -> Self {
        Self {
            status,
            data_date: None,
            metering_data: Vec::new(),
            detailed_status: Some(detailed_status.into()),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// End of the period the values belong to
    pub fn data_date(&self) -> Option<DateTime<Utc>> {
        self.data_date
    }

    pub fn detailed_status(&self) -> Option<&str> {
        self.detailed_status.as_deref()
    }

    /// All values in period order
    pub fn metering_data(&self) -> &[f64] {
        &self.metering_data
    }

    /// Value for a single sub-period, 1-indexed.
    ///
    /// `index = 1` is 00:00-01:00 for day data or January for month data;
    /// `index = 4` is 03:00-04:00 or April. Returns `None` outside the series.
    pub fn get_metering_data(&self, index: usize) -> Option<f64> {
        index
            .checked_sub(1)
            .and_then(|i| self.metering_data.get(i))
            .copied()
    }

    /// Sum of all values; 0 for an empty series
    pub fn get_total_metering_data(&self) -> f64 {
        self.metering_data.iter().sum()
    }
}

/// A tariff price: one value for the whole day or one value per hour
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Rate {
    Daily(f64),
    Hourly(Vec<f64>),
}

impl Rate {
    pub fn as_daily(&self) -> Option<f64> {
        match self {
            Self::Daily(price) => Some(*price),
            Self::Hourly(_) => None,
        }
    }

    pub fn as_hourly(&self) -> Option<&[f64]> {
        match self {
            Self::Daily(_) => None,
            Self::Hourly(prices) => Some(prices),
        }
    }

    /// Price in effect during `hour` (0-23)
    pub fn price_at_hour(&self, hour: usize) -> Option<f64> {
        match self {
            Self::Daily(price) if hour < 24 => Some(*price),
            Self::Daily(_) => None,
            Self::Hourly(prices) => prices.get(hour).copied(),
        }
    }
}

/// Tariffs of a metering point, keyed by normalized tariff name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Charges {
    status: u16,
    charges: Option<BTreeMap<String, Rate>>,
    detailed_status: Option<String>,
}

impl Charges {
    pub fn new(charges: BTreeMap<String, Rate>) -> Self {
        Self {
            status: STATUS_OK,
            charges: Some(charges),
            detailed_status: None,
        }
    }

    pub fn failed<S: Into<String>>(status: u16, detailed_status: S) -> Self {
        Self {
            status,
            charges: None,
            detailed_status: Some(detailed_status.into()),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    pub fn charges(&self) -> Option<&BTreeMap<String, Rate>> {
        self.charges.as_ref()
    }

    /// Look up a rate by its normalized name, e.g. `net_tarif`
    pub fn get(&self, name: &str) -> Option<&Rate> {
        self.charges.as_ref().and_then(|c| c.get(name))
    }

    pub fn detailed_status(&self) -> Option<&str> {
        self.detailed_status.as_deref()
    }
}

/// A single register reading of a meter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeterReading {
    status: u16,
    reading: Option<String>,
    reading_date: Option<String>,
    measurement_unit: Option<String>,
    detailed_status: Option<String>,
}

impl MeterReading {
    pub fn new(reading: String, reading_date: String, measurement_unit: Option<String>) -> Self {
        Self {
            status: STATUS_OK,
            reading: Some(reading),
            reading_date: Some(reading_date),
            measurement_unit,
            detailed_status: None,
        }
    }

    pub fn failed<S: Into<String>>(status: u16, detailed_status: S) -> Self {
        Self {
            status,
            reading: None,
            reading_date: None,
            measurement_unit: None,
            detailed_status: Some(detailed_status.into()),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Register value as reported, e.g. `"12345.678"`
    pub fn reading(&self) -> Option<&str> {
        self.reading.as_deref()
    }

    pub fn reading_date(&self) -> Option<&str> {
        self.reading_date.as_deref()
    }

    pub fn measurement_unit(&self) -> Option<&str> {
        self.measurement_unit.as_deref()
    }

    pub fn detailed_status(&self) -> Option<&str> {
        self.detailed_status.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap()
    }

    #[test]
    fn metering_data_is_one_indexed() {
        let series = TimeSeries::new(day(), vec![0.5, 1.25, 2.0]);
        assert_eq!(series.get_metering_data(1), Some(0.5));
        assert_eq!(series.get_metering_data(3), Some(2.0));
        assert_eq!(series.get_metering_data(0), None);
        assert_eq!(series.get_metering_data(4), None);
    }

    #[test]
    fn total_of_series() {
        let series = TimeSeries::new(day(), vec![0.5, 1.25, 2.0]);
        assert!((series.get_total_metering_data() - 3.75).abs() < 1e-9);
        assert_eq!(TimeSeries::new(day(), Vec::new()).get_total_metering_data(), 0.0);
    }

    #[test]
    fn failed_series_has_no_data() {
        let series = TimeSeries::failed(503, "Service Unavailable");
        assert!(!series.is_ok());
        assert!(series.metering_data().is_empty());
        assert!(series.data_date().is_none());
        assert_eq!(series.detailed_status(), Some("Service Unavailable"));
        assert_eq!(series.get_total_metering_data(), 0.0);
    }

    #[test]
    fn rate_price_at_hour() {
        let daily = Rate::Daily(0.12);
        assert_eq!(daily.price_at_hour(0), Some(0.12));
        assert_eq!(daily.price_at_hour(23), Some(0.12));
        assert_eq!(daily.price_at_hour(24), None);

        let hourly = Rate::Hourly((0..24).map(f64::from).collect());
        assert_eq!(hourly.price_at_hour(17), Some(17.0));
        assert_eq!(hourly.as_daily(), None);
    }

    #[test]
    fn rate_serializes_untagged() {
        let json = serde_json::to_string(&Rate::Daily(1.5)).unwrap();
        assert_eq!(json, "1.5");
        let json = serde_json::to_string(&Rate::Hourly(vec![1.0, 2.0])).unwrap();
        assert_eq!(json, "[1.0,2.0]");
    }

    #[test]
    fn aggregation_path_segment() {
        assert_eq!(Aggregation::default().as_str(), "Hour");
        assert_eq!(Aggregation::Month.to_string(), "Month");
    }
}
