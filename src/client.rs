//! Query façade over the eloverblik.dk customer API
//!
//! [`EloverblikClient`] owns the transport, the clock and the access token
//! cache. Calls are sequential; every method takes `&mut self` because any of
//! them may renew the token.

use crate::clock::{Clock, SystemClock};
use crate::config::ApiConfig;
use crate::error::{EloverblikError, Result};
use crate::logging::{LogContext, get_logger, get_logger_with_context};
use crate::models::{Aggregation, Charges, MeterReading, RawResponse, TimeSeries};
use crate::parser::{
    ParsedSeries, aggregate_per_month, parse_charges, parse_json, parse_meter_readings,
    parse_time_series,
};
use crate::token::TokenCache;
use crate::transport::{HttpRequest, ReqwestTransport, Transport};
use chrono::{Datelike, Days, NaiveDate};
use std::sync::Arc;

const DATE_FORMAT: &str = "%Y-%m-%d";
/// Window searched by [`EloverblikClient::get_latest`]
const LATEST_WINDOW_DAYS: u64 = 8;
/// Window searched by [`EloverblikClient::get_meter_reading_latest`]
const METER_READING_WINDOW_DAYS: u64 = 90;

/// Client for one refresh token
pub struct EloverblikClient {
    refresh_token: String,
    base_url: String,
    transport: Box<dyn Transport>,
    clock: Arc<dyn Clock>,
    tokens: TokenCache,
    logger: crate::logging::StructuredLogger,
}

impl EloverblikClient {
    /// Client against the public API with default transport settings
    pub fn new<S: Into<String>>(refresh_token: S) -> Result<Self> {
        let cfg = ApiConfig {
            refresh_token: refresh_token.into(),
            ..ApiConfig::default()
        };
        Self::from_config(&cfg)
    }

    /// Client using the reqwest transport and the wall clock
    pub fn from_config(cfg: &ApiConfig) -> Result<Self> {
        if cfg.refresh_token.trim().is_empty() {
            return Err(EloverblikError::config("No refresh token configured"));
        }
        let transport = ReqwestTransport::new(cfg)?;
        Ok(Self::with_parts(
            cfg.refresh_token.clone(),
            cfg.base_url.clone(),
            Box::new(transport),
            Arc::new(SystemClock),
        ))
    }

    /// Client with an explicit transport and clock
    pub fn with_parts<S: Into<String>, U: Into<String>>(
        refresh_token: S,
        base_url: U,
        transport: Box<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            refresh_token: refresh_token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            clock,
            tokens: TokenCache::default(),
            logger: get_logger("client"),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Current access token, renewed when older than 12 hours
    pub async fn get_access_token(&mut self) -> Result<String> {
        let token_url = self.url("api/Token");
        self.tokens
            .get_access_token(
                self.transport.as_ref(),
                self.clock.as_ref(),
                &token_url,
                &self.refresh_token,
            )
            .await
    }

    async fn post_for_metering_point(
        &mut self,
        path: &str,
        metering_point: &str,
    ) -> Result<RawResponse> {
        let access_token = self.get_access_token().await?;
        let request = HttpRequest::post(self.url(path), metering_point_body(metering_point))
            .with_bearer(access_token);

        let logger = get_logger_with_context(
            LogContext::new("client")
                .with_metering_point(metering_point)
                .with_field("endpoint", path.to_string()),
        );
        let resp = self.transport.send(request).await?;
        logger.debug(&format!("Response from API. Status: {}", resp.status));
        logger.trace(&format!("Response body: {}", resp.body));
        Ok(resp)
    }

    /// Raw time series for `metering_point`.
    ///
    /// `from` defaults to yesterday, `to` to today and `aggregation` to
    /// [`Aggregation::Hour`]; the defaults are taken from the clock on every
    /// call. Non-2xx answers are returned, not raised.
    pub async fn get_time_series(
        &mut self,
        metering_point: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        aggregation: Option<Aggregation>,
    ) -> Result<RawResponse> {
        let today = self.clock.today();
        let from = from.unwrap_or_else(|| today - Days::new(1));
        let to = to.unwrap_or(today);
        let aggregation = aggregation.unwrap_or_default();

        let path = format!(
            "api/MeterData/GetTimeSeries/{}/{}/{}",
            from.format(DATE_FORMAT),
            to.format(DATE_FORMAT),
            aggregation
        );
        self.post_for_metering_point(&path, metering_point).await
    }

    /// Hourly data for yesterday
    pub async fn get_yesterday_parsed(&mut self, metering_point: &str) -> Result<TimeSeries> {
        let raw = self
            .get_time_series(metering_point, None, None, None)
            .await?;
        Ok(series_from_raw(&raw)?.map_or_else(|failed| failed, ParsedSeries::latest))
    }

    /// Most recent day with data within the last week
    pub async fn get_latest(&mut self, metering_point: &str) -> Result<TimeSeries> {
        let today = self.clock.today();
        let raw = self
            .get_time_series(
                metering_point,
                Some(today - Days::new(LATEST_WINDOW_DAYS)),
                Some(today),
                None,
            )
            .await?;
        Ok(series_from_raw(&raw)?.map_or_else(|failed| failed, ParsedSeries::latest))
    }

    /// Consumption per month of `year` (default: current year).
    ///
    /// Value `n` of the result is the total for month `n`. Years after the
    /// current one are rejected.
    pub async fn get_per_month(
        &mut self,
        metering_point: &str,
        year: Option<i32>,
    ) -> Result<TimeSeries> {
        let today = self.clock.today();
        let year = year.unwrap_or_else(|| today.year());
        if !(1000..=9999).contains(&year) {
            return Err(EloverblikError::validation(
                "year".to_string(),
                format!("{} is not a four digit year", year),
            ));
        }

        if year > today.year() {
            return Err(EloverblikError::validation(
                "year".to_string(),
                format!("{} is in the future", year),
            ));
        }

        let (from, to) = year_window(year, today)?;
        let raw = self
            .get_time_series(metering_point, Some(from), Some(to), Some(Aggregation::Month))
            .await?;
        Ok(series_from_raw(&raw)?.map_or_else(|failed| failed, aggregate_per_month))
    }

    /// Tariffs of the metering point; subscriptions and fees are not included
    pub async fn get_tariffs(&mut self, metering_point: &str) -> Result<Charges> {
        let raw = self
            .post_for_metering_point("api/meteringpoints/meteringpoint/getcharges", metering_point)
            .await?;
        if raw.status != 200 {
            self.logger
                .warn(&format!("Charges request returned status {}", raw.status));
            return Ok(Charges::failed(raw.status, raw.body));
        }
        parse_charges(&parse_json(&raw.body)?)
    }

    /// Newest meter reading within the last 90 days
    pub async fn get_meter_reading_latest(&mut self, metering_point: &str) -> Result<MeterReading> {
        let today = self.clock.today();
        let path = format!(
            "api/meterdata/getmeterreadings/{}/{}",
            (today - Days::new(METER_READING_WINDOW_DAYS)).format(DATE_FORMAT),
            today.format(DATE_FORMAT)
        );
        let raw = self.post_for_metering_point(&path, metering_point).await?;
        if raw.status != 200 {
            self.logger
                .warn(&format!("Meter reading request returned status {}", raw.status));
            return Ok(MeterReading::failed(raw.status, raw.body));
        }
        parse_meter_readings(&parse_json(&raw.body)?)
    }
}

/// Request body naming exactly one metering point
fn metering_point_body(metering_point: &str) -> String {
    serde_json::json!({"meteringPoints": {"meteringPoint": [metering_point]}}).to_string()
}

/// Jan 1 to Dec 31 for past years; Jan 1 to today for the current year
fn year_window(year: i32, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || EloverblikError::validation("year".to_string(), format!("{}", year));
    let from = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
    let to = if year < today.year() {
        NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?
    } else {
        today
    };
    Ok((from, to))
}

/// Parsed entries for a 200 answer; a failed series for anything else
fn series_from_raw(raw: &RawResponse) -> Result<std::result::Result<ParsedSeries, TimeSeries>> {
    if raw.status != 200 {
        return Ok(Err(TimeSeries::failed(raw.status, raw.body.clone())));
    }
    Ok(Ok(parse_time_series(&parse_json(&raw.body)?)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_names_one_metering_point() {
        let body: serde_json::Value =
            serde_json::from_str(&metering_point_body("571313000000000000")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"meteringPoints": {"meteringPoint": ["571313000000000000"]}})
        );
    }

    #[test]
    fn year_window_past_and_current() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(
            year_window(2023, today).unwrap(),
            (
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
            )
        );
        assert_eq!(
            year_window(2024, today).unwrap(),
            (NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), today)
        );
    }

    #[test]
    fn non_200_becomes_failed_series() {
        let raw = RawResponse::new(503, "Service Unavailable");
        let failed = series_from_raw(&raw).unwrap().unwrap_err();
        assert_eq!(failed.status(), 503);
        assert_eq!(failed.detailed_status(), Some("Service Unavailable"));
    }

    #[test]
    fn non_json_200_is_error() {
        let raw = RawResponse::new(200, "<html></html>");
        assert!(series_from_raw(&raw).is_err());
    }
}
