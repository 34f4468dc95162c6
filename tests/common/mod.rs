#![allow(dead_code)]

use chrono::{DateTime, Local, TimeZone};
use eloverblik::clock::ManualClock;
use eloverblik::error::{EloverblikError, Result};
use eloverblik::transport::{HttpRequest, Transport};
use eloverblik::{EloverblikClient, RawResponse};
use std::sync::{Arc, Mutex};

pub const BASE_URL: &str = "https://api.test/CustomerApi/";
pub const METERING_POINT: &str = "571313000000000000";
pub const TOKEN_BODY: &str = r#"{"result": "short-lived-token"}"#;

/// Transport answering from a fixed route table and recording every request
#[derive(Clone, Default)]
pub struct MockTransport {
    routes: Arc<Mutex<Vec<(String, RawResponse)>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    /// Answer requests whose URL contains `pattern`; later routes win
    pub fn route(&self, pattern: &str, status: u16, body: &str) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .push((pattern.to_string(), RawResponse::new(status, body)));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.urls().iter().filter(|u| u.contains(pattern)).count()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.routes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(pattern, _)| request.url.contains(pattern.as_str()))
            .map(|(_, resp)| resp.clone())
            .ok_or_else(|| EloverblikError::network(format!("no route for {}", request.url)))
    }
}

pub fn noon(year: i32, month: u32, day: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

/// Client on a mock transport with a valid token route, clock at 2024-06-15 12:00
pub fn client() -> (EloverblikClient, MockTransport, Arc<ManualClock>) {
    let transport = MockTransport::default();
    transport.route("api/Token", 200, TOKEN_BODY);
    let clock = Arc::new(ManualClock::new(noon(2024, 6, 15)));
    let client = EloverblikClient::with_parts(
        "refresh-token",
        BASE_URL,
        Box::new(transport.clone()),
        clock.clone(),
    );
    (client, transport, clock)
}

/// A time series document with one period per `(end, quantities)` pair
pub fn time_series_body(periods: &[(&str, Vec<f64>)]) -> String {
    let periods: Vec<serde_json::Value> = periods
        .iter()
        .map(|(end, quantities)| {
            let points: Vec<serde_json::Value> = quantities
                .iter()
                .enumerate()
                .map(|(i, q)| {
                    serde_json::json!({
                        "position": (i + 1).to_string(),
                        "out_Quantity.quantity": format!("{:.3}", q),
                        "out_Quantity.quality": "A04"
                    })
                })
                .collect();
            serde_json::json!({
                "resolution": "PT1H",
                "timeInterval": {"start": "2024-01-01T00:00:00Z", "end": end},
                "Point": points
            })
        })
        .collect();
    serde_json::json!({
        "result": [{
            "MyEnergyData_MarketDocument": {
                "mRID": "a7f7e2d4",
                "createdDateTime": "2024-06-15T10:00:00Z",
                "TimeSeries": [{
                    "mRID": METERING_POINT,
                    "businessType": "A04",
                    "measurement_Unit.name": "KWH",
                    "Period": periods
                }]
            },
            "success": true,
            "errorCode": 10000,
            "errorText": "NoError"
        }]
    })
    .to_string()
}
