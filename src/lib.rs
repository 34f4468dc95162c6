//! # eloverblik - client for the eloverblik.dk customer API
//!
//! Fetches hourly and monthly consumption, tariffs and meter readings for
//! Danish electricity metering points.
//!
//! ## Architecture
//!
//! - `client`: query façade (latest day, yesterday, per month, tariffs, readings)
//! - `token`: access token exchange and 12 hour cache
//! - `transport`: HTTP seam with a reqwest implementation (timeout, retry)
//! - `parser`: defensive parsing of API documents into typed results
//! - `models`: result types carrying a uniform `status`
//! - `clock`: injectable time source
//! - `config`: YAML configuration with environment overrides
//! - `logging`: tracing setup and component loggers
//!
//! ```no_run
//! # async fn run() -> eloverblik::Result<()> {
//! let mut client = eloverblik::EloverblikClient::new("refresh-token")?;
//! let day = client.get_latest("571313000000000000").await?;
//! if day.is_ok() {
//!     println!("{} kWh", day.get_total_metering_data());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod parser;
pub mod token;
pub mod transport;

// Re-export commonly used types
pub use client::EloverblikClient;
pub use config::Config;
pub use error::{EloverblikError, Result};
pub use models::{Aggregation, Charges, MeterReading, Rate, RawResponse, TimeSeries};
