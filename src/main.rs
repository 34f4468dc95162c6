//! eloverblik - command line entry point
//!
//! Prints consumption, tariffs or meter readings for one metering point.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use eloverblik::{Charges, Config, EloverblikClient, MeterReading, Rate, TimeSeries, logging};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Query the eloverblik.dk customer API
#[derive(Parser)]
#[command(name = "eloverblik")]
#[command(version = env!("APP_VERSION"), about = "Query the eloverblik.dk customer API")]
struct Cli {
    /// Refresh token generated on eloverblik.dk (overrides config)
    #[arg(long)]
    refresh_token: Option<String>,

    /// Metering point id (overrides config)
    #[arg(long)]
    metering_point: Option<String>,

    /// Path to a YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available queries; `latest` when none is given
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Hourly data for the most recent day with data
    Latest,
    /// Hourly data for yesterday
    Yesterday,
    /// Monthly totals for a year
    PerMonth {
        /// Four digit year; defaults to the current year
        #[arg(long)]
        year: Option<i32>,
    },
    /// Tariffs of the metering point
    Tariffs,
    /// Newest meter reading
    MeterReading,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let mut cfg = Config::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            cfg.apply_env_overrides();
            cfg
        }
        None => Config::load()?,
    };
    if let Some(token) = cli.refresh_token {
        config.api.refresh_token = token;
    }
    if let Some(point) = cli.metering_point {
        config.metering_point = Some(point);
    }
    config.validate()?;
    logging::init_logging(&config.logging)?;

    let metering_point = config
        .metering_point
        .clone()
        .ok_or_else(|| anyhow!("No metering point given; use --metering-point"))?;
    let mut client = EloverblikClient::from_config(&config.api)?;

    match cli.command.unwrap_or(Commands::Latest) {
        Commands::Latest => {
            let day = client.get_latest(&metering_point).await?;
            emit(cli.json, &day, || render_day(&day))
        }
        Commands::Yesterday => {
            let day = client.get_yesterday_parsed(&metering_point).await?;
            emit(cli.json, &day, || render_day(&day))
        }
        Commands::PerMonth { year } => {
            let months = client.get_per_month(&metering_point, year).await?;
            emit(cli.json, &months, || render_months(&months))
        }
        Commands::Tariffs => {
            let charges = client.get_tariffs(&metering_point).await?;
            emit(cli.json, &charges, || render_charges(&charges))
        }
        Commands::MeterReading => {
            let reading = client.get_meter_reading_latest(&metering_point).await?;
            emit(cli.json, &reading, || render_reading(&reading))
        }
    }
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text());
    }
    Ok(())
}

fn render_error(status: u16, detail: Option<&str>) -> String {
    format!(
        "Error getting data. Status: {}. Error: {}\n",
        status,
        detail.unwrap_or("")
    )
}

fn render_day(day: &TimeSeries) -> String {
    if !day.is_ok() {
        return render_error(day.status(), day.detailed_status());
    }
    let mut out = String::new();
    if let Some(date) = day.data_date() {
        let _ = writeln!(out, "Date: {}", date);
    }
    for (hour, value) in day.metering_data().iter().enumerate() {
        let _ = writeln!(out, "Hour {}-{}: {}kWh", hour, hour + 1, value);
    }
    let _ = writeln!(out, "Total: {}kWh", day.get_total_metering_data());
    out
}

fn render_months(months: &TimeSeries) -> String {
    if !months.is_ok() {
        return render_error(months.status(), months.detailed_status());
    }
    let mut out = String::new();
    for (i, value) in months.metering_data().iter().enumerate() {
        let _ = writeln!(out, "Month {}: {}kWh", i + 1, value);
    }
    let _ = writeln!(out, "Total: {}kWh", months.get_total_metering_data());
    out
}

fn render_charges(charges: &Charges) -> String {
    let Some(rates) = charges.charges().filter(|_| charges.is_ok()) else {
        return render_error(charges.status(), charges.detailed_status());
    };
    let mut out = String::new();
    for (name, rate) in rates {
        match rate {
            Rate::Daily(price) => {
                let _ = writeln!(out, "{}: {}", name, price);
            }
            Rate::Hourly(prices) => {
                let _ = writeln!(out, "{}:", name);
                for (hour, price) in prices.iter().enumerate() {
                    let _ = writeln!(out, "  Hour {}-{}: {}", hour, hour + 1, price);
                }
            }
        }
    }
    out
}

fn render_reading(reading: &MeterReading) -> String {
    if !reading.is_ok() {
        return render_error(reading.status(), reading.detailed_status());
    }
    format!(
        "Reading: {} {} ({})\n",
        reading.reading().unwrap_or_default(),
        reading.measurement_unit().unwrap_or_default(),
        reading.reading_date().unwrap_or_default()
    )
}
