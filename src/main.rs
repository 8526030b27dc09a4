//! nginx-log-stats - request statistics for nginx logs stored in MongoDB
//!
//! Prints to stdout:
//! - Total log count
//! - Per-method counts (GET, POST, PUT, PATCH, DELETE)
//! - GET /status count
//! - Top 10 client IPs

mod config;
mod db;
mod report;

use anyhow::Result;
use std::io::Write;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before any other initialization)
    let _ = dotenvy::dotenv();

    let config = config::Config::load()?;

    // stdout carries the report, so every log line goes to stderr.
    // Use LOG_FORMAT=gcp for structured GCP Cloud Logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.to_lowercase()));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "gcp" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_stackdriver::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    info!("Configuration loaded");

    let store = db::MongoStore::connect(&config.database).await?;
    let report = report::Report::collect(&store, &config.report).await?;

    let mut stdout = std::io::stdout().lock();
    write!(stdout, "{}", report)?;
    stdout.flush()?;

    Ok(())
}
