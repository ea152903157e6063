//! Chronicle bank demo entry point.

use std::error::Error;

use tracing_subscriber::EnvFilter;

use crate::config::{Config, LogFormat};

mod app;
mod config;
mod error;

fn init_tracing(format: LogFormat) {
    let subscriber = tracing_subscriber::fmt().with_env_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!(account_number = %config.account_number, "Starting Chronicle bank demo");

    let statement = app::run(&config)?;
    print!("{statement}");

    Ok(())
}
