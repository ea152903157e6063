//! Demo configuration read from environment variables.

use std::str::FromStr;

use crate::error::AppError;

/// Log output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Multi-line human-readable output.
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(AppError::Config(format!(
                "LOG_FORMAT must be json or pretty, got {other}"
            ))),
        }
    }
}

/// How the final account statement is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementFormat {
    /// The console table.
    #[default]
    Text,
    /// Pretty-printed JSON of the statement read model.
    Json,
}

impl FromStr for StatementFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(AppError::Config(format!(
                "STATEMENT_FORMAT must be text or json, got {other}"
            ))),
        }
    }
}

/// Demo settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of the account the scenario opens (`ACCOUNT_NUMBER`).
    pub account_number: String,
    /// Tracing output format (`LOG_FORMAT`).
    pub log_format: LogFormat,
    /// Statement output format (`STATEMENT_FORMAT`).
    pub statement_format: StatementFormat,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`; unset keys take their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable holds an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let account_number = lookup("ACCOUNT_NUMBER").unwrap_or_else(|| "ACC777".to_string());
        if account_number.trim().is_empty() {
            return Err(AppError::Config("ACCOUNT_NUMBER must not be empty".into()));
        }

        let log_format = lookup("LOG_FORMAT")
            .map(|value| value.parse())
            .transpose()?
            .unwrap_or_default();
        let statement_format = lookup("STATEMENT_FORMAT")
            .map(|value| value.parse())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            account_number,
            log_format,
            statement_format,
        })
    }
}
