use std::env;
use std::time::Duration;
use thiserror::Error;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Runtime settings of the desk, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskConfig {
    pub log_format: LogFormat,
    /// How long the simulated backend takes to accept a submission.
    pub submit_delay: Duration,
    /// Makes every simulated submission fail.
    pub fail_submission: bool,
}

pub const DEFAULT_SUBMIT_DELAY_MS: u64 = 1500;

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            submit_delay: Duration::from_millis(DEFAULT_SUBMIT_DELAY_MS),
            fail_submission: false,
        }
    }
}

impl DeskConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_format = lookup("LOG_FORMAT")
            .map(|value| LogFormat::from_str(&value))
            .unwrap_or(LogFormat::Pretty);

        let submit_delay = match lookup("SUBMIT_DELAY_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidDelay(raw))?,
            None => Duration::from_millis(DEFAULT_SUBMIT_DELAY_MS),
        };

        let fail_submission = match lookup("SUBMIT_FAILURE") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                key: "SUBMIT_FAILURE",
                value: raw,
            })?,
            None => false,
        };

        Ok(Self {
            log_format,
            submit_delay,
            fail_submission,
        })
    }

    /// Applies command-line overrides on top of the environment.
    pub fn with_overrides(mut self, submit_delay_ms: Option<u64>, fail_submission: bool) -> Self {
        if let Some(ms) = submit_delay_ms {
            self.submit_delay = Duration::from_millis(ms);
        }
        self.fail_submission |= fail_submission;
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SUBMIT_DELAY_MS must be a whole number of milliseconds, got {0:?}")]
    InvalidDelay(String),

    #[error("{key} must be a boolean flag, got {value:?}")]
    InvalidFlag { key: &'static str, value: String },
}
