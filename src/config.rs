use std::env;
use std::fs;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::api::{ApiOptions, DEFAULT_API_BASE, DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_REPORT_TIMEOUT_MS};
use crate::reporter::{ReporterOptions, DEFAULT_MAX_IN_FLIGHT, DEFAULT_QUEUE_CAPACITY};

/// Host configuration read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path of the block configuration file.
    pub config_path: String,
    /// Contents of `config_path`.
    pub config_source: String,
    pub api: ApiOptions,
    pub reporter: ReporterOptions,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let config_path = env::var("KNOWNAGENTS_CONFIG")
            .map_err(|_| anyhow!("KNOWNAGENTS_CONFIG must point to a configuration file"))?;
        let config_source = fs::read_to_string(&config_path).with_context(|| {
            format!(
                "Failed to read KNOWNAGENTS_CONFIG '{}': file unreadable",
                config_path
            )
        })?;

        let base_url = env::var("KNOWNAGENTS_API_BASE")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let fetch_timeout_ms =
            parse_optional_u64("KNOWNAGENTS_FETCH_TIMEOUT_MS")?.unwrap_or(DEFAULT_FETCH_TIMEOUT_MS);
        let report_timeout_ms = parse_optional_u64("KNOWNAGENTS_REPORT_TIMEOUT_MS")?
            .unwrap_or(DEFAULT_REPORT_TIMEOUT_MS);
        let queue_capacity = parse_optional_u64("KNOWNAGENTS_REPORT_QUEUE")?
            .filter(|n| *n > 0)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_QUEUE_CAPACITY);
        let max_in_flight = parse_optional_u64("KNOWNAGENTS_REPORT_CONCURRENCY")?
            .filter(|n| *n > 0)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_IN_FLIGHT);

        Ok(Self {
            config_path,
            config_source,
            api: ApiOptions {
                base_url,
                fetch_timeout: Duration::from_millis(fetch_timeout_ms),
                report_timeout: Duration::from_millis(report_timeout_ms),
            },
            reporter: ReporterOptions {
                queue_capacity,
                max_in_flight,
            },
        })
    }
}

fn parse_optional_u64(var: &str) -> Result<Option<u64>> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| anyhow!("{} must be a positive integer", var)),
        Ok(_) => Ok(None),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}
