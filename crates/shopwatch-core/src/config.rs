use std::env::VarError;
use std::str::FromStr;

use crate::app_config::{AppConfig, DEFAULT_PLACEHOLDER_IMAGE_URL, DEFAULT_STORE_URL};
use crate::time::CanonicalTz;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files, which makes it usable in tests
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Reads `var` through `lookup`, falling back to `default`, and parses it.
fn parse_or<T, F>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Result<String, VarError>,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Like [`parse_or`] but rejects zero, for counts that must make progress.
fn parse_positive<T, F>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Result<String, VarError>,
{
    let value: T = parse_or(lookup, var, default)?;
    if value == T::default() {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup with no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = require("DATABASE_URL")?;
    let log_level = or_default("SHOPWATCH_LOG_LEVEL", "info");
    let store_url = or_default("SHOPWATCH_STORE_URL", DEFAULT_STORE_URL)
        .trim_end_matches('/')
        .to_string();
    let placeholder_image_url = or_default(
        "SHOPWATCH_PLACEHOLDER_IMAGE_URL",
        DEFAULT_PLACEHOLDER_IMAGE_URL,
    );
    let timezone =
        CanonicalTz::from_offset_hours(parse_or(&lookup, "SHOPWATCH_UTC_OFFSET_HOURS", "8")?)?;

    let db_max_connections = parse_or(&lookup, "SHOPWATCH_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_or(&lookup, "SHOPWATCH_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_or(&lookup, "SHOPWATCH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let scraper_request_timeout_secs =
        parse_positive(&lookup, "SHOPWATCH_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_probe_timeout_secs =
        parse_positive(&lookup, "SHOPWATCH_SCRAPER_PROBE_TIMEOUT_SECS", "10")?;
    let scraper_user_agent = or_default(
        "SHOPWATCH_SCRAPER_USER_AGENT",
        "shopwatch/0.1 (catalog-monitor)",
    );
    let scraper_page_size = parse_positive(&lookup, "SHOPWATCH_SCRAPER_PAGE_SIZE", "250")?;
    let scraper_inter_page_delay_ms =
        parse_or(&lookup, "SHOPWATCH_SCRAPER_INTER_PAGE_DELAY_MS", "1000")?;
    let scraper_max_retries = parse_or(&lookup, "SHOPWATCH_SCRAPER_MAX_RETRIES", "3")?;
    let scraper_retry_delay_secs = parse_or(&lookup, "SHOPWATCH_SCRAPER_RETRY_DELAY_SECS", "5")?;

    let verify_passes = parse_positive(&lookup, "SHOPWATCH_VERIFY_PASSES", "3")?;
    let verify_delay_secs = parse_or(&lookup, "SHOPWATCH_VERIFY_DELAY_SECS", "5")?;
    let probe_delisted = parse_or(&lookup, "SHOPWATCH_PROBE_DELISTED", "true")?;
    let probe_concurrency = parse_positive(&lookup, "SHOPWATCH_PROBE_CONCURRENCY", "20")?;
    let event_write_concurrency =
        parse_positive(&lookup, "SHOPWATCH_EVENT_WRITE_CONCURRENCY", "50")?;

    let typed_retention_days = parse_positive(&lookup, "SHOPWATCH_TYPED_RETENTION_DAYS", "7")?;
    let ledger_retention_days = parse_positive(&lookup, "SHOPWATCH_LEDGER_RETENTION_DAYS", "30")?;

    let cycle_max_attempts = parse_positive(&lookup, "SHOPWATCH_CYCLE_MAX_ATTEMPTS", "3")?;
    let cycle_retry_delay_secs = parse_or(&lookup, "SHOPWATCH_CYCLE_RETRY_DELAY_SECS", "60")?;
    let schedule = or_default("SHOPWATCH_SCHEDULE", "0 */5 * * * *");

    Ok(AppConfig {
        database_url,
        log_level,
        store_url,
        placeholder_image_url,
        timezone,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_request_timeout_secs,
        scraper_probe_timeout_secs,
        scraper_user_agent,
        scraper_page_size,
        scraper_inter_page_delay_ms,
        scraper_max_retries,
        scraper_retry_delay_secs,
        verify_passes,
        verify_delay_secs,
        probe_delisted,
        probe_concurrency,
        event_write_concurrency,
        typed_retention_days,
        ledger_retention_days,
        cycle_max_attempts,
        cycle_retry_delay_secs,
        schedule,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
