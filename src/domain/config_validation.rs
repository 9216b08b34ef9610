//! Configuration validation.
//!
//! Checks every section before any connection is made or file is touched.

use crate::domain::error::RiskboardError;
use crate::ports::config_port::ConfigPort;

pub const SOURCE_CSV: &str = "csv";
pub const SOURCE_IBKR: &str = "ibkr";

/// A hundred years of daily history.
pub const MAX_DURATION_DAYS: i64 = 36_500;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), RiskboardError> {
    validate_gateway(config)?;
    validate_market(config)?;
    validate_risk(config)?;
    validate_dashboard(config)?;
    validate_source(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> RiskboardError {
    RiskboardError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_gateway(config: &dyn ConfigPort) -> Result<(), RiskboardError> {
    let port = config.get_int("gateway", "port", 7497);
    if !(1..=65535).contains(&port) {
        return Err(invalid("gateway", "port", "port must be between 1 and 65535"));
    }
    let client_id = config.get_int("gateway", "client_id", 0);
    if client_id < 0 || client_id > i64::from(i32::MAX) {
        return Err(invalid(
            "gateway",
            "client_id",
            "client_id must be a non-negative 32-bit integer",
        ));
    }
    if config.get_int("gateway", "timeout_secs", 30) <= 0 {
        return Err(invalid(
            "gateway",
            "timeout_secs",
            "timeout_secs must be positive",
        ));
    }
    if let Some(host) = config.get_string("gateway", "host") {
        if host.trim().is_empty() {
            return Err(invalid("gateway", "host", "host must not be empty"));
        }
    }
    Ok(())
}

fn validate_market(config: &dyn ConfigPort) -> Result<(), RiskboardError> {
    if let Some(benchmark) = config.get_string("market", "benchmark") {
        if benchmark.trim().is_empty() {
            return Err(invalid("market", "benchmark", "benchmark must not be empty"));
        }
    }
    let duration = config.get_int("market", "duration_days", 90);
    if duration <= 1 {
        return Err(invalid(
            "market",
            "duration_days",
            "duration_days must be greater than 1",
        ));
    }
    if duration > MAX_DURATION_DAYS {
        return Err(invalid(
            "market",
            "duration_days",
            &format!("duration_days must be at most {}", MAX_DURATION_DAYS),
        ));
    }
    Ok(())
}

fn validate_risk(config: &dyn ConfigPort) -> Result<(), RiskboardError> {
    let days = config.get_double("risk", "trading_days", 252.0);
    if !days.is_finite() || days <= 0.0 {
        return Err(invalid("risk", "trading_days", "trading_days must be positive"));
    }
    Ok(())
}

fn validate_dashboard(config: &dyn ConfigPort) -> Result<(), RiskboardError> {
    if config.get_int("dashboard", "refresh_interval", 120) <= 0 {
        return Err(invalid(
            "dashboard",
            "refresh_interval",
            "refresh_interval must be positive",
        ));
    }
    if let Some(path) = config.get_string("dashboard", "cache_path") {
        if path.trim().is_empty() {
            return Err(invalid("dashboard", "cache_path", "cache_path must not be empty"));
        }
    }
    Ok(())
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), RiskboardError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| SOURCE_CSV.to_string())
        .trim()
        .to_lowercase();

    match source.as_str() {
        SOURCE_CSV => {
            for key in ["holdings_file", "prices_dir"] {
                match config.get_string("csv", key) {
                    Some(v) if !v.trim().is_empty() => {}
                    _ => {
                        return Err(RiskboardError::ConfigMissing {
                            section: "csv".to_string(),
                            key: key.to_string(),
                        });
                    }
                }
            }
            if config.get_string("csv", "net_liquidation").is_some()
                && config.get_double("csv", "net_liquidation", 0.0) <= 0.0
            {
                return Err(invalid(
                    "csv",
                    "net_liquidation",
                    "net_liquidation must be a positive number",
                ));
            }
            Ok(())
        }
        SOURCE_IBKR => {
            if cfg!(feature = "ibkr") {
                Ok(())
            } else {
                Err(invalid(
                    "data",
                    "source",
                    "source 'ibkr' requires the ibkr feature",
                ))
            }
        }
        _ => Err(invalid("data", "source", "source must be 'csv' or 'ibkr'")),
    }
}

fn validate_logging(config: &dyn ConfigPort) -> Result<(), RiskboardError> {
    if let Some(format) = config.get_string("logging", "format") {
        let format = format.trim().to_lowercase();
        if format != "text" && format != "json" {
            return Err(invalid("logging", "format", "format must be 'text' or 'json'"));
        }
    }
    Ok(())
}
