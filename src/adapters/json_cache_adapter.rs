//! JSON strategy cache.
//!
//! Layout: `{"portfolio": {TICKER: {"weight": f, "strategy": s}}, "last_saved_time": "%Y-%m-%d %H:%M:%S"}`.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::domain::error::RiskboardError;
use crate::domain::portfolio::{Portfolio, PortfolioEntry};
use crate::domain::strategy::Strategy;
use crate::ports::store_port::StrategyStore;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize, Deserialize)]
struct CachedEntry {
    weight: f64,
    strategy: Strategy,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    portfolio: BTreeMap<String, CachedEntry>,
    last_saved_time: Option<String>,
}

pub struct JsonCacheAdapter {
    path: PathBuf,
}

impl JsonCacheAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read(&self) -> Result<Portfolio, RiskboardError> {
        let content = fs::read_to_string(&self.path)?;
        let cache: CacheFile =
            serde_json::from_str(&content).map_err(|e| RiskboardError::Cache {
                reason: format!("failed to decode {}: {}", self.path.display(), e),
            })?;

        let last_saved_time = cache
            .last_saved_time
            .as_deref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok());

        let entries = cache
            .portfolio
            .into_iter()
            .map(|(ticker, e)| {
                (
                    ticker,
                    PortfolioEntry {
                        weight: e.weight,
                        strategy: e.strategy,
                    },
                )
            })
            .collect();

        Ok(Portfolio::from_entries(entries, last_saved_time))
    }
}

impl StrategyStore for JsonCacheAdapter {
    fn load(&self) -> Portfolio {
        match self.read() {
            Ok(portfolio) => {
                tracing::debug!(
                    path = %self.path.display(),
                    tickers = portfolio.entries().len(),
                    "loaded strategy cache"
                );
                portfolio
            }
            Err(RiskboardError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "cache not found, starting with a clean slate");
                Portfolio::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "error reading cache, starting with a clean slate");
                Portfolio::new()
            }
        }
    }

    fn save(&self, portfolio: &mut Portfolio) -> Result<(), RiskboardError> {
        let saved_at = Local::now().naive_local();
        let cache = CacheFile {
            portfolio: portfolio
                .entries()
                .iter()
                .map(|(ticker, e)| {
                    (
                        ticker.clone(),
                        CachedEntry {
                            weight: e.weight,
                            strategy: e.strategy,
                        },
                    )
                })
                .collect(),
            last_saved_time: Some(saved_at.format(TIMESTAMP_FORMAT).to_string()),
        };

        let json = serde_json::to_string_pretty(&cache).map_err(|e| RiskboardError::Cache {
            reason: format!("failed to encode cache: {}", e),
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, json)?;

        portfolio.last_saved_time = Some(saved_at);
        tracing::debug!(path = %self.path.display(), "saved strategy cache");
        Ok(())
    }
}
