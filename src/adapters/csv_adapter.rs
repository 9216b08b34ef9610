//! Offline broker snapshot backed by CSV files.
//!
//! Holdings come from one file with `symbol,sec_type,currency,market_value`
//! columns. Each symbol's closes come from `<prices_dir>/<SYMBOL>.csv`,
//! either a `date,close` file or an OHLCV export with a `close` column.

use crate::domain::error::RiskboardError;
use crate::domain::holding::{AccountSnapshot, Position, SecurityType};
use crate::domain::price_history::PriceHistory;
use crate::ports::broker_port::BrokerPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

/// Column of the close price when the header has no `close` field.
const FALLBACK_CLOSE_COLUMN: usize = 4;

pub struct CsvAdapter {
    holdings_file: PathBuf,
    prices_dir: PathBuf,
    net_liquidation: Option<f64>,
    duration_days: i64,
}

impl CsvAdapter {
    pub fn new(holdings_file: PathBuf, prices_dir: PathBuf, duration_days: i64) -> Self {
        Self {
            holdings_file,
            prices_dir,
            net_liquidation: None,
            duration_days,
        }
    }

    /// Use a fixed account value instead of the sum of all market values.
    pub fn with_net_liquidation(mut self, value: f64) -> Self {
        self.net_liquidation = Some(value);
        self
    }

    fn price_path(&self, symbol: &str) -> PathBuf {
        self.prices_dir.join(format!("{}.csv", symbol))
    }

    fn read_history(&self, symbol: &str) -> Result<PriceHistory, RiskboardError> {
        let path = self.price_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| RiskboardError::Broker {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let close_col = rdr
            .headers()
            .map_err(|e| RiskboardError::Broker {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("close"))
            .unwrap_or(FALLBACK_CLOSE_COLUMN);

        let mut history = PriceHistory::new();
        for result in rdr.records() {
            let record = result.map_err(|e| RiskboardError::Broker {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date_str = record.get(0).ok_or_else(|| RiskboardError::Broker {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                RiskboardError::Broker {
                    reason: format!("invalid date '{}': {}", date_str, e),
                }
            })?;

            let close: f64 = record
                .get(close_col)
                .ok_or_else(|| RiskboardError::Broker {
                    reason: "missing close column".into(),
                })?
                .trim()
                .parse()
                .map_err(|e| RiskboardError::Broker {
                    reason: format!("invalid close value: {}", e),
                })?;

            history.insert(date, close);
        }

        if history.is_empty() {
            return Err(RiskboardError::NoData {
                symbol: symbol.to_string(),
            });
        }
        Ok(history.trailing_days(self.duration_days))
    }
}

impl BrokerPort for CsvAdapter {
    fn account_snapshot(&self) -> Result<AccountSnapshot, RiskboardError> {
        let content =
            fs::read_to_string(&self.holdings_file).map_err(|e| RiskboardError::Broker {
                reason: format!("failed to read {}: {}", self.holdings_file.display(), e),
            })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut snapshot = AccountSnapshot::default();
        let mut total_value = 0.0;

        for result in rdr.records() {
            let record = result.map_err(|e| RiskboardError::Broker {
                reason: format!("CSV parse error: {}", e),
            })?;

            let field = |idx: usize, name: &'static str| {
                record
                    .get(idx)
                    .map(str::trim)
                    .ok_or_else(|| RiskboardError::Broker {
                        reason: format!("missing {} column", name),
                    })
            };

            let symbol = field(0, "symbol")?.to_uppercase();
            let sec_type = field(1, "sec_type")?;
            let currency = field(2, "currency")?.to_string();
            let market_value: f64 =
                field(3, "market_value")?
                    .parse()
                    .map_err(|e| RiskboardError::Broker {
                        reason: format!("invalid market_value for {}: {}", symbol, e),
                    })?;

            total_value += market_value;
            snapshot.add_lot(Position {
                symbol,
                security_type: SecurityType::from_code(sec_type),
                currency,
                market_value,
            });
        }

        snapshot.net_liquidation = self.net_liquidation.unwrap_or(total_value);
        tracing::debug!(
            positions = snapshot.positions.len(),
            net_liquidation = snapshot.net_liquidation,
            "loaded holdings from csv"
        );
        Ok(snapshot)
    }

    fn price_history(&self, symbol: &str) -> Result<PriceHistory, RiskboardError> {
        self.read_history(symbol)
    }
}
