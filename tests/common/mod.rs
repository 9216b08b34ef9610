#![allow(dead_code)]

use chrono::NaiveDate;
use riskboard::cli::Settings;
use riskboard::domain::error::RiskboardError;
use riskboard::domain::holding::{AccountSnapshot, Position, SecurityType};
use riskboard::domain::portfolio::Portfolio;
use riskboard::domain::price_history::PriceHistory;
use riskboard::ports::broker_port::BrokerPort;
use riskboard::ports::store_port::StrategyStore;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;

pub struct MockBroker {
    pub snapshot: AccountSnapshot,
    pub histories: HashMap<String, PriceHistory>,
    pub errors: HashMap<String, String>,
    pub snapshot_error: Option<String>,
    pub history_requests: RefCell<Vec<String>>,
}

impl MockBroker {
    pub fn new(net_liquidation: f64) -> Self {
        Self {
            snapshot: AccountSnapshot::new(net_liquidation),
            histories: HashMap::new(),
            errors: HashMap::new(),
            snapshot_error: None,
            history_requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_stock(mut self, symbol: &str, market_value: f64) -> Self {
        self.snapshot.record_position(Position {
            symbol: symbol.to_string(),
            security_type: SecurityType::Stock,
            currency: "USD".to_string(),
            market_value,
        });
        self
    }

    pub fn with_history(mut self, symbol: &str, closes: &[f64]) -> Self {
        self.histories
            .insert(symbol.to_string(), make_history(closes));
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn failing_snapshot(mut self, reason: &str) -> Self {
        self.snapshot_error = Some(reason.to_string());
        self
    }
}

impl BrokerPort for MockBroker {
    fn account_snapshot(&self) -> Result<AccountSnapshot, RiskboardError> {
        if let Some(reason) = &self.snapshot_error {
            return Err(RiskboardError::Broker {
                reason: reason.clone(),
            });
        }
        Ok(self.snapshot.clone())
    }

    fn price_history(&self, symbol: &str) -> Result<PriceHistory, RiskboardError> {
        self.history_requests.borrow_mut().push(symbol.to_string());
        if let Some(reason) = self.errors.get(symbol) {
            return Err(RiskboardError::Broker {
                reason: reason.clone(),
            });
        }
        self.histories
            .get(symbol)
            .cloned()
            .ok_or_else(|| RiskboardError::NoData {
                symbol: symbol.to_string(),
            })
    }
}

/// In-memory strategy cache.
#[derive(Default)]
pub struct MemoryStore {
    pub saved: RefCell<Option<Portfolio>>,
    pub saves: Cell<usize>,
}

impl MemoryStore {
    pub fn with_portfolio(portfolio: Portfolio) -> Self {
        Self {
            saved: RefCell::new(Some(portfolio)),
            saves: Cell::new(0),
        }
    }
}

impl StrategyStore for MemoryStore {
    fn load(&self) -> Portfolio {
        self.saved.borrow().clone().unwrap_or_default()
    }

    fn save(&self, portfolio: &mut Portfolio) -> Result<(), RiskboardError> {
        portfolio.last_saved_time = portfolio.last_refresh_time;
        *self.saved.borrow_mut() = Some(portfolio.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive daily closes starting 2024-03-01.
pub fn make_history(closes: &[f64]) -> PriceHistory {
    let start = date(2024, 3, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| (start + chrono::Duration::days(i as i64), *c))
        .collect()
}

pub fn sample_settings() -> Settings {
    Settings {
        host: "127.0.0.1".to_string(),
        port: 7497,
        client_id: 0,
        timeout_secs: 30,
        benchmark: "SPY".to_string(),
        duration_days: 90,
        trading_days: 252.0,
        refresh_interval: 120,
        cache_path: PathBuf::from("cache/strategy.json"),
        output: PathBuf::from("dashboard.html"),
        source: "csv".to_string(),
        holdings_file: None,
        prices_dir: None,
        net_liquidation: None,
        log_level: "info".to_string(),
        log_format: "text".to_string(),
    }
}

pub const NVDA: [f64; 6] = [100.0, 105.0, 103.0, 110.0, 108.0, 112.0];
pub const SQQQ: [f64; 6] = [20.0, 19.0, 19.5, 18.0, 18.4, 17.8];
pub const KO: [f64; 6] = [60.0, 60.5, 60.2, 61.0, 60.8, 61.1];
pub const SPY: [f64; 6] = [400.0, 404.0, 401.0, 409.0, 407.0, 411.0];

/// NVDA 30%, SQQQ 5%, KO 20% of a 100k account, plus SPY history.
pub fn sample_broker() -> MockBroker {
    MockBroker::new(100_000.0)
        .with_stock("NVDA", 30_000.0)
        .with_stock("SQQQ", 5_000.0)
        .with_stock("KO", 20_000.0)
        .with_history("NVDA", &NVDA)
        .with_history("SQQQ", &SQQQ)
        .with_history("KO", &KO)
        .with_history("SPY", &SPY)
}
