//! Strategy-tagged portfolio state and reconciliation with broker snapshots.

use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet};

use super::price_history::PriceHistory;
use super::strategy::Strategy;
use crate::ports::assigner_port::StrategyAssigner;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioEntry {
    pub weight: f64,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Portfolio {
    entries: BTreeMap<String, PortfolioEntry>,
    histories: BTreeMap<String, PriceHistory>,
    pub last_refresh_time: Option<NaiveDateTime>,
    pub last_saved_time: Option<NaiveDateTime>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a portfolio from persisted entries (no histories).
    pub fn from_entries(
        entries: BTreeMap<String, PortfolioEntry>,
        last_saved_time: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            entries,
            histories: BTreeMap::new(),
            last_refresh_time: None,
            last_saved_time,
        }
    }

    pub fn add_stock(&mut self, ticker: &str, weight: f64, strategy: Strategy) {
        self.entries
            .insert(ticker.to_string(), PortfolioEntry { weight, strategy });
    }

    /// Change weight and/or strategy. Returns false if the ticker is unknown.
    pub fn update_stock(
        &mut self,
        ticker: &str,
        weight: Option<f64>,
        strategy: Option<Strategy>,
    ) -> bool {
        match self.entries.get_mut(ticker) {
            Some(entry) => {
                if let Some(w) = weight {
                    entry.weight = w;
                }
                if let Some(s) = strategy {
                    entry.strategy = s;
                }
                true
            }
            None => false,
        }
    }

    /// Remove a ticker and its history. Returns the removed entry, if any.
    pub fn remove_stock(&mut self, ticker: &str) -> Option<PortfolioEntry> {
        self.histories.remove(ticker);
        self.entries.remove(ticker)
    }

    pub fn set_history(&mut self, ticker: &str, history: PriceHistory) {
        self.histories.insert(ticker.to_string(), history);
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.entries.contains_key(ticker)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &BTreeMap<String, PortfolioEntry> {
        &self.entries
    }

    pub fn entry(&self, ticker: &str) -> Option<&PortfolioEntry> {
        self.entries.get(ticker)
    }

    pub fn weights(&self) -> BTreeMap<String, f64> {
        self.entries
            .iter()
            .map(|(t, e)| (t.clone(), e.weight))
            .collect()
    }

    pub fn strategies(&self) -> BTreeMap<String, Strategy> {
        self.entries
            .iter()
            .map(|(t, e)| (t.clone(), e.strategy))
            .collect()
    }

    pub fn history(&self, ticker: &str) -> Option<&PriceHistory> {
        self.histories.get(ticker)
    }

    pub fn histories(&self) -> &BTreeMap<String, PriceHistory> {
        &self.histories
    }

    pub fn last_refresh_time(&self) -> Option<NaiveDateTime> {
        self.last_refresh_time
    }

    pub fn last_saved_time(&self) -> Option<NaiveDateTime> {
        self.last_saved_time
    }
}

/// What changed during one reconciliation. All lists are sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshOutcome {
    pub added: Vec<(String, Strategy)>,
    pub pending: Vec<String>,
    pub removed: Vec<String>,
    pub updated: Vec<String>,
    pub missing_history: Vec<String>,
}

/// Reconcile the cached portfolio with live weights and price histories.
///
/// Tickers with a zero weight count as not held. New tickers are only added
/// once the assigner picks a strategy for them; until then they stay pending
/// but their history is kept so the next refresh has it ready.
pub fn update_portfolio(
    portfolio: &mut Portfolio,
    holdings: &BTreeMap<String, f64>,
    histories: &BTreeMap<String, PriceHistory>,
    assigner: &mut dyn StrategyAssigner,
    now: NaiveDateTime,
) -> RefreshOutcome {
    portfolio.last_refresh_time = Some(now);

    let old_tickers: BTreeSet<String> = portfolio.entries.keys().cloned().collect();
    let new_tickers: BTreeSet<String> = holdings
        .iter()
        .filter(|(_, w)| **w != 0.0)
        .map(|(t, _)| t.clone())
        .collect();

    let mut outcome = RefreshOutcome::default();

    for ticker in old_tickers.difference(&new_tickers) {
        portfolio.remove_stock(ticker);
        tracing::info!(ticker = %ticker, "removed from portfolio");
        outcome.removed.push(ticker.clone());
    }

    for ticker in new_tickers.difference(&old_tickers) {
        let weight = holdings[ticker];
        match assigner.assign(ticker, weight) {
            Some(strategy) => {
                portfolio.add_stock(ticker, weight, strategy);
                tracing::info!(ticker = %ticker, strategy = %strategy, "strategy assigned");
                outcome.added.push((ticker.clone(), strategy));
            }
            None => {
                tracing::info!(ticker = %ticker, "new holding awaiting strategy");
                outcome.pending.push(ticker.clone());
            }
        }
        store_history(portfolio, ticker, histories, &mut outcome);
    }

    for ticker in new_tickers.intersection(&old_tickers) {
        portfolio.update_stock(ticker, Some(holdings[ticker]), None);
        store_history(portfolio, ticker, histories, &mut outcome);
        outcome.updated.push(ticker.clone());
    }

    outcome.missing_history.sort();
    outcome
}

fn store_history(
    portfolio: &mut Portfolio,
    ticker: &str,
    histories: &BTreeMap<String, PriceHistory>,
    outcome: &mut RefreshOutcome,
) {
    match histories.get(ticker) {
        Some(h) => portfolio.set_history(ticker, h.clone()),
        None => {
            tracing::warn!(ticker = %ticker, "no price history received");
            outcome.missing_history.push(ticker.to_string());
        }
    }
}
