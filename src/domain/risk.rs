//! Portfolio volatility and beta from daily closes.
//!
//! Returns are simple day-over-day changes. A group of histories is first
//! aligned on the union of their dates with each series carried forward over
//! gaps (leading gaps stay empty), so every series shares one calendar.
//! Covariances use pairwise-complete observations with an `n - 1`
//! denominator. Non-finite returns (from a zero close) count as missing.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use super::price_history::PriceHistory;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

type Returns = BTreeMap<NaiveDate, f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskMetrics {
    pub volatility: Option<f64>,
    pub beta: Option<f64>,
}

/// Volatility and beta for one weighted group of tickers.
pub fn measure(
    weights: &BTreeMap<String, f64>,
    histories: &BTreeMap<String, PriceHistory>,
    benchmark: Option<&PriceHistory>,
    trading_days: f64,
) -> RiskMetrics {
    RiskMetrics {
        volatility: portfolio_volatility(weights, histories, trading_days),
        beta: benchmark.and_then(|b| portfolio_beta(weights, histories, b)),
    }
}

/// Annualised volatility `sqrt(w' Σ w)` with `Σ` scaled by `trading_days`.
///
/// `None` when the weight set is empty, a ticker has no history, or any
/// covariance needed is undefined.
pub fn portfolio_volatility(
    weights: &BTreeMap<String, f64>,
    histories: &BTreeMap<String, PriceHistory>,
    trading_days: f64,
) -> Option<f64> {
    if weights.is_empty() {
        tracing::warn!("empty portfolio, volatility not computed");
        return None;
    }
    let (w, columns) = aligned_returns(weights, histories)?;

    let mut variance = 0.0;
    for i in 0..columns.len() {
        for j in i..columns.len() {
            let cov = sample_covariance(&columns[i], &columns[j])? * trading_days;
            let term = w[i] * w[j] * cov;
            variance += if i == j { term } else { 2.0 * term };
        }
    }

    // Rounding can leave a fully hedged book a hair below zero.
    let variance = if variance < 0.0 && variance > -1e-12 {
        0.0
    } else {
        variance
    };
    let vol = variance.sqrt();
    vol.is_finite().then_some(vol)
}

/// Weighted sum of per-ticker betas against `market`.
///
/// Market returns are taken on the market's own dates; each ticker's
/// covariance with the market uses the dates both series have a return for.
pub fn portfolio_beta(
    weights: &BTreeMap<String, f64>,
    histories: &BTreeMap<String, PriceHistory>,
    market: &PriceHistory,
) -> Option<f64> {
    if weights.is_empty() {
        tracing::warn!("empty portfolio, beta not computed");
        return None;
    }
    let market_returns = finite_returns(market);
    let market_variance = sample_covariance(&market_returns, &market_returns)?;
    if market_variance == 0.0 {
        tracing::warn!("benchmark variance is zero, beta not computed");
        return None;
    }

    let (w, columns) = aligned_returns(weights, histories)?;
    let mut beta = 0.0;
    for (weight, column) in w.iter().zip(&columns) {
        beta += weight * sample_covariance(column, &market_returns)? / market_variance;
    }
    beta.is_finite().then_some(beta)
}

/// Weights and return columns in the same ticker order.
fn aligned_returns(
    weights: &BTreeMap<String, f64>,
    histories: &BTreeMap<String, PriceHistory>,
) -> Option<(Vec<f64>, Vec<Returns>)> {
    let mut series = Vec::with_capacity(weights.len());
    let mut w = Vec::with_capacity(weights.len());
    for (ticker, weight) in weights {
        match histories.get(ticker) {
            Some(h) => {
                series.push(h);
                w.push(*weight);
            }
            None => {
                tracing::warn!(ticker = %ticker, "no price history, risk not computed");
                return None;
            }
        }
    }
    Some((w, return_frame(&series)))
}

/// Forward-filled returns for each history on the union of their dates.
pub fn return_frame(histories: &[&PriceHistory]) -> Vec<Returns> {
    let calendar: BTreeSet<NaiveDate> = histories.iter().flat_map(|h| h.dates()).collect();

    histories
        .iter()
        .map(|h| {
            let mut out = Returns::new();
            let mut last: Option<f64> = None;
            for date in &calendar {
                let prev = last;
                if let Some(close) = h.get(date) {
                    last = Some(close);
                }
                if let (Some(p), Some(c)) = (prev, last) {
                    let r = c / p - 1.0;
                    if r.is_finite() {
                        out.insert(*date, r);
                    }
                }
            }
            out
        })
        .collect()
}

fn finite_returns(history: &PriceHistory) -> Returns {
    history
        .returns()
        .into_iter()
        .filter(|(_, r)| r.is_finite())
        .collect()
}

/// Sample covariance over dates present in both series.
pub fn sample_covariance(a: &Returns, b: &Returns) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .filter_map(|(d, x)| b.get(d).map(|y| (*x, *y)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let sum: f64 = pairs
        .iter()
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum();
    Some(sum / (n - 1.0))
}
