//! Strategy-grouped risk summary rows.

use std::collections::BTreeMap;

use super::portfolio::Portfolio;
use super::price_history::PriceHistory;
use super::risk::{self, RiskMetrics};
use super::strategy::Strategy;

pub const RUN_UP_HEDGED: &str = "Run-up Hedged";
pub const TOTAL: &str = "Total";

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub label: String,
    pub summed_weight: f64,
    pub volatility: Option<f64>,
    pub beta: Option<f64>,
}

impl SummaryRow {
    fn new(label: &str, weights: &BTreeMap<String, f64>, metrics: RiskMetrics) -> Self {
        SummaryRow {
            label: label.to_string(),
            summed_weight: weights.values().fold(0.0, |acc, w| acc + w),
            volatility: metrics.volatility,
            beta: metrics.beta,
        }
    }
}

/// One row per strategy (Hedge folded into "Run-up Hedged"), then the
/// combined "Run-up Hedged" row, then "Total".
pub fn summarize(
    portfolio: &Portfolio,
    benchmark: Option<&PriceHistory>,
    trading_days: f64,
) -> Vec<SummaryRow> {
    let histories = portfolio.histories();
    let mut rows = Vec::new();

    for strategy in Strategy::ALL {
        if strategy == Strategy::Hedge {
            continue;
        }
        let group = group_weights(portfolio, |s| s == strategy);
        if group.is_empty() {
            continue;
        }
        let metrics = risk::measure(&group, histories, benchmark, trading_days);
        rows.push(SummaryRow::new(strategy.name(), &group, metrics));
    }

    let combined = group_weights(portfolio, |s| matches!(s, Strategy::RunUp | Strategy::Hedge));
    let metrics = risk::measure(&combined, histories, benchmark, trading_days);
    rows.push(SummaryRow::new(RUN_UP_HEDGED, &combined, metrics));

    let total = portfolio.weights();
    let metrics = risk::measure(&total, histories, benchmark, trading_days);
    rows.push(SummaryRow::new(TOTAL, &total, metrics));

    rows
}

fn group_weights(portfolio: &Portfolio, keep: impl Fn(Strategy) -> bool) -> BTreeMap<String, f64> {
    portfolio
        .entries()
        .iter()
        .filter(|(_, e)| keep(e.strategy))
        .map(|(t, e)| (t.clone(), e.weight))
        .collect()
}
