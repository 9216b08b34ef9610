//! Strategy selection for newly seen holdings.

use crate::domain::strategy::Strategy;

pub trait StrategyAssigner {
    /// Pick a strategy for `ticker`, or `None` to leave it pending.
    fn assign(&mut self, ticker: &str, weight: f64) -> Option<Strategy>;
}
