//! Broker data access port trait.

use crate::domain::error::RiskboardError;
use crate::domain::holding::AccountSnapshot;
use crate::domain::price_history::PriceHistory;

pub trait BrokerPort {
    /// Current net liquidation value and stock positions.
    fn account_snapshot(&self) -> Result<AccountSnapshot, RiskboardError>;

    /// Daily closes for one held symbol.
    fn price_history(&self, symbol: &str) -> Result<PriceHistory, RiskboardError>;

    /// Daily closes for the market benchmark.
    fn benchmark_history(&self, symbol: &str) -> Result<PriceHistory, RiskboardError> {
        self.price_history(symbol)
    }
}
