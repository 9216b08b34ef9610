//! Persistence port for strategy assignments.

use crate::domain::error::RiskboardError;
use crate::domain::portfolio::Portfolio;

pub trait StrategyStore {
    /// Load the cached portfolio. A missing or unreadable cache yields an
    /// empty portfolio rather than an error.
    fn load(&self) -> Portfolio;

    /// Persist entries and stamp `last_saved_time` on the portfolio.
    fn save(&self, portfolio: &mut Portfolio) -> Result<(), RiskboardError>;
}
