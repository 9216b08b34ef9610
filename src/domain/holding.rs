//! Broker account snapshot and live portfolio weights.

use std::collections::BTreeMap;

use super::error::RiskboardError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityType {
    Stock,
    Other(String),
}

impl SecurityType {
    /// Map a TWS security type code (`STK`, `OPT`, ...) to a variant.
    pub fn from_code(code: &str) -> Self {
        let code = code.trim().to_uppercase();
        if code == "STK" {
            SecurityType::Stock
        } else {
            SecurityType::Other(code)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub security_type: SecurityType,
    pub currency: String,
    pub market_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountSnapshot {
    pub net_liquidation: f64,
    pub positions: BTreeMap<String, Position>,
}

impl AccountSnapshot {
    pub fn new(net_liquidation: f64) -> Self {
        Self {
            net_liquidation,
            positions: BTreeMap::new(),
        }
    }

    /// Record a position. Non-stock positions are ignored; a later update
    /// for the same symbol replaces the earlier one.
    pub fn record_position(&mut self, position: Position) {
        if position.security_type == SecurityType::Stock {
            self.positions.insert(position.symbol.clone(), position);
        }
    }

    /// Record one lot of a position. Stock lots for a symbol already held
    /// are added to its market value.
    pub fn add_lot(&mut self, position: Position) {
        if position.security_type != SecurityType::Stock {
            return;
        }
        match self.positions.get_mut(&position.symbol) {
            Some(held) => {
                tracing::debug!(symbol = %position.symbol, "merging additional lot");
                held.market_value += position.market_value;
            }
            None => {
                self.positions.insert(position.symbol.clone(), position);
            }
        }
    }

    /// market_value / net_liquidation per stock symbol.
    pub fn weights(&self) -> Result<BTreeMap<String, f64>, RiskboardError> {
        if self.positions.is_empty() {
            return Err(RiskboardError::NoHoldings);
        }
        if !self.net_liquidation.is_finite() || self.net_liquidation <= 0.0 {
            return Err(RiskboardError::InvalidNetLiquidation {
                value: self.net_liquidation,
            });
        }
        Ok(self
            .positions
            .iter()
            .map(|(symbol, pos)| (symbol.clone(), pos.market_value / self.net_liquidation))
            .collect())
    }
}
