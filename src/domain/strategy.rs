//! Strategy labels used to group holdings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::RiskboardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Strategy {
    #[serde(rename = "Run-up")]
    RunUp,
    Hedge,
    Hold,
    Medium,
    Long,
}

impl Strategy {
    /// Menu order, also the order strategy groups are reported in.
    pub const ALL: [Strategy; 5] = [
        Strategy::RunUp,
        Strategy::Hedge,
        Strategy::Hold,
        Strategy::Medium,
        Strategy::Long,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::RunUp => "Run-up",
            Strategy::Hedge => "Hedge",
            Strategy::Hold => "Hold",
            Strategy::Medium => "Medium",
            Strategy::Long => "Long",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = RiskboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "run-up" | "runup" | "run_up" => Ok(Strategy::RunUp),
            "hedge" => Ok(Strategy::Hedge),
            "hold" => Ok(Strategy::Hold),
            "medium" => Ok(Strategy::Medium),
            "long" => Ok(Strategy::Long),
            _ => Err(RiskboardError::UnknownStrategy {
                name: s.trim().to_string(),
            }),
        }
    }
}
