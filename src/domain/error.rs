//! Domain error types.

/// Top-level error type for riskboard.
#[derive(Debug, thiserror::Error)]
pub enum RiskboardError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("broker error: {reason}")]
    Broker { reason: String },

    #[error("strategy cache error: {reason}")]
    Cache { reason: String },

    #[error("unknown strategy '{name}' (expected one of Run-up, Hedge, Hold, Medium, Long)")]
    UnknownStrategy { name: String },

    #[error("invalid assignment '{arg}' (expected TICKER=STRATEGY)")]
    InvalidAssignment { arg: String },

    #[error("ticker {ticker} is not in the portfolio")]
    UnknownTicker { ticker: String },

    #[error("no portfolio data received from the broker yet")]
    NoHoldings,

    #[error("net liquidation value must be positive, got {value}")]
    InvalidNetLiquidation { value: f64 },

    #[error("no price history for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RiskboardError {
    /// Process exit status reported for this error.
    pub fn exit_status(&self) -> u8 {
        match self {
            RiskboardError::Io(_) => 1,
            RiskboardError::ConfigParse { .. }
            | RiskboardError::ConfigMissing { .. }
            | RiskboardError::ConfigInvalid { .. } => 2,
            RiskboardError::Broker { .. } | RiskboardError::Cache { .. } => 3,
            RiskboardError::UnknownStrategy { .. }
            | RiskboardError::InvalidAssignment { .. }
            | RiskboardError::UnknownTicker { .. } => 4,
            RiskboardError::NoHoldings
            | RiskboardError::InvalidNetLiquidation { .. }
            | RiskboardError::NoData { .. } => 5,
        }
    }
}

impl From<&RiskboardError> for std::process::ExitCode {
    fn from(err: &RiskboardError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
