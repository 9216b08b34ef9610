//! Dashboard rendering port trait.

use chrono::NaiveDateTime;

use crate::domain::error::RiskboardError;
use crate::domain::portfolio::Portfolio;
use crate::domain::summary::SummaryRow;

/// Everything one dashboard render needs.
pub struct Dashboard<'a> {
    pub portfolio: &'a Portfolio,
    pub summary: &'a [SummaryRow],
    pub pending: &'a [String],
    pub generated_at: NaiveDateTime,
    pub refresh_interval_secs: u64,
}

pub trait ReportPort {
    fn write(&self, dashboard: &Dashboard<'_>, output_path: &str) -> Result<(), RiskboardError>;
}
