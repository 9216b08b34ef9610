//! HTML dashboard adapter implementing ReportPort.
//!
//! Renders `templates/dashboard.html` with Askama: last refresh banner,
//! strategy summary, current portfolio with weight bars, and holdings
//! awaiting a strategy. The page reloads itself every refresh interval.

use std::fs;
use std::path::Path;

use askama::Template;

use crate::domain::error::RiskboardError;
use crate::domain::summary::SummaryRow;
use crate::ports::report_port::{Dashboard, ReportPort};

struct SummaryLine {
    label: String,
    weight: String,
    volatility: String,
    beta: String,
}

impl From<&SummaryRow> for SummaryLine {
    fn from(row: &SummaryRow) -> Self {
        Self {
            label: row.label.clone(),
            weight: format!("{:.2}", row.summed_weight),
            volatility: format_optional(row.volatility),
            beta: format_optional(row.beta),
        }
    }
}

struct HoldingLine {
    ticker: String,
    strategy: String,
    bar_width: String,
    color: String,
    percent: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate<'a> {
    refresh_interval_secs: u64,
    summary: Vec<SummaryLine>,
    holdings: Vec<HoldingLine>,
    pending: &'a [String],
    last_refresh: String,
}

pub struct HtmlReportAdapter;

impl HtmlReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, dashboard: &Dashboard<'_>) -> Result<String, RiskboardError> {
        let mut entries: Vec<_> = dashboard.portfolio.entries().iter().collect();
        entries.sort_by(|a, b| b.1.weight.total_cmp(&a.1.weight).then_with(|| a.0.cmp(b.0)));

        let holdings = entries
            .into_iter()
            .map(|(ticker, entry)| {
                let pct = entry.weight * 100.0;
                HoldingLine {
                    ticker: ticker.clone(),
                    strategy: entry.strategy.to_string(),
                    bar_width: format!("{:.2}", pct.clamp(0.0, 100.0)),
                    color: weight_color(pct),
                    percent: format!("{:.2}", pct),
                }
            })
            .collect();

        let refreshed = dashboard
            .portfolio
            .last_refresh_time()
            .unwrap_or(dashboard.generated_at);

        let template = DashboardTemplate {
            refresh_interval_secs: dashboard.refresh_interval_secs,
            summary: dashboard.summary.iter().map(SummaryLine::from).collect(),
            holdings,
            pending: dashboard.pending,
            last_refresh: refreshed.format("%Y-%m-%d %H:%M:%S").to_string(),
        };

        template
            .render()
            .map_err(|e| RiskboardError::Io(std::io::Error::other(e.to_string())))
    }
}

impl Default for HtmlReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for HtmlReportAdapter {
    fn write(&self, dashboard: &Dashboard<'_>, output_path: &str) -> Result<(), RiskboardError> {
        let html = self.render(dashboard)?;
        if let Some(parent) = Path::new(output_path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(output_path, html)?;
        tracing::debug!(path = output_path, "wrote html dashboard");
        Ok(())
    }
}

/// Red at 0%, green at 100%.
pub fn weight_color(pct: f64) -> String {
    let channel = |v: f64| v.clamp(0.0, 255.0) as u8;
    format!(
        "rgb({}, {}, 0)",
        channel(255.0 - pct * 2.55),
        channel(pct * 2.55)
    )
}

fn format_optional(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}
