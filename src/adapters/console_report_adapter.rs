//! Plain-text dashboard for the terminal.

use std::fmt::Write as _;
use std::fs;

use crate::domain::error::RiskboardError;
use crate::ports::report_port::{Dashboard, ReportPort};

pub struct ConsoleReportAdapter;

impl ConsoleReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, dashboard: &Dashboard<'_>) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Strategy Summary");
        let _ = writeln!(
            out,
            "{:<16} {:>8} {:>11} {:>8}",
            "Strategy", "Weights", "Volatility", "Beta"
        );
        let _ = writeln!(out, "{}", "-".repeat(46));
        for row in dashboard.summary {
            let _ = writeln!(
                out,
                "{:<16} {:>8.2} {:>11} {:>8}",
                row.label,
                row.summed_weight,
                optional(row.volatility),
                optional(row.beta)
            );
        }

        let mut holdings: Vec<_> = dashboard.portfolio.entries().iter().collect();
        holdings.sort_by(|a, b| b.1.weight.total_cmp(&a.1.weight).then_with(|| a.0.cmp(b.0)));

        let _ = writeln!(out);
        let _ = writeln!(out, "Current Portfolio");
        let _ = writeln!(out, "{:<10} {:<10} {:>9}", "Ticker", "Strategy", "Weight");
        let _ = writeln!(out, "{}", "-".repeat(31));
        for (ticker, entry) in holdings {
            let _ = writeln!(
                out,
                "{:<10} {:<10} {:>8.2}%",
                ticker,
                entry.strategy.name(),
                entry.weight * 100.0
            );
        }

        if !dashboard.pending.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Awaiting Strategy: {}", dashboard.pending.join(", "));
        }

        let refreshed = dashboard
            .portfolio
            .last_refresh_time()
            .unwrap_or(dashboard.generated_at);
        let _ = writeln!(out);
        let _ = writeln!(out, "Last Refresh: {}", refreshed.format("%Y-%m-%d %H:%M:%S"));
        out
    }
}

impl Default for ConsoleReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for ConsoleReportAdapter {
    /// `-` prints to stdout; anything else is a file path.
    fn write(&self, dashboard: &Dashboard<'_>, output_path: &str) -> Result<(), RiskboardError> {
        let text = self.render(dashboard);
        if output_path == "-" {
            print!("{}", text);
        } else {
            fs::write(output_path, text)?;
        }
        Ok(())
    }
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::portfolio::Portfolio;
    use crate::domain::strategy::Strategy;
    use crate::domain::summary::SummaryRow;
    use chrono::NaiveDate;

    #[test]
    fn render_lists_summary_and_holdings() {
        let mut portfolio = Portfolio::new();
        portfolio.add_stock("KO", 0.1, Strategy::Hold);
        portfolio.add_stock("NVDA", 0.3, Strategy::RunUp);
        let rows = vec![SummaryRow {
            label: "Total".to_string(),
            summed_weight: 0.4,
            volatility: Some(0.2051),
            beta: None,
        }];
        let pending = vec!["TSLA".to_string(), "AMD".to_string()];
        let dashboard = Dashboard {
            portfolio: &portfolio,
            summary: &rows,
            pending: &pending,
            generated_at: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            refresh_interval_secs: 120,
        };

        let text = ConsoleReportAdapter::new().render(&dashboard);
        assert!(text.contains("0.21"));
        assert!(text.contains("n/a"));
        assert!(text.contains("30.00%"));
        assert!(text.contains("Awaiting Strategy: TSLA, AMD"));
        assert!(text.contains("Last Refresh: 2024-05-01 12:00:00"));
        assert!(text.find("NVDA").unwrap() < text.find("KO ").unwrap());
    }
}
