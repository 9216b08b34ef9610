//! Refresh pipeline tests against a mock broker and in-memory cache.
//!
//! Tests cover:
//! - First refresh assigning strategies and saving the cache
//! - Reconciliation on later refreshes (weight updates, sold holdings)
//! - Pending holdings and zero-weight positions
//! - Partial data: failed histories and a missing benchmark
//! - Broker failures surfacing as errors
//! - Rendered dashboards

mod common;

use approx::assert_relative_eq;
use common::*;
use riskboard::adapters::assigner::{FixedAssigner, PendingAssigner};
use riskboard::adapters::html_report_adapter::HtmlReportAdapter;
use riskboard::cli::run_refresh_pipeline;
use riskboard::domain::error::RiskboardError;
use riskboard::domain::portfolio::Portfolio;
use riskboard::domain::strategy::Strategy;
use riskboard::domain::summary::{RUN_UP_HEDGED, TOTAL};
use riskboard::ports::report_port::ReportPort;
use riskboard::ports::store_port::StrategyStore;
use std::collections::BTreeMap;

fn assigner(pairs: &[(&str, Strategy)]) -> FixedAssigner {
    let map: BTreeMap<String, Strategy> = pairs.iter().map(|(t, s)| (t.to_string(), *s)).collect();
    FixedAssigner::new(map, None)
}

fn all_assigned() -> FixedAssigner {
    assigner(&[
        ("NVDA", Strategy::RunUp),
        ("SQQQ", Strategy::Hedge),
        ("KO", Strategy::Hold),
    ])
}

mod full_pipeline {
    use super::*;

    #[test]
    fn first_refresh_assigns_and_saves() {
        let broker = sample_broker();
        let store = MemoryStore::default();
        let settings = sample_settings();

        let report =
            run_refresh_pipeline(&broker, &store, &mut all_assigned(), &settings, &[]).unwrap();

        let mut added = report.outcome.added.clone();
        added.sort();
        assert_eq!(
            added,
            vec![
                ("KO".to_string(), Strategy::Hold),
                ("NVDA".to_string(), Strategy::RunUp),
                ("SQQQ".to_string(), Strategy::Hedge),
            ]
        );
        assert!(report.outcome.pending.is_empty());
        assert_eq!(store.saves.get(), 1);

        let saved = store.load();
        assert_relative_eq!(saved.entry("NVDA").unwrap().weight, 0.30);
        assert_relative_eq!(saved.entry("KO").unwrap().weight, 0.20);
        assert!(saved.last_saved_time().is_some());
    }

    #[test]
    fn summary_rows_follow_strategy_groups() {
        let broker = sample_broker();
        let store = MemoryStore::default();
        let report = run_refresh_pipeline(
            &broker,
            &store,
            &mut all_assigned(),
            &sample_settings(),
            &[],
        )
        .unwrap();

        let labels: Vec<&str> = report.summary.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Run-up", "Hold", RUN_UP_HEDGED, TOTAL]);

        let total = report.summary.last().unwrap();
        assert_relative_eq!(total.summed_weight, 0.55, epsilon = 1e-12);
        assert!(total.volatility.unwrap() > 0.0);
        assert!(total.beta.is_some());

        let hedged = &report.summary[2];
        assert_relative_eq!(hedged.summed_weight, 0.35, epsilon = 1e-12);
        assert!(hedged.volatility.unwrap() < report.summary[0].volatility.unwrap());
    }

    #[test]
    fn requests_history_for_each_holding_and_benchmark() {
        let broker = sample_broker();
        let store = MemoryStore::default();
        run_refresh_pipeline(
            &broker,
            &store,
            &mut all_assigned(),
            &sample_settings(),
            &[],
        )
        .unwrap();

        let mut requested = broker.history_requests.borrow().clone();
        requested.sort();
        assert_eq!(requested, vec!["KO", "NVDA", "SPY", "SQQQ"]);
    }
}

mod reconciliation {
    use super::*;

    fn cached() -> Portfolio {
        let mut p = Portfolio::new();
        p.add_stock("NVDA", 0.10, Strategy::Long);
        p.add_stock("AAPL", 0.25, Strategy::Hold);
        p
    }

    #[test]
    fn cached_strategy_kept_and_weight_refreshed() {
        let broker = sample_broker();
        let store = MemoryStore::with_portfolio(cached());
        let report = run_refresh_pipeline(
            &broker,
            &store,
            &mut all_assigned(),
            &sample_settings(),
            &[],
        )
        .unwrap();

        let nvda = report.portfolio.entry("NVDA").unwrap();
        assert_eq!(nvda.strategy, Strategy::Long);
        assert_relative_eq!(nvda.weight, 0.30);
        assert_eq!(report.outcome.updated, vec!["NVDA"]);
    }

    #[test]
    fn sold_holding_is_removed() {
        let broker = sample_broker();
        let store = MemoryStore::with_portfolio(cached());
        let report = run_refresh_pipeline(
            &broker,
            &store,
            &mut all_assigned(),
            &sample_settings(),
            &[],
        )
        .unwrap();

        assert_eq!(report.outcome.removed, vec!["AAPL"]);
        assert!(!store.load().contains("AAPL"));
    }

    #[test]
    fn new_holding_without_strategy_stays_pending() {
        let broker = sample_broker();
        let store = MemoryStore::default();
        let report = run_refresh_pipeline(
            &broker,
            &store,
            &mut assigner(&[("NVDA", Strategy::RunUp)]),
            &sample_settings(),
            &[],
        )
        .unwrap();

        assert_eq!(report.outcome.pending, vec!["KO", "SQQQ"]);
        assert!(report.portfolio.contains("NVDA"));
        assert!(!report.portfolio.contains("KO"));

        // Assigned on a later refresh.
        let report = run_refresh_pipeline(
            &broker,
            &store,
            &mut assigner(&[("KO", Strategy::Hold), ("SQQQ", Strategy::Hedge)]),
            &sample_settings(),
            &[],
        )
        .unwrap();
        assert!(report.outcome.pending.is_empty());
        assert_eq!(report.portfolio.entries().len(), 3);
    }

    #[test]
    fn pending_assigner_adds_nothing() {
        let broker = sample_broker();
        let store = MemoryStore::default();
        let report = run_refresh_pipeline(
            &broker,
            &store,
            &mut PendingAssigner,
            &sample_settings(),
            &[],
        )
        .unwrap();
        assert!(report.portfolio.is_empty());
        assert_eq!(report.outcome.pending.len(), 3);
    }

    #[test]
    fn zero_weight_position_counts_as_sold() {
        let broker = sample_broker().with_stock("AAPL", 0.0);
        let store = MemoryStore::with_portfolio(cached());
        let report = run_refresh_pipeline(
            &broker,
            &store,
            &mut all_assigned(),
            &sample_settings(),
            &[],
        )
        .unwrap();

        assert_eq!(report.outcome.removed, vec!["AAPL"]);
        assert!(!broker.history_requests.borrow().contains(&"AAPL".to_string()));
    }
}

mod partial_data {
    use super::*;

    #[test]
    fn failed_history_is_skipped() {
        let broker = sample_broker().with_error("KO", "pacing violation");
        let store = MemoryStore::default();
        let report = run_refresh_pipeline(
            &broker,
            &store,
            &mut all_assigned(),
            &sample_settings(),
            &[],
        )
        .unwrap();

        assert!(report.portfolio.contains("KO"));
        assert_eq!(report.outcome.missing_history, vec!["KO"]);

        let hold = report.summary.iter().find(|r| r.label == "Hold").unwrap();
        assert!(hold.volatility.is_none());
        assert!(hold.beta.is_none());

        let run_up = report.summary.iter().find(|r| r.label == "Run-up").unwrap();
        assert!(run_up.volatility.is_some());
    }

    #[test]
    fn missing_benchmark_disables_beta_only() {
        let mut broker = sample_broker();
        broker.histories.remove("SPY");
        let store = MemoryStore::default();
        let report = run_refresh_pipeline(
            &broker,
            &store,
            &mut all_assigned(),
            &sample_settings(),
            &[],
        )
        .unwrap();

        assert!(report.summary.iter().all(|r| r.beta.is_none()));
        assert!(report.summary.iter().all(|r| r.volatility.is_some()));
    }
}

mod failures {
    use super::*;

    #[test]
    fn snapshot_error_propagates() {
        let broker = sample_broker().failing_snapshot("not connected");
        let store = MemoryStore::default();
        let result = run_refresh_pipeline(
            &broker,
            &store,
            &mut all_assigned(),
            &sample_settings(),
            &[],
        );
        assert!(matches!(result, Err(RiskboardError::Broker { .. })));
        assert_eq!(store.saves.get(), 0);
    }

    #[test]
    fn empty_account_is_no_holdings() {
        let broker = MockBroker::new(100_000.0);
        let store = MemoryStore::default();
        let result = run_refresh_pipeline(
            &broker,
            &store,
            &mut all_assigned(),
            &sample_settings(),
            &[],
        );
        assert!(matches!(result, Err(RiskboardError::NoHoldings)));
    }

    #[test]
    fn zero_net_liquidation_is_rejected() {
        let broker = MockBroker::new(0.0).with_stock("KO", 1_000.0);
        let store = MemoryStore::default();
        let result = run_refresh_pipeline(
            &broker,
            &store,
            &mut all_assigned(),
            &sample_settings(),
            &[],
        );
        assert!(matches!(
            result,
            Err(RiskboardError::InvalidNetLiquidation { .. })
        ));
    }
}

mod reports {
    use super::*;

    #[test]
    fn html_dashboard_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.html");
        let path_str = path.to_str().unwrap();

        let broker = sample_broker();
        let store = MemoryStore::default();
        let html = HtmlReportAdapter::new();
        let reports: [(&dyn ReportPort, &str); 1] = [(&html, path_str)];

        run_refresh_pipeline(
            &broker,
            &store,
            &mut assigner(&[("NVDA", Strategy::RunUp), ("SQQQ", Strategy::Hedge)]),
            &sample_settings(),
            &reports,
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("content=\"120\""));
        assert!(content.contains("Current Portfolio"));
        assert!(content.contains(">NVDA<"));
        assert!(content.contains("30.00%"));
        assert!(content.contains("Awaiting Strategy"));
        assert!(content.contains("<li>KO</li>"));
        assert!(content.contains(RUN_UP_HEDGED));
    }
}
