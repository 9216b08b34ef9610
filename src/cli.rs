//! CLI definition and dispatch.

use chrono::Local;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::assigner::{FixedAssigner, PendingAssigner, PromptAssigner};
use crate::adapters::console_report_adapter::ConsoleReportAdapter;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_report_adapter::HtmlReportAdapter;
use crate::adapters::json_cache_adapter::{JsonCacheAdapter, TIMESTAMP_FORMAT};
use crate::domain::config_validation::{validate_config, SOURCE_CSV, SOURCE_IBKR};
use crate::domain::error::RiskboardError;
use crate::domain::portfolio::{update_portfolio, Portfolio, RefreshOutcome};
use crate::domain::price_history::PriceHistory;
use crate::domain::risk::TRADING_DAYS_PER_YEAR;
use crate::domain::strategy::Strategy;
use crate::domain::summary::{summarize, SummaryRow};
use crate::logging;
use crate::ports::assigner_port::StrategyAssigner;
use crate::ports::broker_port::BrokerPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::{Dashboard, ReportPort};
use crate::ports::store_port::StrategyStore;

/// Console output target understood by [`ConsoleReportAdapter`].
pub const STDOUT: &str = "-";

#[derive(Parser, Debug)]
#[command(name = "riskboard", about = "Portfolio risk dashboard for an Interactive Brokers account")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch holdings once, reconcile strategies and write the dashboard
    Refresh {
        #[arg(short, long)]
        config: PathBuf,
        /// Strategy for a new holding, as TICKER=STRATEGY (repeatable)
        #[arg(long = "assign", value_name = "TICKER=STRATEGY")]
        assign: Vec<String>,
        /// Strategy for new holdings without an explicit assignment
        #[arg(long)]
        default_strategy: Option<String>,
        /// Ask for a strategy for each new holding
        #[arg(long, conflicts_with_all = ["assign", "default_strategy"])]
        interactive: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Refresh repeatedly; new holdings stay pending
    Watch {
        #[arg(short, long)]
        config: PathBuf,
        /// Seconds between refreshes (default: [dashboard] refresh_interval)
        #[arg(long)]
        interval: Option<u64>,
        /// Stop after this many refreshes
        #[arg(long)]
        iterations: Option<u64>,
    },
    /// Inspect or edit cached strategy assignments
    Strategy {
        #[command(subcommand)]
        action: StrategyCommand,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum StrategyCommand {
    /// List cached tickers with their weights and strategies
    List {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Change the strategy of a cached ticker
    Set {
        #[arg(short, long)]
        config: PathBuf,
        ticker: String,
        strategy: String,
    },
    /// Drop a ticker from the cache
    Remove {
        #[arg(short, long)]
        config: PathBuf,
        ticker: String,
    },
}

/// Resolved configuration values.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub client_id: i32,
    pub timeout_secs: u64,
    pub benchmark: String,
    pub duration_days: i64,
    pub trading_days: f64,
    pub refresh_interval: u64,
    pub cache_path: PathBuf,
    pub output: PathBuf,
    pub source: String,
    pub holdings_file: Option<PathBuf>,
    pub prices_dir: Option<PathBuf>,
    pub net_liquidation: Option<f64>,
    pub log_level: String,
    pub log_format: String,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Refresh {
            config,
            assign,
            default_strategy,
            interactive,
            output,
        } => run_refresh(
            &config,
            &assign,
            default_strategy.as_deref(),
            interactive,
            output.as_ref(),
        ),
        Command::Watch {
            config,
            interval,
            iterations,
        } => run_watch(&config, interval, iterations),
        Command::Strategy { action } => match action {
            StrategyCommand::List { config } => run_strategy_list(&config),
            StrategyCommand::Set {
                config,
                ticker,
                strategy,
            } => run_strategy_set(&config, &ticker, &strategy),
            StrategyCommand::Remove { config, ticker } => run_strategy_remove(&config, &ticker),
        },
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: RiskboardError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

/// Load, validate and resolve the config, then install logging.
fn prepare(config_path: &PathBuf) -> Result<Settings, ExitCode> {
    let adapter = load_config(config_path)?;
    validate_config(&adapter).map_err(fail)?;
    let settings = build_settings(&adapter).map_err(fail)?;

    if let Err(e) = logging::init_tracing(&settings.log_level, &settings.log_format) {
        return Err(fail(RiskboardError::ConfigInvalid {
            section: "logging".into(),
            key: "level".into(),
            reason: e,
        }));
    }
    tracing::debug!(config = %config_path.display(), "configuration loaded");
    Ok(settings)
}

pub fn build_settings(config: &dyn ConfigPort) -> Result<Settings, RiskboardError> {
    let port = config.get_int("gateway", "port", 7497);
    let port = u16::try_from(port).map_err(|_| RiskboardError::ConfigInvalid {
        section: "gateway".into(),
        key: "port".into(),
        reason: format!("{} is not a valid port", port),
    })?;
    let client_id = config.get_int("gateway", "client_id", 0);
    let client_id = i32::try_from(client_id).map_err(|_| RiskboardError::ConfigInvalid {
        section: "gateway".into(),
        key: "client_id".into(),
        reason: format!("{} is out of range", client_id),
    })?;

    let non_empty = |section: &str, key: &str| {
        config
            .get_string(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    Ok(Settings {
        host: non_empty("gateway", "host").unwrap_or_else(|| "127.0.0.1".to_string()),
        port,
        client_id,
        timeout_secs: config.get_int("gateway", "timeout_secs", 30).max(1) as u64,
        benchmark: non_empty("market", "benchmark")
            .unwrap_or_else(|| "SPY".to_string())
            .to_uppercase(),
        duration_days: config.get_int("market", "duration_days", 90),
        trading_days: config.get_double("risk", "trading_days", TRADING_DAYS_PER_YEAR),
        refresh_interval: config.get_int("dashboard", "refresh_interval", 120).max(1) as u64,
        cache_path: PathBuf::from(
            non_empty("dashboard", "cache_path")
                .unwrap_or_else(|| "cache/strategy.json".to_string()),
        ),
        output: PathBuf::from(
            non_empty("dashboard", "output").unwrap_or_else(|| "dashboard.html".to_string()),
        ),
        source: non_empty("data", "source")
            .unwrap_or_else(|| SOURCE_CSV.to_string())
            .to_lowercase(),
        holdings_file: non_empty("csv", "holdings_file").map(PathBuf::from),
        prices_dir: non_empty("csv", "prices_dir").map(PathBuf::from),
        net_liquidation: config
            .get_string("csv", "net_liquidation")
            .map(|_| config.get_double("csv", "net_liquidation", 0.0)),
        log_level: non_empty("logging", "level").unwrap_or_else(|| "info".to_string()),
        log_format: non_empty("logging", "format").unwrap_or_else(|| "text".to_string()),
    })
}

pub fn build_broker(settings: &Settings) -> Result<Box<dyn BrokerPort>, RiskboardError> {
    match settings.source.as_str() {
        SOURCE_CSV => {
            let missing = |key: &str| RiskboardError::ConfigMissing {
                section: "csv".into(),
                key: key.into(),
            };
            let holdings = settings
                .holdings_file
                .clone()
                .ok_or_else(|| missing("holdings_file"))?;
            let prices = settings
                .prices_dir
                .clone()
                .ok_or_else(|| missing("prices_dir"))?;

            let mut adapter = CsvAdapter::new(holdings, prices, settings.duration_days);
            if let Some(value) = settings.net_liquidation {
                adapter = adapter.with_net_liquidation(value);
            }
            Ok(Box::new(adapter))
        }
        #[cfg(feature = "ibkr")]
        SOURCE_IBKR => {
            use crate::adapters::ibkr_adapter::{GatewayConfig, IbkrAdapter};

            let config = GatewayConfig {
                host: settings.host.clone(),
                port: settings.port,
                client_id: settings.client_id,
                timeout: Duration::from_secs(settings.timeout_secs),
                duration_days: settings.duration_days.clamp(1, i64::from(u32::MAX)) as u32,
            };
            Ok(Box::new(IbkrAdapter::connect(config)?))
        }
        #[cfg(not(feature = "ibkr"))]
        SOURCE_IBKR => Err(RiskboardError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: "source 'ibkr' requires the ibkr feature".into(),
        }),
        other => Err(RiskboardError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unknown source '{}'", other),
        }),
    }
}

/// Parse one `TICKER=STRATEGY` pair.
pub fn parse_assignment(pair: &str) -> Result<(String, Strategy), RiskboardError> {
    let invalid = || RiskboardError::InvalidAssignment {
        arg: pair.to_string(),
    };
    let (ticker, strategy) = pair.split_once('=').ok_or_else(invalid)?;
    let ticker = ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(invalid());
    }
    Ok((ticker, strategy.parse()?))
}

/// What one refresh produced.
#[derive(Debug)]
pub struct RefreshReport {
    pub portfolio: Portfolio,
    pub outcome: RefreshOutcome,
    pub summary: Vec<SummaryRow>,
}

/// Load, fetch, reconcile, save, summarise and render.
///
/// A history that fails to load is skipped with a warning; the benchmark
/// failing only drops beta.
pub fn run_refresh_pipeline(
    broker: &dyn BrokerPort,
    store: &dyn StrategyStore,
    assigner: &mut dyn StrategyAssigner,
    settings: &Settings,
    reports: &[(&dyn ReportPort, &str)],
) -> Result<RefreshReport, RiskboardError> {
    let mut portfolio = store.load();

    let snapshot = broker.account_snapshot()?;
    let weights = snapshot.weights()?;

    let mut histories: BTreeMap<String, PriceHistory> = BTreeMap::new();
    for (symbol, weight) in &weights {
        if *weight == 0.0 {
            continue;
        }
        match broker.price_history(symbol) {
            Ok(history) => {
                histories.insert(symbol.clone(), history);
            }
            Err(e) => tracing::warn!(symbol = %symbol, error = %e, "skipping price history"),
        }
    }

    let benchmark = match broker.benchmark_history(&settings.benchmark) {
        Ok(history) => Some(history),
        Err(e) => {
            tracing::warn!(benchmark = %settings.benchmark, error = %e, "benchmark unavailable, beta disabled");
            None
        }
    };

    let now = Local::now().naive_local();
    let outcome = update_portfolio(&mut portfolio, &weights, &histories, assigner, now);
    store.save(&mut portfolio)?;

    let summary = summarize(&portfolio, benchmark.as_ref(), settings.trading_days);

    let dashboard = Dashboard {
        portfolio: &portfolio,
        summary: &summary,
        pending: &outcome.pending,
        generated_at: now,
        refresh_interval_secs: settings.refresh_interval,
    };
    for (report, path) in reports {
        report.write(&dashboard, path)?;
    }

    tracing::info!(
        holdings = portfolio.entries().len(),
        added = outcome.added.len(),
        removed = outcome.removed.len(),
        pending = outcome.pending.len(),
        "refresh complete"
    );

    Ok(RefreshReport {
        portfolio,
        outcome,
        summary,
    })
}

fn refresh_once(
    broker: &dyn BrokerPort,
    assigner: &mut dyn StrategyAssigner,
    settings: &Settings,
    output: &str,
) -> Result<RefreshReport, RiskboardError> {
    let store = JsonCacheAdapter::new(settings.cache_path.clone());
    let console = ConsoleReportAdapter::new();
    let html = HtmlReportAdapter::new();
    let reports: [(&dyn ReportPort, &str); 2] = [(&console, STDOUT), (&html, output)];
    run_refresh_pipeline(broker, &store, assigner, settings, &reports)
}

fn run_refresh(
    config_path: &PathBuf,
    assign: &[String],
    default_strategy: Option<&str>,
    interactive: bool,
    output_override: Option<&PathBuf>,
) -> ExitCode {
    let settings = match prepare(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let mut assigner: Box<dyn StrategyAssigner> = if interactive {
        Box::new(PromptAssigner::new(std::io::stdin().lock(), std::io::stdout()))
    } else {
        let mut assignments = BTreeMap::new();
        for pair in assign {
            match parse_assignment(pair) {
                Ok((ticker, strategy)) => {
                    assignments.insert(ticker, strategy);
                }
                Err(e) => return fail(e),
            }
        }
        let default = match default_strategy.map(str::parse::<Strategy>).transpose() {
            Ok(d) => d,
            Err(e) => return fail(e),
        };
        Box::new(FixedAssigner::new(assignments, default))
    };

    let broker = match build_broker(&settings) {
        Ok(b) => b,
        Err(e) => return fail(e),
    };

    let output = output_override.unwrap_or(&settings.output);
    let output = output.to_string_lossy();
    match refresh_once(broker.as_ref(), assigner.as_mut(), &settings, &output) {
        Ok(report) => {
            if !report.outcome.pending.is_empty() {
                eprintln!(
                    "{} holding(s) awaiting a strategy: {} (use --assign or --interactive)",
                    report.outcome.pending.len(),
                    report.outcome.pending.join(", ")
                );
            }
            eprintln!("Dashboard written to: {}", output);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_watch(config_path: &PathBuf, interval: Option<u64>, iterations: Option<u64>) -> ExitCode {
    let settings = match prepare(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let broker = match build_broker(&settings) {
        Ok(b) => b,
        Err(e) => return fail(e),
    };

    let interval = Duration::from_secs(interval.unwrap_or(settings.refresh_interval).max(1));
    let output = settings.output.to_string_lossy().into_owned();
    let mut assigner = PendingAssigner;
    let mut completed: u64 = 0;

    loop {
        match refresh_once(broker.as_ref(), &mut assigner, &settings, &output) {
            Ok(report) => {
                if !report.outcome.pending.is_empty() {
                    tracing::warn!(
                        pending = %report.outcome.pending.join(", "),
                        "holdings awaiting a strategy; run `refresh --assign` to add them"
                    );
                }
            }
            Err(e) => tracing::error!(error = %e, "refresh failed"),
        }

        completed += 1;
        if iterations.is_some_and(|n| completed >= n) {
            break;
        }
        std::thread::sleep(interval);
    }

    ExitCode::SUCCESS
}

fn run_strategy_list(config_path: &PathBuf) -> ExitCode {
    let settings = match prepare(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let portfolio = JsonCacheAdapter::new(settings.cache_path.clone()).load();
    if portfolio.is_empty() {
        eprintln!("No cached strategies in {}", settings.cache_path.display());
        return ExitCode::SUCCESS;
    }

    println!("{:<10} {:<10} {:>9}", "Ticker", "Strategy", "Weight");
    for (ticker, entry) in portfolio.entries() {
        println!(
            "{:<10} {:<10} {:>8.2}%",
            ticker,
            entry.strategy.name(),
            entry.weight * 100.0
        );
    }
    if let Some(saved) = portfolio.last_saved_time() {
        eprintln!("Last saved: {}", saved.format(TIMESTAMP_FORMAT));
    }
    ExitCode::SUCCESS
}

/// Set one cached ticker's strategy and save.
pub fn set_cached_strategy(
    store: &dyn StrategyStore,
    ticker: &str,
    strategy: &str,
) -> Result<Strategy, RiskboardError> {
    let strategy: Strategy = strategy.parse()?;
    let ticker = ticker.trim().to_uppercase();

    let mut portfolio = store.load();
    if !portfolio.update_stock(&ticker, None, Some(strategy)) {
        return Err(RiskboardError::UnknownTicker { ticker });
    }
    store.save(&mut portfolio)?;
    tracing::info!(ticker = %ticker, strategy = %strategy, "strategy updated");
    Ok(strategy)
}

/// Drop one cached ticker and save.
pub fn remove_cached_ticker(store: &dyn StrategyStore, ticker: &str) -> Result<(), RiskboardError> {
    let ticker = ticker.trim().to_uppercase();

    let mut portfolio = store.load();
    if portfolio.remove_stock(&ticker).is_none() {
        return Err(RiskboardError::UnknownTicker { ticker });
    }
    store.save(&mut portfolio)?;
    tracing::info!(ticker = %ticker, "removed from cache");
    Ok(())
}

fn run_strategy_set(config_path: &PathBuf, ticker: &str, strategy: &str) -> ExitCode {
    let settings = match prepare(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let store = JsonCacheAdapter::new(settings.cache_path);
    match set_cached_strategy(&store, ticker, strategy) {
        Ok(strategy) => {
            eprintln!("{} set to {}", ticker.trim().to_uppercase(), strategy);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_strategy_remove(config_path: &PathBuf, ticker: &str) -> ExitCode {
    let settings = match prepare(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let store = JsonCacheAdapter::new(settings.cache_path);
    match remove_cached_ticker(&store, ticker) {
        Ok(()) => {
            eprintln!("{} removed", ticker.trim().to_uppercase());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        return fail(e);
    }
    match build_settings(&adapter) {
        Ok(settings) => {
            eprintln!("  source:    {}", settings.source);
            eprintln!("  benchmark: {}", settings.benchmark);
            eprintln!("  cache:     {}", settings.cache_path.display());
            eprintln!("  output:    {}", settings.output.display());
            eprintln!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}
