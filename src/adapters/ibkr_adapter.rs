//! Interactive Brokers gateway adapter (TWS API via `ibapi`).
//!
//! The `ibapi` client is async; the adapter owns a tokio runtime and blocks
//! on each request so `BrokerPort` stays synchronous.

use std::time::Duration;

use chrono::NaiveDate;
use futures::StreamExt;
use ibapi::accounts::AccountUpdate;
use ibapi::contracts::{Contract, SecurityType as IbSecurityType};
use ibapi::market_data::historical::{BarSize, ToDuration, TradingHours, WhatToShow};
use tokio::runtime::Runtime;

use crate::domain::error::RiskboardError;
use crate::domain::holding::{AccountSnapshot, Position, SecurityType};
use crate::domain::price_history::PriceHistory;
use crate::ports::broker_port::BrokerPort;

const NET_LIQUIDATION_KEY: &str = "NetLiquidation";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub client_id: i32,
    pub timeout: Duration,
    pub duration_days: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7497,
            client_id: 0,
            timeout: Duration::from_secs(30),
            duration_days: 90,
        }
    }
}

impl GatewayConfig {
    pub fn connection_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub struct IbkrAdapter {
    config: GatewayConfig,
    runtime: Runtime,
    client: ibapi::Client,
}

fn broker_error(context: &str, err: impl std::fmt::Display) -> RiskboardError {
    RiskboardError::Broker {
        reason: format!("{}: {}", context, err),
    }
}

impl IbkrAdapter {
    pub fn connect(config: GatewayConfig) -> Result<Self, RiskboardError> {
        let runtime = Runtime::new()?;
        let url = config.connection_url();
        tracing::info!(url = %url, client_id = config.client_id, "connecting to IB gateway");

        let client = runtime
            .block_on(async {
                tokio::time::timeout(config.timeout, ibapi::Client::connect(&url, config.client_id))
                    .await
            })
            .map_err(|_| broker_error("connect", "timed out"))?
            .map_err(|e| broker_error("connect", e))?;

        tracing::info!("connected to IB gateway");
        Ok(Self {
            config,
            runtime,
            client,
        })
    }

    async fn collect_account(&self, account: &str, snapshot: &mut AccountSnapshot) -> Result<(), RiskboardError> {
        let mut updates = self
            .client
            .account_updates(&account.into())
            .await
            .map_err(|e| broker_error("account updates", e))?;

        while let Some(update) = updates.next().await {
            match update.map_err(|e| broker_error("account updates", e))? {
                AccountUpdate::AccountValue(value) if value.key == NET_LIQUIDATION_KEY => {
                    match value.value.parse::<f64>() {
                        Ok(v) => snapshot.net_liquidation = v,
                        Err(e) => tracing::warn!(value = %value.value, error = %e, "unparseable net liquidation"),
                    }
                }
                AccountUpdate::PortfolioValue(p) => {
                    let security_type = match p.contract.security_type {
                        IbSecurityType::Stock => SecurityType::Stock,
                        ref other => SecurityType::Other(format!("{:?}", other)),
                    };
                    snapshot.record_position(Position {
                        symbol: p.contract.symbol.to_string(),
                        security_type,
                        currency: p.contract.currency.to_string(),
                        market_value: p.market_value,
                    });
                }
                AccountUpdate::End => break,
                _ => {}
            }
        }
        Ok(())
    }

    async fn fetch_snapshot(&self) -> Result<AccountSnapshot, RiskboardError> {
        let accounts = self
            .client
            .managed_accounts()
            .await
            .map_err(|e| broker_error("managed accounts", e))?;

        let mut snapshot = AccountSnapshot::default();
        for account in &accounts {
            tracing::debug!(account = %account, "requesting account updates");
            self.collect_account(account, &mut snapshot).await?;
        }
        Ok(snapshot)
    }

    async fn fetch_history(&self, symbol: &str) -> Result<PriceHistory, RiskboardError> {
        let contract = Contract::stock(symbol);
        let data = self
            .client
            .historical_data(
                &contract,
                None,
                self.config.duration_days.days(),
                BarSize::Day,
                WhatToShow::Trades,
                TradingHours::Extended,
            )
            .await
            .map_err(|e| broker_error(&format!("historical data for {}", symbol), e))?;

        let mut history = PriceHistory::new();
        for bar in &data.bars {
            let date = NaiveDate::from_ymd_opt(
                bar.date.year(),
                u32::from(u8::from(bar.date.month())),
                u32::from(bar.date.day()),
            );
            if let Some(date) = date {
                history.insert(date, bar.close);
            }
        }

        if history.is_empty() {
            return Err(RiskboardError::NoData {
                symbol: symbol.to_string(),
            });
        }
        Ok(history)
    }
}

impl BrokerPort for IbkrAdapter {
    fn account_snapshot(&self) -> Result<AccountSnapshot, RiskboardError> {
        let snapshot = self
            .runtime
            .block_on(async { tokio::time::timeout(self.config.timeout, self.fetch_snapshot()).await })
            .map_err(|_| broker_error("account updates", "timed out waiting for account download"))??;

        tracing::info!(
            positions = snapshot.positions.len(),
            net_liquidation = snapshot.net_liquidation,
            "received account snapshot"
        );
        Ok(snapshot)
    }

    fn price_history(&self, symbol: &str) -> Result<PriceHistory, RiskboardError> {
        self.runtime
            .block_on(async { tokio::time::timeout(self.config.timeout, self.fetch_history(symbol)).await })
            .map_err(|_| broker_error(&format!("historical data for {}", symbol), "timed out"))?
    }
}
