//! Pricing abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single trading day's closing price. `close` is `None` when the provider
/// reported the day without a usable value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: Option<f64>,
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Close price of the most recent trading day.
    async fn fetch_latest_close(&self, symbol: &str) -> Result<f64>;

    /// Daily closes over the trailing `days` calendar days, oldest first.
    async fn fetch_daily_closes(&self, symbol: &str, days: u32) -> Result<Vec<DailyClose>>;
}
