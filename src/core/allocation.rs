//! Equal-weight allocation of an investment across the tickers of the
//! selected strategies.
//!
//! [`allocate`] is the whole boundary: a request goes in, an [`Allocation`]
//! comes out. Fetch failures do not fail the allocation; they drop the ticker
//! and leave a [`Notice`] behind.

use crate::core::market_data::{self, CloseSeries};
use crate::core::notice::Notice;
use crate::core::price::PriceProvider;
use crate::core::strategy::{self, Strategy};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Most strategies a single allocation combines.
pub const MAX_STRATEGIES: usize = 2;

/// Calendar days of closes fetched in history mode. The oldest day only
/// anchors the window and is dropped from the returned total.
pub const DEFAULT_HISTORY_DAYS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationMode {
    /// Price every ticker at its latest close.
    LatestClose,
    /// Also value the portfolio over the trailing `days` calendar days.
    History { days: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRequest {
    pub investment: f64,
    pub strategies: Vec<Strategy>,
    pub mode: AllocationMode,
    /// Last calendar day of the history window.
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioEntry {
    pub ticker: String,
    pub investment: f64,
    pub price: f64,
    pub shares: f64,
}

/// Allocated tickers in resolution order. A ticker resolved more than once
/// holds the sum of its allocations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Portfolio {
    entries: Vec<PortfolioEntry>,
}

impl Portfolio {
    /// Buys `investment` worth of `ticker` at `price` and returns the shares bought.
    fn buy(&mut self, ticker: &str, investment: f64, price: f64) -> f64 {
        let shares = investment / price;
        match self.entries.iter_mut().find(|e| e.ticker == ticker) {
            Some(entry) => {
                entry.investment += investment;
                entry.shares += shares;
            }
            None => self.entries.push(PortfolioEntry {
                ticker: ticker.to_string(),
                investment,
                price,
                shares,
            }),
        }
        shares
    }

    pub fn get(&self, ticker: &str) -> Option<&PortfolioEntry> {
        self.entries.iter().find(|e| e.ticker == ticker)
    }

    pub fn entries(&self) -> &[PortfolioEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_investment(&self) -> f64 {
        self.entries.iter().map(|e| e.investment).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuePoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Value of one holding (close × shares) on each day it has a close.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetHistory {
    pub ticker: String,
    pub values: Vec<ValuePoint>,
}

impl AssetHistory {
    fn accumulate(&mut self, values: &[ValuePoint]) {
        for point in values {
            match self.values.iter_mut().find(|v| v.date == point.date) {
                Some(existing) => existing.value += point.value,
                None => self.values.push(*point),
            }
        }
        self.values.sort_by_key(|v| v.date);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioHistory {
    pub assets: Vec<AssetHistory>,
    /// Total portfolio value on the most recent days of the window.
    pub total: Vec<ValuePoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// Strategies actually allocated, after truncation.
    pub strategies: Vec<Strategy>,
    /// Tickers the investment was split across, including those later skipped.
    pub tickers: Vec<String>,
    pub investment_per_asset: f64,
    pub portfolio: Portfolio,
    pub history: Option<PortfolioHistory>,
    pub notices: Vec<Notice>,
}

/// Drops repeated strategies and truncates to [`MAX_STRATEGIES`].
pub fn normalize_selection(selected: &[Strategy]) -> Result<(Vec<Strategy>, Option<Notice>)> {
    let mut strategies: Vec<Strategy> = Vec::new();
    for strategy in selected {
        if !strategies.contains(strategy) {
            strategies.push(*strategy);
        }
    }

    if strategies.is_empty() {
        bail!("Please select at least one strategy.");
    }

    if strategies.len() > MAX_STRATEGIES {
        let dropped = strategies.split_off(MAX_STRATEGIES);
        let notice = Notice::SelectionTruncated {
            kept: strategies.clone(),
            dropped,
        };
        return Ok((strategies, Some(notice)));
    }

    Ok((strategies, None))
}

fn is_usable_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Splits `request.investment` evenly across the tickers of the selected
/// strategies and prices each holding.
///
/// The split is fixed before any price is fetched, so a ticker that fails to
/// price leaves the other holdings' investment unchanged. `on_progress` is
/// called once per completed fetch.
pub async fn allocate(
    request: &AllocationRequest,
    provider: &(dyn PriceProvider + Send + Sync),
    on_progress: &(dyn Fn() + Sync),
) -> Result<Allocation> {
    let (strategies, truncated) = normalize_selection(&request.strategies)?;

    if !request.investment.is_finite() || request.investment <= 0.0 {
        bail!(
            "Investment amount must be a positive number, got {}",
            request.investment
        );
    }

    let tickers = strategy::resolve(&strategies);
    if tickers.is_empty() {
        bail!("Selected strategies do not hold any tickers");
    }

    let investment_per_asset = request.investment / tickers.len() as f64;
    info!(
        investment = request.investment,
        tickers = tickers.len(),
        "Allocating {:.2} per asset",
        investment_per_asset
    );

    let mut allocation = Allocation {
        strategies,
        tickers,
        investment_per_asset,
        portfolio: Portfolio::default(),
        history: None,
        notices: truncated.into_iter().collect(),
    };

    match request.mode {
        AllocationMode::LatestClose => allocate_latest(&mut allocation, provider, on_progress).await,
        AllocationMode::History { days } => {
            if days < 2 {
                bail!("History window must span at least 2 days, got {}", days);
            }
            allocate_history(&mut allocation, provider, days, request.as_of, on_progress).await;
        }
    }

    Ok(allocation)
}

async fn allocate_latest(
    allocation: &mut Allocation,
    provider: &(dyn PriceProvider + Send + Sync),
    on_progress: &(dyn Fn() + Sync),
) {
    let fetches = allocation.tickers.iter().map(|ticker| async move {
        let fetched = market_data::fetch_latest_close(provider, ticker).await;
        on_progress();
        fetched
    });
    let results = join_all(fetches).await;

    for (ticker, fetched) in allocation.tickers.iter().zip(results) {
        let failed = fetched.warning.is_some();
        allocation.notices.extend(fetched.warning);

        match fetched.value {
            Some(price) if is_usable_price(price) => {
                let shares = allocation
                    .portfolio
                    .buy(ticker, allocation.investment_per_asset, price);
                debug!("Bought {:.4} shares of {} at {:.2}", shares, ticker, price);
            }
            price => {
                if !failed {
                    allocation.notices.push(Notice::UnusablePrice {
                        ticker: ticker.clone(),
                        price,
                    });
                }
            }
        }
    }
}

async fn allocate_history(
    allocation: &mut Allocation,
    provider: &(dyn PriceProvider + Send + Sync),
    days: u32,
    as_of: NaiveDate,
    on_progress: &(dyn Fn() + Sync),
) {
    let fetches = allocation.tickers.iter().map(|ticker| async move {
        let fetched = market_data::fetch_recent_closes(provider, ticker, days, as_of).await;
        on_progress();
        fetched
    });
    let results = join_all(fetches).await;

    // Every day of the window is present before any holding is added.
    let mut total: BTreeMap<NaiveDate, f64> = CloseSeries::absent(days, as_of)
        .points()
        .iter()
        .map(|p| (p.date, 0.0))
        .collect();
    let mut assets: Vec<AssetHistory> = Vec::new();

    for (ticker, fetched) in allocation.tickers.iter().zip(results) {
        let failed = fetched.warning.is_some();
        allocation.notices.extend(fetched.warning);
        let series = fetched.value;

        let price = match series.latest() {
            Some(price) if is_usable_price(price) => price,
            price => {
                if !failed {
                    allocation.notices.push(Notice::UnusablePrice {
                        ticker: ticker.clone(),
                        price,
                    });
                }
                continue;
            }
        };

        let shares = allocation
            .portfolio
            .buy(ticker, allocation.investment_per_asset, price);
        let values: Vec<ValuePoint> = series
            .points()
            .iter()
            .filter_map(|p| {
                p.close.map(|close| ValuePoint {
                    date: p.date,
                    value: close * shares,
                })
            })
            .collect();

        for point in &values {
            *total.entry(point.date).or_insert(0.0) += point.value;
        }

        match assets.iter_mut().find(|a| &a.ticker == ticker) {
            Some(asset) => asset.accumulate(&values),
            None => assets.push(AssetHistory {
                ticker: ticker.clone(),
                values,
            }),
        }
    }

    let keep = days as usize - 1;
    let skip = total.len().saturating_sub(keep);
    let total: Vec<ValuePoint> = total
        .into_iter()
        .skip(skip)
        .map(|(date, value)| ValuePoint { date, value })
        .collect();
    debug!(?total, "Total portfolio value");

    allocation.history = Some(PortfolioHistory { assets, total });
}
