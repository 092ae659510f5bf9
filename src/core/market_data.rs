//! Fault-tolerant price fetching on top of a [`PriceProvider`].
//!
//! Fetch failures never escape this module. They become absent prices plus a
//! [`Notice`] the caller can surface to the user.

use crate::core::notice::Notice;
use crate::core::price::{DailyClose, PriceProvider};
use chrono::{Days, NaiveDate};
use tracing::{debug, warn};

/// The value of a fetch together with the warning raised while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub warning: Option<Notice>,
}

impl<T> Fetched<T> {
    fn ok(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    fn failed(value: T, warning: Notice) -> Self {
        Self {
            value,
            warning: Some(warning),
        }
    }
}

/// Daily closes ordered oldest first, keyed by calendar date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CloseSeries {
    points: Vec<DailyClose>,
}

impl CloseSeries {
    pub fn new(mut points: Vec<DailyClose>) -> Self {
        points.sort_by_key(|p| p.date);
        Self { points }
    }

    /// A series of `days` consecutive dates ending at `as_of`, every close absent.
    pub fn absent(days: u32, as_of: NaiveDate) -> Self {
        let points = (0..days)
            .rev()
            .filter_map(|offset| as_of.checked_sub_days(Days::new(u64::from(offset))))
            .map(|date| DailyClose { date, close: None })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[DailyClose] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_all_absent(&self) -> bool {
        self.points.iter().all(|p| p.close.is_none())
    }

    /// The most recent close that is present.
    pub fn latest(&self) -> Option<f64> {
        self.points.iter().rev().find_map(|p| p.close)
    }
}

pub async fn fetch_latest_close(
    provider: &(dyn PriceProvider + Send + Sync),
    ticker: &str,
) -> Fetched<Option<f64>> {
    match provider.fetch_latest_close(ticker).await {
        Ok(price) => {
            debug!("Latest close for {}: {}", ticker, price);
            Fetched::ok(Some(price))
        }
        Err(e) => {
            warn!(ticker, error = %e, "Latest close unavailable");
            Fetched::failed(None, Notice::fetch_failed(ticker, &e))
        }
    }
}

pub async fn fetch_recent_closes(
    provider: &(dyn PriceProvider + Send + Sync),
    ticker: &str,
    days: u32,
    as_of: NaiveDate,
) -> Fetched<CloseSeries> {
    let result = provider
        .fetch_daily_closes(ticker, days)
        .await
        .and_then(|points| {
            if points.is_empty() {
                anyhow::bail!("No price history returned for {}", ticker);
            }
            Ok(CloseSeries::new(points))
        });

    match result {
        Ok(series) => {
            debug!("Fetched {} daily closes for {}", series.len(), ticker);
            Fetched::ok(series)
        }
        Err(e) => {
            warn!(ticker, error = %e, "Price history unavailable");
            Fetched::failed(
                CloseSeries::absent(days, as_of),
                Notice::fetch_failed(ticker, &e),
            )
        }
    }
}
