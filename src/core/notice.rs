use crate::core::strategy::Strategy;
use std::fmt::Display;

/// A non-fatal problem met while building an allocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The provider could not deliver prices for a ticker.
    FetchFailed { ticker: String, reason: String },
    /// Prices arrived but none can be used to buy shares.
    UnusablePrice { ticker: String, price: Option<f64> },
    /// The selection exceeded the allowed number of strategies.
    SelectionTruncated {
        kept: Vec<Strategy>,
        dropped: Vec<Strategy>,
    },
}

impl Notice {
    pub fn fetch_failed(ticker: &str, error: &anyhow::Error) -> Self {
        Notice::FetchFailed {
            ticker: ticker.to_string(),
            reason: error.to_string(),
        }
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::FetchFailed { ticker, reason } => {
                write!(f, "Error fetching data for {ticker}: {reason}")
            }
            Notice::UnusablePrice {
                ticker,
                price: Some(price),
            } => write!(f, "Skipping {ticker}: unusable price {price}"),
            Notice::UnusablePrice {
                ticker,
                price: None,
            } => write!(f, "Skipping {ticker}: no price available"),
            Notice::SelectionTruncated { kept, dropped } => {
                let names = |list: &[Strategy]| {
                    list.iter()
                        .map(Strategy::name)
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                write!(
                    f,
                    "Please select no more than {} strategies. Using {}; ignoring {}",
                    kept.len(),
                    names(kept.as_slice()),
                    names(dropped.as_slice())
                )
            }
        }
    }
}
