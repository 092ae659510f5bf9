//! Investment strategies and the tickers each one buys

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Strategy {
    Ethical,
    Growth,
    Index,
    Quality,
    Value,
}

impl Strategy {
    /// All strategies in display order.
    pub const ALL: [Strategy; 5] = [
        Strategy::Ethical,
        Strategy::Growth,
        Strategy::Index,
        Strategy::Quality,
        Strategy::Value,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Ethical => "Ethical Investing",
            Strategy::Growth => "Growth Investing",
            Strategy::Index => "Index Investing",
            Strategy::Quality => "Quality Investing",
            Strategy::Value => "Value Investing",
        }
    }

    pub fn tickers(&self) -> &'static [&'static str] {
        match self {
            Strategy::Ethical => &["AAPL", "ADBE", "NSRGY"],
            Strategy::Growth => &["AMZN", "TSLA", "NVDA"],
            Strategy::Index => &["VTI", "IXUS", "ILTB"],
            Strategy::Quality => &["JNJ", "PG", "DIS"],
            Strategy::Value => &["IBM", "JPM", "WMT"],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Strategy::Ethical => {
                "Ethical Investing focuses on companies that demonstrate ethical practices."
            }
            Strategy::Growth => {
                "Growth Investing targets companies expected to grow faster than the market."
            }
            Strategy::Index => "Index Investing tracks broad market indices with low-cost funds.",
            Strategy::Quality => {
                "Quality Investing favours companies with durable earnings and strong balance sheets."
            }
            Strategy::Value => {
                "Value Investing looks for established companies trading below their intrinsic worth."
            }
        }
    }

    fn short_name(&self) -> &'static str {
        match self {
            Strategy::Ethical => "ethical",
            Strategy::Growth => "growth",
            Strategy::Index => "index",
            Strategy::Quality => "quality",
            Strategy::Value => "value",
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    /// Accepts "Quality Investing", "quality" or "quality-investing", ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        Strategy::ALL
            .into_iter()
            .find(|strategy| {
                normalized == strategy.short_name() || normalized == strategy.name().to_lowercase()
            })
            .ok_or_else(|| anyhow::anyhow!("Unknown investment strategy: {}", s))
    }
}

/// Concatenates the tickers of each strategy in selection order.
///
/// A ticker held by two selected strategies appears twice.
pub fn resolve(strategies: &[Strategy]) -> Vec<String> {
    strategies
        .iter()
        .flat_map(|strategy| strategy.tickers().iter().map(|t| t.to_string()))
        .collect()
}
