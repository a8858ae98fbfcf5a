//! Valuation signal classifier
//!
//! Maps PE and PB onto one of five discrete signals. Rules are evaluated in
//! priority order and the first match wins. The composite health score is
//! not an input: valuation and health are reported side by side.

use crate::config::SignalConfig;
use crate::error::FundamentalsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discrete valuation signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Signal {
    #[serde(alias = "低估")]
    Undervalued,
    #[serde(alias = "低價")]
    LowPrice,
    #[serde(alias = "中等")]
    Medium,
    #[serde(alias = "過熱")]
    Overheated,
    #[serde(alias = "觀望")]
    Watch,
}

impl Signal {
    pub const ALL: [Signal; 5] = [
        Signal::Undervalued,
        Signal::LowPrice,
        Signal::Medium,
        Signal::Overheated,
        Signal::Watch,
    ];

    /// Display label used by the presentation layer
    pub fn label(&self) -> &'static str {
        match self {
            Signal::Undervalued => "低估",
            Signal::LowPrice => "低價",
            Signal::Medium => "中等",
            Signal::Overheated => "過熱",
            Signal::Watch => "觀望",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Undervalued => write!(f, "Undervalued"),
            Signal::LowPrice => write!(f, "LowPrice"),
            Signal::Medium => write!(f, "Medium"),
            Signal::Overheated => write!(f, "Overheated"),
            Signal::Watch => write!(f, "Watch"),
        }
    }
}

impl FromStr for Signal {
    type Err = FundamentalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Signal::ALL
            .into_iter()
            .find(|signal| {
                signal.label() == s || signal.to_string().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| FundamentalsError::ParseError(format!("unknown signal: {}", s)))
    }
}

/// Signal classifier
#[derive(Debug, Clone, Default)]
pub struct SignalClassifier {
    config: SignalConfig,
}

impl SignalClassifier {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    /// Classify a company by its valuation ratios
    pub fn classify(&self, pe_ttm: Option<f64>, pb_ratio: Option<f64>) -> Signal {
        let c = &self.config;
        let pe = match pe_ttm.filter(|v| v.is_finite()) {
            Some(pe) if pe > 0.0 => pe,
            _ => return Signal::Watch,
        };
        let pb = pb_ratio.filter(|v| v.is_finite());
        let pb_below = |limit: f64| pb.map_or(false, |pb| pb < limit);

        if pe < c.undervalued_pe && pb_below(c.undervalued_pb) {
            Signal::Undervalued
        } else if pe < c.low_price_pe && pb_below(c.low_price_pb) {
            Signal::LowPrice
        } else if pe <= c.medium_pe_max {
            Signal::Medium
        } else {
            Signal::Overheated
        }
    }
}
