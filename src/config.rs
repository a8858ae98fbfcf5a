//! Engine configuration
//!
//! Every section uses `#[serde(default)]` so a TOML file only needs the
//! values it overrides:
//!
//! ```toml
//! [trend]
//! window_size = 252
//! use_log_scale = true
//!
//! [cbs.weights]
//! valuation = 30.0
//! ```

use crate::error::{FundamentalsError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Linear scoring curve: 100 at `full`, 0 at `zero`, linear in between.
///
/// Direction follows the endpoints, so `full < zero` scores lower values
/// higher (debt ratio, PE) and `full > zero` scores higher values higher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreCurve {
    pub full: f64,
    pub zero: f64,
}

impl ScoreCurve {
    pub const fn new(full: f64, zero: f64) -> Self {
        Self { full, zero }
    }

    /// Map a raw value onto [0, 100]
    pub fn score(&self, value: f64) -> f64 {
        let span = self.full - self.zero;
        if span == 0.0 {
            return if value == self.full { 100.0 } else { 0.0 };
        }
        ((value - self.zero) / span).clamp(0.0, 1.0) * 100.0
    }
}

/// Category weights of the composite health score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CbsWeights {
    pub profitability: f64,
    pub solvency: f64,
    pub growth: f64,
    pub valuation: f64,
}

impl Default for CbsWeights {
    fn default() -> Self {
        Self {
            profitability: 30.0,
            solvency: 25.0,
            growth: 25.0,
            valuation: 20.0,
        }
    }
}

impl CbsWeights {
    pub fn as_array(&self) -> [f64; 4] {
        [self.profitability, self.solvency, self.growth, self.valuation]
    }
}

/// Composite health score configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CbsConfig {
    pub weights: CbsWeights,
    pub roe: ScoreCurve,
    pub net_margin: ScoreCurve,
    pub gross_margin: ScoreCurve,
    pub current_ratio: ScoreCurve,
    pub quick_ratio: ScoreCurve,
    pub debt_ratio: ScoreCurve,
    pub pe_ttm: ScoreCurve,
    pub pb_ratio: ScoreCurve,
}

impl Default for CbsConfig {
    fn default() -> Self {
        Self {
            weights: CbsWeights::default(),
            roe: ScoreCurve::new(20.0, 0.0),
            net_margin: ScoreCurve::new(20.0, 0.0),
            gross_margin: ScoreCurve::new(40.0, 0.0),
            current_ratio: ScoreCurve::new(2.0, 0.5),
            quick_ratio: ScoreCurve::new(1.0, 0.25),
            debt_ratio: ScoreCurve::new(30.0, 70.0),
            pe_ttm: ScoreCurve::new(10.0, 40.0),
            pb_ratio: ScoreCurve::new(1.0, 5.0),
        }
    }
}

/// Valuation band thresholds of the signal classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub undervalued_pe: f64,
    pub undervalued_pb: f64,
    pub low_price_pe: f64,
    pub low_price_pb: f64,
    pub medium_pe_max: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            undervalued_pe: 10.0,
            undervalued_pb: 1.0,
            low_price_pe: 15.0,
            low_price_pb: 1.5,
            medium_pe_max: 25.0,
        }
    }
}

/// Trend channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Number of most recent closes fed into the regression
    pub window_size: usize,
    /// Regress ln(price) instead of price
    pub use_log_scale: bool,
    /// Fewest points that still yield a channel
    pub min_points: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window_size: 1278,
            use_log_scale: false,
            min_points: 2,
        }
    }
}

/// Batch recomputation configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads; `None` uses the number of available cores
    pub workers: Option<usize>,
}

/// Screener paging configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 500,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cbs: CbsConfig,
    pub signal: SignalConfig,
    pub trend: TrendConfig,
    pub batch: BatchConfig,
    pub screener: ScreenerConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        log::debug!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        let weights = self.cbs.weights.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(FundamentalsError::InvalidConfig(
                "CBS weights must be finite and non-negative".to_string(),
            ));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(FundamentalsError::InvalidConfig(
                "at least one CBS weight must be positive".to_string(),
            ));
        }

        let curves = [
            ("roe", self.cbs.roe),
            ("net_margin", self.cbs.net_margin),
            ("gross_margin", self.cbs.gross_margin),
            ("current_ratio", self.cbs.current_ratio),
            ("quick_ratio", self.cbs.quick_ratio),
            ("debt_ratio", self.cbs.debt_ratio),
            ("pe_ttm", self.cbs.pe_ttm),
            ("pb_ratio", self.cbs.pb_ratio),
        ];
        for (name, curve) in curves {
            if !curve.full.is_finite() || !curve.zero.is_finite() || curve.full == curve.zero {
                return Err(FundamentalsError::InvalidConfig(format!(
                    "score curve for {} needs two distinct finite endpoints",
                    name
                )));
            }
        }

        let signal = &self.signal;
        let thresholds = [
            ("undervalued_pe", signal.undervalued_pe),
            ("undervalued_pb", signal.undervalued_pb),
            ("low_price_pe", signal.low_price_pe),
            ("low_price_pb", signal.low_price_pb),
            ("medium_pe_max", signal.medium_pe_max),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() {
                return Err(FundamentalsError::InvalidConfig(format!(
                    "signal threshold {} must be finite",
                    name
                )));
            }
        }
        if signal.undervalued_pe > signal.low_price_pe || signal.low_price_pe > signal.medium_pe_max
        {
            return Err(FundamentalsError::InvalidConfig(
                "signal PE thresholds must be ascending".to_string(),
            ));
        }
        if signal.undervalued_pb > signal.low_price_pb {
            return Err(FundamentalsError::InvalidConfig(
                "signal PB thresholds must be ascending".to_string(),
            ));
        }

        if self.trend.window_size < 2 {
            return Err(FundamentalsError::InvalidConfig(
                "trend window_size must be at least 2".to_string(),
            ));
        }
        if self.trend.min_points < 2 {
            return Err(FundamentalsError::InvalidConfig(
                "trend min_points must be at least 2".to_string(),
            ));
        }

        if self.batch.workers == Some(0) {
            return Err(FundamentalsError::InvalidConfig(
                "batch workers must be positive".to_string(),
            ));
        }

        if self.screener.default_page_size == 0
            || self.screener.default_page_size > self.screener.max_page_size
        {
            return Err(FundamentalsError::InvalidConfig(
                "default_page_size must be in 1..=max_page_size".to_string(),
            ));
        }

        Ok(())
    }
}
