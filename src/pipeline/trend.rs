//! Trend channel ("five-line") analysis
//!
//! Ordinary least-squares fit of close prices (or their logarithm) against a
//! sequential index, with bands one and two residual standard deviations
//! either side of the fitted value at the latest index.

use crate::config::TrendConfig;
use crate::types::{CompanyId, Price};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;

/// Where the current price sits relative to the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BandPosition {
    #[serde(rename = "-2SD")]
    Minus2Sd,
    #[serde(rename = "-1SD")]
    Minus1Sd,
    #[serde(rename = "TL")]
    TrendLine,
    #[serde(rename = "+1SD")]
    Plus1Sd,
    #[serde(rename = "+2SD")]
    Plus2Sd,
}

impl BandPosition {
    pub fn label(&self) -> &'static str {
        match self {
            BandPosition::Minus2Sd => "-2SD",
            BandPosition::Minus1Sd => "-1SD",
            BandPosition::TrendLine => "TL",
            BandPosition::Plus1Sd => "+1SD",
            BandPosition::Plus2Sd => "+2SD",
        }
    }

    /// Classify a value against the five breakpoints
    pub fn classify(value: f64, center: f64, sigma: f64) -> Self {
        // absorbs rounding noise of an exact fit
        let tolerance = 1e-9 * center.abs().max(1.0);
        if (value - center).abs() <= sigma + tolerance {
            BandPosition::TrendLine
        } else if value >= center + 2.0 * sigma {
            BandPosition::Plus2Sd
        } else if value > center + sigma {
            BandPosition::Plus1Sd
        } else if value <= center - 2.0 * sigma {
            BandPosition::Minus2Sd
        } else {
            BandPosition::Minus1Sd
        }
    }
}

impl fmt::Display for BandPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw regression result in the fitted space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelFit {
    pub slope: f64,
    pub intercept: f64,
    /// Fitted value at the latest index
    pub center: f64,
    /// Residual standard deviation
    pub sigma: f64,
    pub r_squared: f64,
    /// Latest observation in the fitted space
    pub last: f64,
    pub points: usize,
}

impl ChannelFit {
    /// Fit `values` against 0..n-1; `None` for fewer than two points or
    /// non-finite input.
    pub fn fit(values: &[f64]) -> Option<Self> {
        let n = values.len();
        if n < 2 || values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let last = values[n - 1];

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if min == max {
            // zero variance: flat line through the constant, no spread
            return Some(Self {
                slope: 0.0,
                intercept: last,
                center: last,
                sigma: 0.0,
                r_squared: 1.0,
                last,
                points: n,
            });
        }

        let x_mean = (n - 1) as f64 / 2.0;
        let y_mean = values.iter().mean();

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for (i, &y) in values.iter().enumerate() {
            let dx = i as f64 - x_mean;
            sxx += dx * dx;
            sxy += dx * (y - y_mean);
        }
        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;

        let residuals: Vec<f64> = values
            .iter()
            .enumerate()
            .map(|(i, &y)| y - (intercept + slope * i as f64))
            .collect();
        let sigma = residuals.iter().population_std_dev();

        let ss_res: f64 = residuals.iter().map(|r| r * r).sum();
        let ss_tot: f64 = values.iter().map(|y| (y - y_mean).powi(2)).sum();
        let r_squared = if ss_tot > 0.0 {
            (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
        } else {
            1.0
        };

        Some(Self {
            slope,
            intercept,
            center: intercept + slope * (n - 1) as f64,
            sigma: if sigma.is_finite() { sigma } else { 0.0 },
            r_squared,
            last,
            points: n,
        })
    }

    pub fn position(&self) -> BandPosition {
        BandPosition::classify(self.last, self.center, self.sigma)
    }
}

/// Trend channel of one company as of a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub company_id: CompanyId,
    pub calculation_date: NaiveDate,
    /// Number of closes used in the regression
    pub period_days: usize,
    pub current_price: Price,
    pub trend_line: Price,
    pub sd_plus_1: Price,
    pub sd_plus_2: Price,
    pub sd_minus_1: Price,
    pub sd_minus_2: Price,
    pub position: BandPosition,
    pub r_squared: f64,
    /// Slope per index step, in the fitted space
    pub slope: f64,
}

impl TrendAnalysis {
    /// Bands in ascending order: -2SD, -1SD, TL, +1SD, +2SD
    pub fn bands(&self) -> [Price; 5] {
        [
            self.sd_minus_2,
            self.sd_minus_1,
            self.trend_line,
            self.sd_plus_1,
            self.sd_plus_2,
        ]
    }
}

/// Trend channel analyzer
#[derive(Debug, Clone, Default)]
pub struct TrendAnalyzer {
    config: TrendConfig,
}

impl TrendAnalyzer {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Analyze an ascending close series.
    ///
    /// Only the most recent `window_size` closes are used. Returns `None`
    /// when fewer than `min_points` remain or, on log scale, when a close is
    /// not positive.
    pub fn analyze(
        &self,
        company_id: CompanyId,
        calculation_date: NaiveDate,
        closes: &[Price],
    ) -> Option<TrendAnalysis> {
        let start = closes.len().saturating_sub(self.config.window_size);
        let window = &closes[start..];
        if window.len() < self.config.min_points.max(2) {
            return None;
        }
        let current_price = window[window.len() - 1];

        let fitted: Vec<f64> = if self.config.use_log_scale {
            if window.iter().any(|&p| p <= 0.0) {
                log::debug!("Company {}: non-positive close on log scale", company_id);
                return None;
            }
            window.iter().map(|p| p.ln()).collect()
        } else {
            window.to_vec()
        };

        let fit = ChannelFit::fit(&fitted)?;
        let back = |v: f64| {
            if self.config.use_log_scale {
                v.exp()
            } else {
                v
            }
        };

        Some(TrendAnalysis {
            company_id,
            calculation_date,
            period_days: fit.points,
            current_price,
            trend_line: back(fit.center),
            sd_plus_1: back(fit.center + fit.sigma),
            sd_plus_2: back(fit.center + 2.0 * fit.sigma),
            sd_minus_1: back(fit.center - fit.sigma),
            sd_minus_2: back(fit.center - 2.0 * fit.sigma),
            position: fit.position(),
            r_squared: fit.r_squared,
            slope: fit.slope,
        })
    }
}
