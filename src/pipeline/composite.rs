//! Composite health score (CBS)
//!
//! Four category sub-scores, each on [0, 100], combined with configurable
//! weights. A category without any defined input is dropped and the
//! remaining weights are renormalized.

use super::f_score::MAX_F_SCORE;
use super::ratios::Ratios;
use crate::config::{CbsConfig, ScoreCurve};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Score category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Profitability,
    Solvency,
    Growth,
    Valuation,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Profitability,
        Category::Solvency,
        Category::Growth,
        Category::Valuation,
    ];

    fn index(self) -> usize {
        match self {
            Category::Profitability => 0,
            Category::Solvency => 1,
            Category::Growth => 2,
            Category::Valuation => 3,
        }
    }
}

/// One scored input of the composite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Roe,
    NetMargin,
    GrossMargin,
    CurrentRatio,
    QuickRatio,
    DebtRatio,
    FScore,
    PeTtm,
    PbRatio,
}

impl Metric {
    pub fn category(self) -> Category {
        match self {
            Metric::Roe | Metric::NetMargin | Metric::GrossMargin => Category::Profitability,
            Metric::CurrentRatio | Metric::QuickRatio | Metric::DebtRatio => Category::Solvency,
            Metric::FScore => Category::Growth,
            Metric::PeTtm | Metric::PbRatio => Category::Valuation,
        }
    }
}

/// Health band over the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthBand {
    Good,
    Fair,
    Poor,
}

impl HealthBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            70..=u8::MAX => HealthBand::Good,
            50..=69 => HealthBand::Fair,
            _ => HealthBand::Poor,
        }
    }
}

impl fmt::Display for HealthBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthBand::Good => write!(f, "Good"),
            HealthBand::Fair => write!(f, "Fair"),
            HealthBand::Poor => write!(f, "Poor"),
        }
    }
}

/// Composite health scorer
#[derive(Debug, Clone, Default)]
pub struct CompositeScorer {
    config: CbsConfig,
}

impl CompositeScorer {
    pub fn new(config: CbsConfig) -> Self {
        Self { config }
    }

    fn curve(&self, metric: Metric) -> Option<ScoreCurve> {
        match metric {
            Metric::Roe => Some(self.config.roe),
            Metric::NetMargin => Some(self.config.net_margin),
            Metric::GrossMargin => Some(self.config.gross_margin),
            Metric::CurrentRatio => Some(self.config.current_ratio),
            Metric::QuickRatio => Some(self.config.quick_ratio),
            Metric::DebtRatio => Some(self.config.debt_ratio),
            Metric::PeTtm => Some(self.config.pe_ttm),
            Metric::PbRatio => Some(self.config.pb_ratio),
            Metric::FScore => None,
        }
    }

    /// Normalize one raw input onto [0, 100]
    pub fn metric_score(&self, metric: Metric, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        match self.curve(metric) {
            Some(curve) => Some(curve.score(value)),
            None => Some((value / f64::from(MAX_F_SCORE) * 100.0).clamp(0.0, 100.0)),
        }
    }

    /// Collect the defined inputs of an indicator
    pub fn metrics(ratios: &Ratios, f_score: Option<u8>) -> Vec<(Metric, f64)> {
        [
            (Metric::Roe, ratios.roe),
            (Metric::NetMargin, ratios.net_margin),
            (Metric::GrossMargin, ratios.gross_margin),
            (Metric::CurrentRatio, ratios.current_ratio),
            (Metric::QuickRatio, ratios.quick_ratio),
            (Metric::DebtRatio, ratios.debt_ratio),
            (Metric::FScore, f_score.map(f64::from)),
            (Metric::PeTtm, ratios.pe_ttm),
            (Metric::PbRatio, ratios.pb_ratio),
        ]
        .into_iter()
        .filter_map(|(metric, value)| value.map(|v| (metric, v)))
        .collect()
    }

    /// Sub-score per category, `None` where no input was defined
    pub fn category_scores(&self, metrics: &[(Metric, f64)]) -> [Option<f64>; 4] {
        let mut buckets: [Vec<f64>; 4] = Default::default();
        for &(metric, value) in metrics {
            if let Some(score) = self.metric_score(metric, value) {
                buckets[metric.category().index()].push(score);
            }
        }

        let mut result = [None; 4];
        for (slot, bucket) in result.iter_mut().zip(buckets.iter_mut()) {
            if bucket.is_empty() {
                continue;
            }
            // sorted so the sum does not depend on input order
            bucket.sort_by(f64::total_cmp);
            *slot = Some(bucket.iter().sum::<f64>() / bucket.len() as f64);
        }
        result
    }

    /// Weighted composite over arbitrary inputs, rounded to an integer
    pub fn score_metrics(&self, metrics: &[(Metric, f64)]) -> Option<u8> {
        let categories = self.category_scores(metrics);
        let weights = self.config.weights.as_array();

        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for category in Category::ALL {
            let i = category.index();
            if let Some(score) = categories[i] {
                weighted += score * weights[i];
                total_weight += weights[i];
            }
        }

        if total_weight <= 0.0 {
            return None;
        }
        let score = (weighted / total_weight).round().clamp(0.0, 100.0);
        Some(score as u8)
    }

    /// Composite score of one indicator; `None` when no category is defined
    pub fn score(&self, ratios: &Ratios, f_score: Option<u8>) -> Option<u8> {
        self.score_metrics(&Self::metrics(ratios, f_score))
    }
}
