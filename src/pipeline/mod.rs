//! Indicator computation chain

pub mod classifiers;
pub mod composite;
pub mod engine;
pub mod f_score;
pub mod ratios;
pub mod trend;

pub use classifiers::{Signal, SignalClassifier};
pub use composite::{Category, CompositeScorer, HealthBand, Metric};
pub use engine::{IndicatorEngine, IndicatorPipeline, PipelineInputs};
pub use f_score::{FScore, FScoreChecks, MAX_F_SCORE};
pub use ratios::{RatioCalculator, RatioInputs, Ratios, TrailingEarnings};
pub use trend::{BandPosition, ChannelFit, TrendAnalysis, TrendAnalyzer};
