//! # Rusty Fundamentals
//!
//! Indicator computation and screening over listed companies' financial
//! statements and daily prices.
//!
//! The engine derives ratios from each reporting period, scores fundamental
//! growth (F-Score) and overall health (CBS), classifies valuation into a
//! discrete signal, and fits a linear-regression trend channel over prices.
//! The screener answers multi-predicate queries over the latest indicator of
//! every company.
//!
//! ## Example
//!
//! ```rust
//! use rusty_fundamentals::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> rusty_fundamentals::error::Result<()> {
//! let store = Arc::new(InMemoryStore::new());
//! store.add_company(Company::new(1, "2330".into(), "TSMC".into(), Market::Listed))?;
//!
//! let mut statement = StatementPeriod::new(1, PeriodKey::new(2024, 1)?);
//! statement.revenue = Some(1000.0);
//! statement.net_income = Some(100.0);
//! statement.total_assets = Some(800.0);
//! statement.total_equity = Some(400.0);
//! store.add_statement(statement)?;
//!
//! let engine = IndicatorEngine::new(store.clone(), store, EngineConfig::default())?;
//! let indicator = engine.compute_indicator(1, PeriodKey::new(2024, 1)?)?.unwrap();
//! assert!((indicator.ratios.roe.unwrap() - 25.0).abs() < 1e-9);
//! assert_eq!(indicator.f_score, None);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod company;
pub mod config;
pub mod error;
pub mod indicator;
pub mod pipeline;
pub mod price;
pub mod screener;
pub mod statement;
pub mod store;
pub mod types;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::batch::{BatchReport, BatchRunner, CancellationToken, Outcome};
    pub use crate::company::{Company, Market};
    pub use crate::config::EngineConfig;
    pub use crate::error::{FundamentalsError, Result};
    pub use crate::indicator::{Indicator, NumericField};
    pub use crate::pipeline::{
        BandPosition, HealthBand, IndicatorEngine, Ratios, Signal, TrendAnalysis,
    };
    pub use crate::price::PricePoint;
    pub use crate::screener::{
        IndicatorSnapshot, ScreenResult, Screener, ScreenerFilter, SnapshotCell,
    };
    pub use crate::statement::{PeriodKey, StatementPeriod};
    pub use crate::store::{CsvLoader, InMemoryStore, PriceStore, StatementStore};
    pub use crate::types::*;
}
