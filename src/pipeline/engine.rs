//! Per-company indicator engine
//!
//! [`IndicatorPipeline`] is the pure chain ratios → F-Score → CBS → signal
//! over figures already fetched. [`IndicatorEngine`] pulls those figures from
//! the stores and hands them to the pipeline, and runs the trend analyzer
//! over the price store.

use super::classifiers::SignalClassifier;
use super::composite::CompositeScorer;
use super::f_score::FScore;
use super::ratios::{RatioCalculator, RatioInputs, TrailingEarnings};
use super::trend::{TrendAnalysis, TrendAnalyzer};
use crate::company::Company;
use crate::config::EngineConfig;
use crate::error::{FundamentalsError, Result};
use crate::indicator::Indicator;
use crate::statement::{PeriodKey, StatementPeriod};
use crate::store::{PriceStore, StatementStore};
use crate::types::{Amount, CompanyId, Price};
use chrono::NaiveDate;
use std::sync::Arc;

/// Quarters fetched for trailing-twelve-month earnings
const TTM_QUARTERS: usize = 4;

/// Everything the pipeline needs for one company-period
#[derive(Debug, Clone)]
pub struct PipelineInputs<'a> {
    pub statement: &'a StatementPeriod,
    pub prior: Option<&'a StatementPeriod>,
    /// Statements ending at the evaluated period, newest first
    pub recent: &'a [StatementPeriod],
    pub market_cap: Option<Amount>,
    pub close_price: Option<Price>,
    pub dividends_per_share: Option<f64>,
}

impl<'a> PipelineInputs<'a> {
    /// Inputs with no prior period and no market data
    pub fn statement_only(statement: &'a StatementPeriod) -> Self {
        Self {
            statement,
            prior: None,
            recent: &[],
            market_cap: None,
            close_price: None,
            dividends_per_share: None,
        }
    }
}

/// Sequential indicator chain for one company-period
#[derive(Debug, Clone, Default)]
pub struct IndicatorPipeline {
    ratios: RatioCalculator,
    f_score: FScore,
    scorer: CompositeScorer,
    classifier: SignalClassifier,
}

impl IndicatorPipeline {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            ratios: RatioCalculator::new(),
            f_score: FScore::new(),
            scorer: CompositeScorer::new(config.cbs.clone()),
            classifier: SignalClassifier::new(config.signal),
        }
    }

    /// Run the chain. `None` only when the statement has no valid period.
    pub fn run(&self, inputs: &PipelineInputs<'_>) -> Option<Indicator> {
        let statement = inputs.statement;
        let report_date = statement.report_date()?;

        let ttm_net_income = TrailingEarnings::net_income(statement, inputs.recent);
        let ratios = self.ratios.compute(&RatioInputs {
            statement,
            market_cap: inputs.market_cap,
            close_price: inputs.close_price,
            ttm_net_income,
            dividends_per_share: inputs.dividends_per_share,
        });

        let f_score = self.f_score.score(statement, inputs.prior);
        if f_score.is_none() {
            log::debug!(
                "Company {} {}: no prior period, F-Score undefined",
                statement.company_id,
                statement.period()
            );
        }
        let cbs_score = self.scorer.score(&ratios, f_score);
        let signal = self.classifier.classify(ratios.pe_ttm, ratios.pb_ratio);

        Some(Indicator {
            company_id: statement.company_id,
            report_date,
            year: statement.year,
            season: statement.season,
            ratios,
            f_score,
            cbs_score,
            signal,
        })
    }
}

/// Engine over a statement store and a price store
#[derive(Clone)]
pub struct IndicatorEngine {
    statements: Arc<dyn StatementStore>,
    prices: Arc<dyn PriceStore>,
    pipeline: IndicatorPipeline,
    trend: TrendAnalyzer,
    config: EngineConfig,
}

impl IndicatorEngine {
    /// Create an engine; the configuration is validated first
    pub fn new(
        statements: Arc<dyn StatementStore>,
        prices: Arc<dyn PriceStore>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            statements,
            prices,
            pipeline: IndicatorPipeline::new(&config),
            trend: TrendAnalyzer::new(config.trend),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn statements(&self) -> &Arc<dyn StatementStore> {
        &self.statements
    }

    /// Indicator for one period, valued at the last close on or before its
    /// report date. `Ok(None)` when the period has no statement.
    pub fn compute_indicator(
        &self,
        company_id: CompanyId,
        period: PeriodKey,
    ) -> Result<Option<Indicator>> {
        let Some(report_date) = period.report_date() else {
            return Ok(None);
        };
        self.compute_indicator_as_of(company_id, period, report_date)
    }

    /// Indicator for the latest period on file, valued at the latest close
    pub fn compute_latest_indicator(&self, company_id: CompanyId) -> Result<Option<Indicator>> {
        let Some(period) = self.statements.latest_period(company_id)? else {
            log::debug!("Company {}: no statements on file", company_id);
            return Ok(None);
        };
        let report_date = period.report_date();
        let latest_close = self.prices.get_latest_close(company_id)?.map(|(date, _)| date);
        let as_of = match (report_date, latest_close) {
            (Some(report), Some(close)) => report.max(close),
            (Some(report), None) => report,
            (None, _) => return Ok(None),
        };
        self.compute_indicator_as_of(company_id, period, as_of)
    }

    /// Indicator for `period` with market figures taken as of `as_of`
    pub fn compute_indicator_as_of(
        &self,
        company_id: CompanyId,
        period: PeriodKey,
        as_of: NaiveDate,
    ) -> Result<Option<Indicator>> {
        let Some(statement) = self.statements.get_statement(company_id, period)? else {
            log::debug!("Company {}: no statement for {}", company_id, period);
            return Ok(None);
        };
        let prior = self.statements.get_prior_statement(company_id, period)?;
        let recent = self
            .statements
            .get_recent_statements(company_id, period, TTM_QUARTERS)?;

        let close = self.prices.get_price_series(company_id, as_of, 1)?.pop();
        let valuation_date = close.map(|(date, _)| date).unwrap_or(as_of);
        let market_cap = self
            .statements
            .get_market_cap(company_id, valuation_date)?
            .or(statement.market_cap);
        let dividends_per_share = self
            .statements
            .get_trailing_dividends_per_share(company_id, valuation_date)?;

        Ok(self.pipeline.run(&PipelineInputs {
            statement: &statement,
            prior: prior.as_ref(),
            recent: &recent,
            market_cap,
            close_price: close.map(|(_, price)| price),
            dividends_per_share,
        }))
    }

    /// Trend channel over the configured window ending at `as_of`.
    /// `Ok(None)` when fewer than the minimum number of closes exist.
    pub fn compute_trend(
        &self,
        company_id: CompanyId,
        as_of: NaiveDate,
    ) -> Result<Option<TrendAnalysis>> {
        let series = self
            .prices
            .get_price_series(company_id, as_of, self.config.trend.window_size)?;
        let closes: Vec<Price> = series.iter().map(|(_, close)| *close).collect();

        let analysis = self.trend.analyze(company_id, as_of, &closes);
        if analysis.is_none() {
            log::debug!(
                "Company {}: trend undefined with {} closes as of {}",
                company_id,
                closes.len(),
                as_of
            );
        }
        Ok(analysis)
    }

    /// Look a company up by stock code
    pub fn find_company(&self, stock_code: &str) -> Result<Company> {
        let code = stock_code.trim();
        self.statements
            .companies()?
            .into_iter()
            .find(|c| c.stock_code == code)
            .ok_or_else(|| FundamentalsError::DataError(format!("Unknown stock code: {}", code)))
    }

    /// Company metadata, failing when the id is unknown
    pub fn company(&self, company_id: CompanyId) -> Result<Company> {
        self.statements
            .get_company(company_id)?
            .ok_or(FundamentalsError::CompanyNotFound(company_id))
    }
}

impl std::fmt::Debug for IndicatorEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndicatorEngine")
            .field("pipeline", &self.pipeline)
            .field("trend", &self.trend)
            .finish_non_exhaustive()
    }
}
