//! Piotroski-style F-Score
//!
//! Nine binary checks comparing a period with the one before it. A check
//! whose inputs are missing scores 0; a company without a prior period has
//! no F-Score at all.

use super::ratios::{RatioCalculator, RatioInputs, Ratios};
use crate::statement::StatementPeriod;
use serde::{Deserialize, Serialize};

/// Highest attainable F-Score
pub const MAX_F_SCORE: u8 = 9;

/// Outcome of each of the nine checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FScoreChecks {
    pub positive_net_income: bool,
    pub positive_operating_cash_flow: bool,
    pub improving_roe: bool,
    pub cash_flow_exceeds_income: bool,
    pub non_increasing_leverage: bool,
    pub improving_liquidity: bool,
    pub no_dilution: bool,
    pub improving_gross_margin: bool,
    pub improving_asset_turnover: bool,
}

impl FScoreChecks {
    fn as_array(&self) -> [bool; 9] {
        [
            self.positive_net_income,
            self.positive_operating_cash_flow,
            self.improving_roe,
            self.cash_flow_exceeds_income,
            self.non_increasing_leverage,
            self.improving_liquidity,
            self.no_dilution,
            self.improving_gross_margin,
            self.improving_asset_turnover,
        ]
    }

    /// Number of checks passed, in 0..=9
    pub fn score(&self) -> u8 {
        self.as_array().iter().filter(|&&passed| passed).count() as u8
    }
}

/// `a > b` when both sides are defined
fn improved(current: Option<f64>, prior: Option<f64>) -> bool {
    matches!((current, prior), (Some(c), Some(p)) if c > p)
}

/// `a <= b` when both sides are defined
fn not_increased(current: Option<f64>, prior: Option<f64>) -> bool {
    matches!((current, prior), (Some(c), Some(p)) if c <= p)
}

/// F-Score calculator
#[derive(Debug, Clone, Default)]
pub struct FScore {
    ratios: RatioCalculator,
}

impl FScore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the nine checks; `None` when there is no prior period
    pub fn checks(
        &self,
        current: &StatementPeriod,
        prior: Option<&StatementPeriod>,
    ) -> Option<FScoreChecks> {
        let prior = prior?;
        if prior.company_id != current.company_id || prior.period() >= current.period() {
            log::warn!(
                "F-Score skipped: {} {} is not a prior period of {} {}",
                prior.company_id,
                prior.period(),
                current.company_id,
                current.period()
            );
            return None;
        }

        let now: Ratios = self.ratios.compute(&RatioInputs::statement_only(current));
        let before: Ratios = self.ratios.compute(&RatioInputs::statement_only(prior));

        let net_income = current.net_income;
        let cash_flow = current.operating_cash_flow;

        Some(FScoreChecks {
            positive_net_income: net_income.map_or(false, |v| v > 0.0),
            positive_operating_cash_flow: match cash_flow {
                Some(ocf) => ocf > 0.0,
                None => net_income.map_or(false, |v| v > 0.0),
            },
            improving_roe: improved(now.roe, before.roe),
            cash_flow_exceeds_income: improved(cash_flow, net_income),
            non_increasing_leverage: not_increased(now.debt_ratio, before.debt_ratio),
            improving_liquidity: improved(now.current_ratio, before.current_ratio),
            no_dilution: not_increased(current.shares_outstanding, prior.shares_outstanding),
            improving_gross_margin: improved(now.gross_margin, before.gross_margin),
            improving_asset_turnover: improved(now.asset_turnover, before.asset_turnover),
        })
    }

    /// Total score in 0..=9; `None` when there is no prior period
    pub fn score(&self, current: &StatementPeriod, prior: Option<&StatementPeriod>) -> Option<u8> {
        self.checks(current, prior).map(|checks| checks.score())
    }
}
