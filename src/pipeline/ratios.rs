//! Fundamental ratios derived from one company-period
//!
//! Every ratio is `Option<f64>`: a missing input or a zero denominator
//! leaves the ratio undefined instead of coercing it to zero.

use crate::statement::StatementPeriod;
use crate::types::{finite, Amount, Price};
use serde::{Deserialize, Serialize};

const DAYS_PER_YEAR: f64 = 365.0;
const QUARTERS_PER_YEAR: usize = 4;

/// Divide two optional figures, undefined on missing input or zero denominator
pub fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let numerator = numerator?;
    let denominator = denominator?;
    if denominator.abs() < f64::EPSILON {
        None
    } else {
        finite(numerator / denominator)
    }
}

/// Like [`safe_div`] but expressed as a percentage
pub fn safe_pct(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    safe_div(numerator, denominator).map(|v| v * 100.0)
}

/// Net Margin - net income over revenue (%)
#[derive(Debug, Clone)]
pub struct NetMargin;

impl NetMargin {
    pub fn calculate(net_income: Option<Amount>, revenue: Option<Amount>) -> Option<f64> {
        safe_pct(net_income, revenue)
    }
}

/// Asset Turnover - revenue over total assets
#[derive(Debug, Clone)]
pub struct AssetTurnover;

impl AssetTurnover {
    pub fn calculate(revenue: Option<Amount>, total_assets: Option<Amount>) -> Option<f64> {
        safe_div(revenue, total_assets)
    }
}

/// Equity Multiplier - total assets over total equity
#[derive(Debug, Clone)]
pub struct EquityMultiplier;

impl EquityMultiplier {
    pub fn calculate(total_assets: Option<Amount>, total_equity: Option<Amount>) -> Option<f64> {
        safe_div(total_assets, total_equity)
    }
}

/// ROE - Return on Equity via the Dupont decomposition (%)
///
/// Always derived from the three Dupont factors, never from
/// net_income / total_equity directly, so the identity holds exactly.
#[derive(Debug, Clone)]
pub struct DupontRoe;

impl DupontRoe {
    pub fn calculate(
        net_margin: Option<f64>,
        asset_turnover: Option<f64>,
        equity_multiplier: Option<f64>,
    ) -> Option<f64> {
        let value = net_margin? / 100.0 * asset_turnover? * equity_multiplier? * 100.0;
        finite(value)
    }
}

/// Quick Ratio (Acid-Test Ratio)
#[derive(Debug, Clone)]
pub struct QuickRatio;

impl QuickRatio {
    pub fn calculate(
        current_assets: Option<Amount>,
        inventory: Option<Amount>,
        current_liabilities: Option<Amount>,
    ) -> Option<f64> {
        let quick_assets = current_assets? - inventory?;
        safe_div(Some(quick_assets), current_liabilities)
    }
}

/// PE Ratio on trailing twelve month earnings
#[derive(Debug, Clone)]
pub struct PeTtm;

impl PeTtm {
    /// Undefined when trailing earnings are zero or negative
    pub fn calculate(market_cap: Option<Amount>, ttm_net_income: Option<Amount>) -> Option<f64> {
        let earnings = ttm_net_income?;
        if earnings <= 0.0 {
            return None;
        }
        safe_div(market_cap, Some(earnings))
    }
}

/// PB Ratio - market capitalization over book equity
#[derive(Debug, Clone)]
pub struct PbRatio;

impl PbRatio {
    /// Undefined when book equity is zero or negative
    pub fn calculate(market_cap: Option<Amount>, total_equity: Option<Amount>) -> Option<f64> {
        let equity = total_equity?;
        if equity <= 0.0 {
            return None;
        }
        safe_div(market_cap, Some(equity))
    }
}

/// Dividend Yield (%)
#[derive(Debug, Clone)]
pub struct DividendYield;

impl DividendYield {
    pub fn calculate(dividends_per_share: Option<f64>, close_price: Option<Price>) -> Option<f64> {
        let price = close_price?;
        if price <= 0.0 {
            return None;
        }
        safe_pct(dividends_per_share, Some(price))
    }
}

/// Days of a year's flow a stock figure represents
#[derive(Debug, Clone)]
pub struct TurnoverDays;

impl TurnoverDays {
    pub fn calculate(stock: Option<Amount>, annual_flow: Option<Amount>) -> Option<f64> {
        safe_div(stock, annual_flow).map(|v| v * DAYS_PER_YEAR)
    }
}

/// Trailing twelve month net income
#[derive(Debug, Clone)]
pub struct TrailingEarnings;

impl TrailingEarnings {
    /// Sum the net income of the four consecutive quarters ending at
    /// `current`.
    ///
    /// `recent` holds statements ending at the evaluated period. Every
    /// quarter of the window must be on file with a defined net income;
    /// otherwise the current period's EPS annualized over the outstanding
    /// shares is used instead.
    pub fn net_income(current: &StatementPeriod, recent: &[StatementPeriod]) -> Option<Amount> {
        let mut period = current.period();
        let mut total = 0.0;
        let mut complete = true;
        for _ in 0..QUARTERS_PER_YEAR {
            let income = recent
                .iter()
                .find(|s| s.company_id == current.company_id && s.period() == period)
                .and_then(|s| s.net_income);
            match income {
                Some(v) => total += v,
                None => {
                    complete = false;
                    break;
                }
            }
            period = period.prior();
        }

        if complete {
            return finite(total);
        }

        let eps = current.eps?;
        let shares = current.shares_outstanding?;
        finite(eps * shares * QUARTERS_PER_YEAR as f64)
    }
}

/// Inputs to the ratio calculator for one company-period
#[derive(Debug, Clone)]
pub struct RatioInputs<'a> {
    pub statement: &'a StatementPeriod,
    pub market_cap: Option<Amount>,
    pub close_price: Option<Price>,
    pub ttm_net_income: Option<Amount>,
    pub dividends_per_share: Option<f64>,
}

impl<'a> RatioInputs<'a> {
    /// Inputs carrying only statement figures; market-based ratios stay undefined
    pub fn statement_only(statement: &'a StatementPeriod) -> Self {
        Self {
            statement,
            market_cap: None,
            close_price: None,
            ttm_net_income: None,
            dividends_per_share: None,
        }
    }
}

/// Ratio subset of an indicator record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratios {
    pub roe: Option<f64>,
    pub net_margin: Option<f64>,
    pub asset_turnover: Option<f64>,
    pub equity_multiplier: Option<f64>,
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub debt_ratio: Option<f64>,
    pub cash_ratio: Option<f64>,
    pub pe_ttm: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub inventory_turnover_days: Option<f64>,
    pub receivable_turnover_days: Option<f64>,
    pub goodwill_ratio: Option<f64>,
}

/// Derives every ratio of one company-period
#[derive(Debug, Clone, Default)]
pub struct RatioCalculator;

impl RatioCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(&self, inputs: &RatioInputs<'_>) -> Ratios {
        let s = inputs.statement;

        let net_margin = NetMargin::calculate(s.net_income, s.revenue);
        let asset_turnover = AssetTurnover::calculate(s.revenue, s.total_assets);
        let equity_multiplier = EquityMultiplier::calculate(s.total_assets, s.total_equity);

        Ratios {
            roe: DupontRoe::calculate(net_margin, asset_turnover, equity_multiplier),
            net_margin,
            asset_turnover,
            equity_multiplier,
            gross_margin: safe_pct(s.gross_profit, s.revenue),
            operating_margin: safe_pct(s.operating_income, s.revenue),
            current_ratio: safe_div(s.current_assets, s.current_liabilities),
            quick_ratio: QuickRatio::calculate(
                s.current_assets,
                s.inventory,
                s.current_liabilities,
            ),
            debt_ratio: safe_pct(s.total_liabilities, s.total_assets),
            cash_ratio: safe_pct(s.cash_and_equivalents, s.current_liabilities),
            pe_ttm: PeTtm::calculate(inputs.market_cap, inputs.ttm_net_income),
            pb_ratio: PbRatio::calculate(inputs.market_cap, s.total_equity),
            dividend_yield: DividendYield::calculate(
                inputs.dividends_per_share,
                inputs.close_price,
            ),
            inventory_turnover_days: TurnoverDays::calculate(s.inventory, s.cost_of_goods_sold),
            receivable_turnover_days: TurnoverDays::calculate(s.accounts_receivable, s.revenue),
            goodwill_ratio: safe_pct(s.goodwill, s.total_assets),
        }
    }
}
