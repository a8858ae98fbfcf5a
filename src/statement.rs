//! Periodic financial statements

use crate::error::{FundamentalsError, Result};
use crate::types::{Amount, CompanyId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A reporting period: fiscal year plus season (quarter 1..=4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: i32,
    pub season: u8,
}

impl PeriodKey {
    /// Create a period, rejecting seasons outside 1..=4
    pub fn new(year: i32, season: u8) -> Result<Self> {
        if !(1..=4).contains(&season) {
            return Err(FundamentalsError::ParseError(format!(
                "season must be between 1 and 4, got {}",
                season
            )));
        }
        Ok(Self { year, season })
    }

    /// The period immediately before this one
    pub fn prior(&self) -> Self {
        if self.season == 1 {
            Self {
                year: self.year - 1,
                season: 4,
            }
        } else {
            Self {
                year: self.year,
                season: self.season - 1,
            }
        }
    }

    /// The same season one year earlier
    pub fn year_ago(&self) -> Self {
        Self {
            year: self.year - 1,
            season: self.season,
        }
    }

    /// Report date: the 15th of the season's closing month
    pub fn report_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, u32::from(self.season) * 3, 15)
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.season)
    }
}

impl FromStr for PeriodKey {
    type Err = FundamentalsError;

    /// Parses `2024Q1`, `2024-Q1` or `2024-1`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (year, season) = s
            .split_once(|c| c == 'Q' || c == 'q' || c == '-')
            .ok_or_else(|| FundamentalsError::ParseError(format!("invalid period: {}", s)))?;
        let season = season.trim_start_matches(|c| c == 'Q' || c == 'q');
        let year = year
            .parse::<i32>()
            .map_err(|e| FundamentalsError::ParseError(format!("invalid year in {}: {}", s, e)))?;
        let season = season
            .parse::<u8>()
            .map_err(|e| FundamentalsError::ParseError(format!("invalid season in {}: {}", s, e)))?;
        PeriodKey::new(year, season)
    }
}

/// One company's raw reported figures for a single period.
///
/// Every figure is optional: a field the filing did not carry stays `None`
/// and every ratio depending on it becomes undefined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub company_id: CompanyId,
    pub year: i32,
    pub season: u8,

    // Income statement
    pub revenue: Option<Amount>,
    pub cost_of_goods_sold: Option<Amount>,
    pub gross_profit: Option<Amount>,
    pub operating_income: Option<Amount>,
    pub net_income: Option<Amount>,
    pub eps: Option<f64>,

    // Balance sheet
    pub total_assets: Option<Amount>,
    pub total_equity: Option<Amount>,
    pub total_liabilities: Option<Amount>,
    pub current_assets: Option<Amount>,
    pub current_liabilities: Option<Amount>,
    pub inventory: Option<Amount>,
    pub accounts_receivable: Option<Amount>,
    pub cash_and_equivalents: Option<Amount>,
    pub goodwill: Option<Amount>,
    pub shares_outstanding: Option<f64>,

    // Cash flow
    pub operating_cash_flow: Option<Amount>,

    /// Market capitalization reported alongside the period, if any
    pub market_cap: Option<Amount>,
}

impl StatementPeriod {
    /// Create an empty statement for a company-period
    pub fn new(company_id: CompanyId, period: PeriodKey) -> Self {
        Self {
            company_id,
            year: period.year,
            season: period.season,
            ..Default::default()
        }
    }

    /// The (year, season) key of this statement
    pub fn period(&self) -> PeriodKey {
        PeriodKey {
            year: self.year,
            season: self.season,
        }
    }

    /// Report date derived from the period
    pub fn report_date(&self) -> Option<NaiveDate> {
        self.period().report_date()
    }
}
