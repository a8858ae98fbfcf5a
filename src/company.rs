//! Company representations

use crate::error::FundamentalsError;
use crate::types::{CompanyId, StockCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Market venue a company is traded on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Market {
    /// Main board listing (上市)
    #[serde(alias = "上市", alias = "listed")]
    Listed,
    /// Over-the-counter (上櫃)
    #[serde(alias = "上櫃", alias = "otc", alias = "OTC")]
    Otc,
    /// Emerging stock board (興櫃)
    #[serde(alias = "興櫃", alias = "emerging")]
    Emerging,
}

impl Market {
    /// Display label used by the presentation layer
    pub fn label(&self) -> &'static str {
        match self {
            Market::Listed => "上市",
            Market::Otc => "上櫃",
            Market::Emerging => "興櫃",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::Listed => write!(f, "Listed"),
            Market::Otc => write!(f, "OTC"),
            Market::Emerging => write!(f, "Emerging"),
        }
    }
}

impl FromStr for Market {
    type Err = FundamentalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "上市" => Ok(Market::Listed),
            "上櫃" => Ok(Market::Otc),
            "興櫃" => Ok(Market::Emerging),
            other => match other.to_ascii_lowercase().as_str() {
                "listed" | "twse" => Ok(Market::Listed),
                "otc" | "tpex" => Ok(Market::Otc),
                "emerging" => Ok(Market::Emerging),
                _ => Err(FundamentalsError::ParseError(format!(
                    "unknown market venue: {}",
                    s
                ))),
            },
        }
    }
}

/// Company representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// Unique company identifier
    pub id: CompanyId,
    /// Exchange stock code
    pub stock_code: StockCode,
    /// Display name
    pub name: String,
    /// Industry label
    pub industry: Option<String>,
    /// Market venue
    pub market: Market,
    /// Listing date
    pub listing_date: Option<NaiveDate>,
    /// Paid-in capital
    pub capital: Option<u64>,
}

impl Company {
    /// Create a new company
    pub fn new(id: CompanyId, stock_code: StockCode, name: String, market: Market) -> Self {
        Self {
            id,
            stock_code,
            name,
            industry: None,
            market,
            listing_date: None,
            capital: None,
        }
    }

    /// Set the industry label
    pub fn with_industry(mut self, industry: String) -> Self {
        self.industry = Some(industry);
        self
    }

    /// Set the listing date
    pub fn with_listing_date(mut self, listing_date: NaiveDate) -> Self {
        self.listing_date = Some(listing_date);
        self
    }

    /// Set the paid-in capital
    pub fn with_capital(mut self, capital: u64) -> Self {
        self.capital = Some(capital);
        self
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Company({}, {}, {})", self.stock_code, self.name, self.market)
    }
}
