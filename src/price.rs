//! Daily price data

use crate::types::{CompanyId, Price};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar plus percent change for one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub company_id: CompanyId,
    pub date: NaiveDate,
    pub open: Option<Price>,
    pub high: Option<Price>,
    pub low: Option<Price>,
    pub close: Price,
    pub volume: Option<u64>,
    pub change_percent: Option<f64>,
}

impl PricePoint {
    /// Create a close-only price point
    pub fn close_only(company_id: CompanyId, date: NaiveDate, close: Price) -> Self {
        Self {
            company_id,
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
            change_percent: None,
        }
    }

    /// Get price range (high - low)
    pub fn range(&self) -> Option<Price> {
        match (self.high, self.low) {
            (Some(high), Some(low)) => Some(high - low),
            _ => None,
        }
    }
}
