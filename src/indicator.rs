//! Per-period indicator record

use crate::pipeline::classifiers::Signal;
use crate::pipeline::ratios::Ratios;
use crate::statement::PeriodKey;
use crate::types::CompanyId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric indicator fields the screener can range-filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericField {
    Roe,
    PeTtm,
    PbRatio,
    CurrentRatio,
    FScore,
    CbsScore,
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumericField::Roe => "roe",
            NumericField::PeTtm => "pe_ttm",
            NumericField::PbRatio => "pb_ratio",
            NumericField::CurrentRatio => "current_ratio",
            NumericField::FScore => "f_score",
            NumericField::CbsScore => "cbs_score",
        };
        f.write_str(name)
    }
}

/// Derived indicators of one company for one reporting period.
///
/// Created once and never edited; a restated period yields a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub company_id: CompanyId,
    pub report_date: NaiveDate,
    pub year: i32,
    pub season: u8,
    #[serde(flatten)]
    pub ratios: Ratios,
    pub f_score: Option<u8>,
    pub cbs_score: Option<u8>,
    pub signal: Signal,
}

impl Indicator {
    pub fn period(&self) -> PeriodKey {
        PeriodKey {
            year: self.year,
            season: self.season,
        }
    }

    /// Value of a filterable field, `None` when undefined
    pub fn field(&self, field: NumericField) -> Option<f64> {
        match field {
            NumericField::Roe => self.ratios.roe,
            NumericField::PeTtm => self.ratios.pe_ttm,
            NumericField::PbRatio => self.ratios.pb_ratio,
            NumericField::CurrentRatio => self.ratios.current_ratio,
            NumericField::FScore => self.f_score.map(f64::from),
            NumericField::CbsScore => self.cbs_score.map(f64::from),
        }
    }

    /// Ordering key used to pick the latest record of a company
    pub fn recency_key(&self) -> (NaiveDate, PeriodKey) {
        (self.report_date, self.period())
    }
}
