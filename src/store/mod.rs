//! Read-only data collaborators of the engine
//!
//! The engine never owns raw data. Statements, market capitalization and
//! prices come through these traits; an absent value is `Ok(None)`, a failing
//! store is `Err`.

pub mod csv_loader;
pub mod memory;

pub use csv_loader::{CsvLoader, LoadSummary};
pub use memory::InMemoryStore;

use crate::company::Company;
use crate::error::Result;
use crate::statement::{PeriodKey, StatementPeriod};
use crate::types::{Amount, CompanyId, Price};
use chrono::NaiveDate;

/// Source of company metadata and financial statements
pub trait StatementStore: Send + Sync {
    /// Statement of exactly this period
    fn get_statement(&self, company_id: CompanyId, period: PeriodKey)
        -> Result<Option<StatementPeriod>>;

    /// Most recent statement strictly before `period`
    fn get_prior_statement(
        &self,
        company_id: CompanyId,
        period: PeriodKey,
    ) -> Result<Option<StatementPeriod>>;

    /// Up to `count` statements ending at `period` (inclusive), newest first
    fn get_recent_statements(
        &self,
        company_id: CompanyId,
        period: PeriodKey,
        count: usize,
    ) -> Result<Vec<StatementPeriod>>;

    /// Latest period with a statement on file
    fn latest_period(&self, company_id: CompanyId) -> Result<Option<PeriodKey>>;

    /// Market capitalization on or before `as_of`
    fn get_market_cap(&self, company_id: CompanyId, as_of: NaiveDate) -> Result<Option<Amount>>;

    /// Cash dividends per share paid in the year up to `as_of`
    fn get_trailing_dividends_per_share(
        &self,
        _company_id: CompanyId,
        _as_of: NaiveDate,
    ) -> Result<Option<f64>> {
        Ok(None)
    }

    fn get_company(&self, company_id: CompanyId) -> Result<Option<Company>>;

    fn companies(&self) -> Result<Vec<Company>>;
}

/// Source of daily prices
pub trait PriceStore: Send + Sync {
    /// At most `window_size` ascending (date, close) points on or before `as_of`
    fn get_price_series(
        &self,
        company_id: CompanyId,
        as_of: NaiveDate,
        window_size: usize,
    ) -> Result<Vec<(NaiveDate, Price)>>;

    /// Most recent close on file
    fn get_latest_close(&self, company_id: CompanyId) -> Result<Option<(NaiveDate, Price)>>;
}
