//! In-memory statement and price store
//!
//! Statements and time series are kept per company in ordered maps so prior
//! periods and windows are range queries.

use super::{PriceStore, StatementStore};
use crate::company::Company;
use crate::error::{FundamentalsError, Result};
use crate::price::PricePoint;
use crate::statement::{PeriodKey, StatementPeriod};
use crate::types::{Amount, CompanyId, Price};
use chrono::{Duration, NaiveDate};
use hashbrown::HashMap;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    companies: HashMap<CompanyId, Company>,
    statements: HashMap<CompanyId, BTreeMap<PeriodKey, StatementPeriod>>,
    prices: HashMap<CompanyId, BTreeMap<NaiveDate, PricePoint>>,
    market_caps: HashMap<CompanyId, BTreeMap<NaiveDate, Amount>>,
    dividends: HashMap<CompanyId, BTreeMap<NaiveDate, f64>>,
}

/// Store backed by process memory
///
/// Clones share the same tables.
///
/// # Example
/// ```
/// use rusty_fundamentals::prelude::*;
///
/// let store = InMemoryStore::new();
/// store
///     .add_company(Company::new(1, "2330".into(), "TSMC".into(), Market::Listed))
///     .unwrap();
/// assert_eq!(store.companies().unwrap().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| FundamentalsError::DataError(format!("Store lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| FundamentalsError::DataError(format!("Store lock poisoned: {}", e)))
    }

    /// Add or replace a company
    pub fn add_company(&self, company: Company) -> Result<()> {
        self.write()?.companies.insert(company.id, company);
        Ok(())
    }

    /// Add or replace the statement of a company-period
    pub fn add_statement(&self, statement: StatementPeriod) -> Result<()> {
        if !(1..=4).contains(&statement.season) {
            return Err(FundamentalsError::DataError(format!(
                "Statement for company {} has invalid season {}",
                statement.company_id, statement.season
            )));
        }
        let mut tables = self.write()?;
        tables
            .statements
            .entry(statement.company_id)
            .or_default()
            .insert(statement.period(), statement);
        Ok(())
    }

    /// Add a daily price; a later point for the same date replaces it
    pub fn add_price(&self, point: PricePoint) -> Result<()> {
        if !point.close.is_finite() {
            return Err(FundamentalsError::DataError(format!(
                "Close for company {} on {} is not finite",
                point.company_id, point.date
            )));
        }
        let mut tables = self.write()?;
        tables
            .prices
            .entry(point.company_id)
            .or_default()
            .insert(point.date, point);
        Ok(())
    }

    /// Add a batch of daily prices
    pub fn add_prices<I>(&self, points: I) -> Result<()>
    where
        I: IntoIterator<Item = PricePoint>,
    {
        for point in points {
            self.add_price(point)?;
        }
        Ok(())
    }

    pub fn add_market_cap(
        &self,
        company_id: CompanyId,
        date: NaiveDate,
        value: Amount,
    ) -> Result<()> {
        self.write()?
            .market_caps
            .entry(company_id)
            .or_default()
            .insert(date, value);
        Ok(())
    }

    /// Record a cash dividend per share paid on `date`
    pub fn add_dividend(
        &self,
        company_id: CompanyId,
        date: NaiveDate,
        per_share: f64,
    ) -> Result<()> {
        if per_share < 0.0 {
            return Err(FundamentalsError::DataError(format!(
                "Dividend must be non-negative, got: {}",
                per_share
            )));
        }
        let mut tables = self.write()?;
        *tables
            .dividends
            .entry(company_id)
            .or_default()
            .entry(date)
            .or_insert(0.0) += per_share;
        Ok(())
    }

    /// Number of statements held
    pub fn statement_count(&self) -> Result<usize> {
        Ok(self.read()?.statements.values().map(BTreeMap::len).sum())
    }

    /// Number of price points held
    pub fn price_count(&self) -> Result<usize> {
        Ok(self.read()?.prices.values().map(BTreeMap::len).sum())
    }
}

impl StatementStore for InMemoryStore {
    fn get_statement(
        &self,
        company_id: CompanyId,
        period: PeriodKey,
    ) -> Result<Option<StatementPeriod>> {
        let tables = self.read()?;
        Ok(tables
            .statements
            .get(&company_id)
            .and_then(|periods| periods.get(&period))
            .cloned())
    }

    fn get_prior_statement(
        &self,
        company_id: CompanyId,
        period: PeriodKey,
    ) -> Result<Option<StatementPeriod>> {
        let tables = self.read()?;
        Ok(tables
            .statements
            .get(&company_id)
            .and_then(|periods| periods.range(..period).next_back())
            .map(|(_, s)| s.clone()))
    }

    fn get_recent_statements(
        &self,
        company_id: CompanyId,
        period: PeriodKey,
        count: usize,
    ) -> Result<Vec<StatementPeriod>> {
        let tables = self.read()?;
        Ok(tables
            .statements
            .get(&company_id)
            .map(|periods| {
                periods
                    .range(..=period)
                    .rev()
                    .take(count)
                    .map(|(_, s)| s.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn latest_period(&self, company_id: CompanyId) -> Result<Option<PeriodKey>> {
        let tables = self.read()?;
        Ok(tables
            .statements
            .get(&company_id)
            .and_then(|periods| periods.keys().next_back().copied()))
    }

    fn get_market_cap(&self, company_id: CompanyId, as_of: NaiveDate) -> Result<Option<Amount>> {
        let tables = self.read()?;
        Ok(tables
            .market_caps
            .get(&company_id)
            .and_then(|caps| caps.range(..=as_of).next_back())
            .map(|(_, v)| *v))
    }

    fn get_trailing_dividends_per_share(
        &self,
        company_id: CompanyId,
        as_of: NaiveDate,
    ) -> Result<Option<f64>> {
        let tables = self.read()?;
        let Some(paid) = tables.dividends.get(&company_id) else {
            return Ok(None);
        };
        let start = as_of - Duration::days(365);
        let total = paid
            .range(..=as_of)
            .filter(|(date, _)| **date > start)
            .map(|(_, v)| *v)
            .sum::<f64>();
        Ok(Some(total))
    }

    fn get_company(&self, company_id: CompanyId) -> Result<Option<Company>> {
        Ok(self.read()?.companies.get(&company_id).cloned())
    }

    fn companies(&self) -> Result<Vec<Company>> {
        let tables = self.read()?;
        let mut companies: Vec<Company> = tables.companies.values().cloned().collect();
        companies.sort_by_key(|c| c.id);
        Ok(companies)
    }
}

impl PriceStore for InMemoryStore {
    fn get_price_series(
        &self,
        company_id: CompanyId,
        as_of: NaiveDate,
        window_size: usize,
    ) -> Result<Vec<(NaiveDate, Price)>> {
        let tables = self.read()?;
        let Some(series) = tables.prices.get(&company_id) else {
            return Ok(Vec::new());
        };
        let mut points: Vec<(NaiveDate, Price)> = series
            .range(..=as_of)
            .rev()
            .take(window_size)
            .map(|(date, p)| (*date, p.close))
            .collect();
        points.reverse();
        Ok(points)
    }

    fn get_latest_close(&self, company_id: CompanyId) -> Result<Option<(NaiveDate, Price)>> {
        let tables = self.read()?;
        Ok(tables
            .prices
            .get(&company_id)
            .and_then(|series| series.iter().next_back())
            .map(|(date, p)| (*date, p.close)))
    }
}
