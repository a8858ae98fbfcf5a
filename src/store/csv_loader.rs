//! CSV data directory loader
//!
//! A data directory holds up to five files with header rows:
//!
//! | file              | columns                                                        |
//! |-------------------|----------------------------------------------------------------|
//! | `companies.csv`   | id, stock_code, name, industry, market, listing_date, capital  |
//! | `statements.csv`  | company_id, year, season, then any `StatementPeriod` field     |
//! | `prices.csv`      | company_id, date, open, high, low, close, volume, change_percent |
//! | `market_caps.csv` | company_id, date, market_cap                                   |
//! | `dividends.csv`   | company_id, date, cash_dividend                                |
//!
//! Missing files are skipped. Rows that fail to parse are logged and skipped.

use super::memory::InMemoryStore;
use crate::company::{Company, Market};
use crate::error::{FundamentalsError, Result};
use crate::price::PricePoint;
use crate::statement::StatementPeriod;
use crate::types::{Amount, CompanyId};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const COMPANIES_FILE: &str = "companies.csv";
pub const STATEMENTS_FILE: &str = "statements.csv";
pub const PRICES_FILE: &str = "prices.csv";
pub const MARKET_CAPS_FILE: &str = "market_caps.csv";
pub const DIVIDENDS_FILE: &str = "dividends.csv";

#[derive(Debug, Deserialize)]
struct CompanyRow {
    id: CompanyId,
    stock_code: String,
    name: String,
    #[serde(default)]
    industry: Option<String>,
    market: String,
    #[serde(default)]
    listing_date: Option<NaiveDate>,
    #[serde(default)]
    capital: Option<u64>,
}

impl CompanyRow {
    fn into_company(self) -> Result<Company> {
        let market: Market = self.market.parse()?;
        let mut company = Company::new(self.id, self.stock_code, self.name, market);
        company.industry = self.industry.filter(|s| !s.trim().is_empty());
        company.listing_date = self.listing_date;
        company.capital = self.capital;
        Ok(company)
    }
}

#[derive(Debug, Deserialize)]
struct MarketCapRow {
    company_id: CompanyId,
    date: NaiveDate,
    market_cap: Amount,
}

#[derive(Debug, Deserialize)]
struct DividendRow {
    company_id: CompanyId,
    date: NaiveDate,
    cash_dividend: f64,
}

/// Row counts of one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub companies: usize,
    pub statements: usize,
    pub prices: usize,
    pub market_caps: usize,
    pub dividends: usize,
    /// Rows rejected by parsing or validation
    pub skipped: usize,
}

impl LoadSummary {
    pub fn total(&self) -> usize {
        self.companies + self.statements + self.prices + self.market_caps + self.dividends
    }
}

/// Loads a CSV data directory into an [`InMemoryStore`]
#[derive(Debug, Clone)]
pub struct CsvLoader {
    dir: PathBuf,
}

impl CsvLoader {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Load every file present in the directory into a fresh store
    pub fn load(&self) -> Result<(InMemoryStore, LoadSummary)> {
        let store = InMemoryStore::new();
        let summary = self.load_into(&store)?;
        Ok((store, summary))
    }

    /// Load every file present in the directory into `store`
    pub fn load_into(&self, store: &InMemoryStore) -> Result<LoadSummary> {
        if !self.dir.is_dir() {
            return Err(FundamentalsError::DataError(format!(
                "Data directory not found: {}",
                self.dir.display()
            )));
        }

        let mut summary = LoadSummary::default();

        summary.companies = self.load_file(COMPANIES_FILE, &mut summary.skipped, |row: CompanyRow| {
            store.add_company(row.into_company()?)
        })?;
        summary.statements =
            self.load_file(STATEMENTS_FILE, &mut summary.skipped, |row: StatementPeriod| {
                store.add_statement(row)
            })?;
        summary.prices = self.load_file(PRICES_FILE, &mut summary.skipped, |row: PricePoint| {
            store.add_price(row)
        })?;
        summary.market_caps =
            self.load_file(MARKET_CAPS_FILE, &mut summary.skipped, |row: MarketCapRow| {
                store.add_market_cap(row.company_id, row.date, row.market_cap)
            })?;
        summary.dividends =
            self.load_file(DIVIDENDS_FILE, &mut summary.skipped, |row: DividendRow| {
                store.add_dividend(row.company_id, row.date, row.cash_dividend)
            })?;

        log::info!(
            "Loaded {} rows from {} ({} skipped)",
            summary.total(),
            self.dir.display(),
            summary.skipped
        );
        Ok(summary)
    }

    fn load_file<T, F>(&self, name: &str, skipped: &mut usize, mut insert: F) -> Result<usize>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> Result<()>,
    {
        let path = self.dir.join(name);
        if !path.exists() {
            log::debug!("{} not present, skipping", path.display());
            return Ok(0);
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)?;

        let mut loaded = 0;
        for (line, row) in reader.deserialize::<T>().enumerate() {
            // header is line 1
            let line = line + 2;
            let outcome = row
                .map_err(FundamentalsError::from)
                .and_then(|row| insert(row));
            match outcome {
                Ok(()) => loaded += 1,
                Err(e) => {
                    log::warn!("{}:{}: skipping row: {}", name, line, e);
                    *skipped += 1;
                }
            }
        }

        log::debug!("Loaded {} rows from {}", loaded, path.display());
        Ok(loaded)
    }
}
