//! Screener over the latest indicator per company
//!
//! Readers take an [`IndicatorSnapshot`] out of a [`SnapshotCell`] and query
//! it; a recompute builds a new snapshot and publishes it in one swap, so a
//! query never sees a half-updated record set.

use crate::company::{Company, Market};
use crate::config::ScreenerConfig;
use crate::error::{FundamentalsError, Result};
use crate::indicator::{Indicator, NumericField};
use crate::pipeline::classifiers::Signal;
use crate::types::CompanyId;
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::{Arc, RwLock};

/// Optional screening predicates; every supplied one must hold
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerFilter {
    pub roe_min: Option<f64>,
    pub roe_max: Option<f64>,
    pub pe_min: Option<f64>,
    pub pe_max: Option<f64>,
    pub pb_min: Option<f64>,
    pub pb_max: Option<f64>,
    pub current_ratio_min: Option<f64>,
    pub f_score_min: Option<u8>,
    pub cbs_score_min: Option<u8>,
    /// Any of these signals
    pub signal: Vec<Signal>,
    /// Any of these industries
    pub industry: Vec<String>,
    /// Any of these venues
    pub market: Vec<Market>,
}

impl ScreenerFilter {
    fn ranges(&self) -> [(NumericField, Option<f64>, Option<f64>); 6] {
        [
            (NumericField::Roe, self.roe_min, self.roe_max),
            (NumericField::PeTtm, self.pe_min, self.pe_max),
            (NumericField::PbRatio, self.pb_min, self.pb_max),
            (NumericField::CurrentRatio, self.current_ratio_min, None),
            (NumericField::FScore, self.f_score_min.map(f64::from), None),
            (NumericField::CbsScore, self.cbs_score_min.map(f64::from), None),
        ]
    }

    /// Reject bounds that cannot match anything meaningful
    pub fn validate(&self) -> Result<()> {
        for (field, min, max) in self.ranges() {
            for bound in [min, max].into_iter().flatten() {
                if !bound.is_finite() {
                    return Err(FundamentalsError::InvalidFilter(format!(
                        "{} bound must be finite, got {}",
                        field, bound
                    )));
                }
            }
            if let (Some(min), Some(max)) = (min, max) {
                if min > max {
                    return Err(FundamentalsError::InvalidFilter(format!(
                        "{} minimum {} exceeds maximum {}",
                        field, min, max
                    )));
                }
            }
        }
        if self.f_score_min.map_or(false, |v| v > 9) {
            return Err(FundamentalsError::InvalidFilter(
                "f_score_min must be at most 9".to_string(),
            ));
        }
        if self.cbs_score_min.map_or(false, |v| v > 100) {
            return Err(FundamentalsError::InvalidFilter(
                "cbs_score_min must be at most 100".to_string(),
            ));
        }
        Ok(())
    }

    /// Compile the supplied predicates
    pub fn predicates(&self) -> Vec<Box<dyn Predicate>> {
        let mut predicates: Vec<Box<dyn Predicate>> = self
            .ranges()
            .into_iter()
            .filter(|(_, min, max)| min.is_some() || max.is_some())
            .map(|(field, min, max)| {
                Box::new(RangePredicate { field, min, max }) as Box<dyn Predicate>
            })
            .collect();

        if !self.signal.is_empty() {
            predicates.push(Box::new(SignalIn(self.signal.iter().copied().collect())));
        }
        if !self.industry.is_empty() {
            predicates.push(Box::new(IndustryIn(
                self.industry.iter().map(|s| s.trim().to_string()).collect(),
            )));
        }
        if !self.market.is_empty() {
            predicates.push(Box::new(MarketIn(self.market.iter().copied().collect())));
        }
        predicates
    }
}

/// One screening condition over a company and its latest indicator
pub trait Predicate: Send + Sync {
    fn matches(&self, company: &Company, indicator: &Indicator) -> bool;

    fn name(&self) -> &str {
        "Predicate"
    }
}

/// Inclusive range over a numeric field; an undefined value never matches
#[derive(Debug, Clone, Copy)]
pub struct RangePredicate {
    pub field: NumericField,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Predicate for RangePredicate {
    fn matches(&self, _company: &Company, indicator: &Indicator) -> bool {
        let Some(value) = indicator.field(self.field).filter(|v| v.is_finite()) else {
            return false;
        };
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    fn name(&self) -> &str {
        "RangePredicate"
    }
}

/// Signal membership
#[derive(Debug, Clone)]
pub struct SignalIn(pub HashSet<Signal>);

impl Predicate for SignalIn {
    fn matches(&self, _company: &Company, indicator: &Indicator) -> bool {
        self.0.contains(&indicator.signal)
    }

    fn name(&self) -> &str {
        "SignalIn"
    }
}

/// Industry membership; a company without an industry never matches
#[derive(Debug, Clone)]
pub struct IndustryIn(pub HashSet<String>);

impl Predicate for IndustryIn {
    fn matches(&self, company: &Company, _indicator: &Indicator) -> bool {
        company
            .industry
            .as_deref()
            .map_or(false, |industry| self.0.contains(industry))
    }

    fn name(&self) -> &str {
        "IndustryIn"
    }
}

/// Market venue membership
#[derive(Debug, Clone)]
pub struct MarketIn(pub HashSet<Market>);

impl Predicate for MarketIn {
    fn matches(&self, company: &Company, _indicator: &Indicator) -> bool {
        self.0.contains(&company.market)
    }

    fn name(&self) -> &str {
        "MarketIn"
    }
}

/// Immutable view of company metadata plus the latest indicator per company
#[derive(Debug, Clone, Default)]
pub struct IndicatorSnapshot {
    companies: Arc<HashMap<CompanyId, Company>>,
    indicators: Arc<HashMap<CompanyId, Indicator>>,
}

impl IndicatorSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// New snapshot with these companies added or replaced
    pub fn with_companies<I>(&self, companies: I) -> Self
    where
        I: IntoIterator<Item = Company>,
    {
        let mut map = (*self.companies).clone();
        for company in companies {
            map.insert(company.id, company);
        }
        Self {
            companies: Arc::new(map),
            indicators: Arc::clone(&self.indicators),
        }
    }

    /// New snapshot where each company keeps its most recent indicator
    pub fn with_indicators<I>(&self, indicators: I) -> Self
    where
        I: IntoIterator<Item = Indicator>,
    {
        let mut map = (*self.indicators).clone();
        for indicator in indicators {
            match map.get(&indicator.company_id) {
                Some(current) if current.recency_key() > indicator.recency_key() => {}
                _ => {
                    map.insert(indicator.company_id, indicator);
                }
            }
        }
        Self {
            companies: Arc::clone(&self.companies),
            indicators: Arc::new(map),
        }
    }

    pub fn company(&self, company_id: CompanyId) -> Option<&Company> {
        self.companies.get(&company_id)
    }

    pub fn latest(&self, company_id: CompanyId) -> Option<&Indicator> {
        self.indicators.get(&company_id)
    }

    pub fn company_count(&self) -> usize {
        self.companies.len()
    }

    pub fn indicator_count(&self) -> usize {
        self.indicators.len()
    }

    /// Companies paired with their latest indicator
    pub fn entries(&self) -> impl Iterator<Item = (&Company, &Indicator)> + '_ {
        self.indicators
            .iter()
            .filter_map(|(id, indicator)| self.companies.get(id).map(|c| (c, indicator)))
    }
}

/// Shared slot holding the current snapshot
#[derive(Debug, Default)]
pub struct SnapshotCell {
    current: RwLock<Arc<IndicatorSnapshot>>,
}

impl SnapshotCell {
    pub fn new(snapshot: IndicatorSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Current snapshot; stays valid after later publishes
    pub fn load(&self) -> Result<Arc<IndicatorSnapshot>> {
        self.current
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|e| FundamentalsError::DataError(format!("Snapshot lock poisoned: {}", e)))
    }

    /// Replace the current snapshot
    pub fn publish(&self, snapshot: IndicatorSnapshot) -> Result<()> {
        let mut guard = self
            .current
            .write()
            .map_err(|e| FundamentalsError::DataError(format!("Snapshot lock poisoned: {}", e)))?;
        *guard = Arc::new(snapshot);
        Ok(())
    }
}

/// Company with its latest indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenedCompany {
    pub company: Company,
    pub indicator: Indicator,
}

/// One page of screener results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenResult {
    /// Matches across all pages
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub items: Vec<ScreenedCompany>,
}

/// Orders by composite score descending (undefined last), then stock code
fn rank(a: &(&Company, &Indicator), b: &(&Company, &Indicator)) -> Ordering {
    let by_score = match (a.1.cbs_score, b.1.cbs_score) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_score
        .then_with(|| a.0.stock_code.cmp(&b.0.stock_code))
        .then_with(|| a.0.id.cmp(&b.0.id))
}

/// Multi-predicate screener
#[derive(Debug, Clone, Default)]
pub struct Screener {
    config: ScreenerConfig,
}

impl Screener {
    pub fn new(config: ScreenerConfig) -> Self {
        Self { config }
    }

    pub fn default_page_size(&self) -> usize {
        self.config.default_page_size
    }

    fn validate_page(&self, page: usize, page_size: usize) -> Result<()> {
        if page == 0 {
            return Err(FundamentalsError::InvalidFilter(
                "page must be at least 1".to_string(),
            ));
        }
        if page_size == 0 {
            return Err(FundamentalsError::InvalidFilter(
                "page_size must be positive".to_string(),
            ));
        }
        if page_size > self.config.max_page_size {
            return Err(FundamentalsError::InvalidFilter(format!(
                "page_size {} exceeds maximum {}",
                page_size, self.config.max_page_size
            )));
        }
        Ok(())
    }

    /// Run a filter over a snapshot and return one page of the ordered matches
    pub fn screen(
        &self,
        snapshot: &IndicatorSnapshot,
        filter: &ScreenerFilter,
        page: usize,
        page_size: usize,
    ) -> Result<ScreenResult> {
        self.validate_page(page, page_size)?;
        filter.validate()?;

        let predicates = filter.predicates();
        let mut matched: Vec<(&Company, &Indicator)> = snapshot
            .entries()
            .filter(|(company, indicator)| predicates.iter().all(|p| p.matches(company, indicator)))
            .collect();
        matched.sort_by(rank);

        let total = matched.len();
        let items = matched
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .map(|(company, indicator)| ScreenedCompany {
                company: company.clone(),
                indicator: indicator.clone(),
            })
            .collect();

        log::debug!(
            "Screen with {} predicates matched {} of {} companies",
            predicates.len(),
            total,
            snapshot.indicator_count()
        );

        Ok(ScreenResult {
            total,
            page,
            page_size,
            items,
        })
    }
}
