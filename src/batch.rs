//! Universe-wide recomputation
//!
//! Each company is an independent unit of work run on a private rayon pool.
//! Units share nothing; their outcomes are collected as `(company_id,
//! outcome)` pairs and merged into a [`BatchReport`] once the pool is done.

use crate::error::{FundamentalsError, Result};
use crate::indicator::Indicator;
use crate::pipeline::engine::IndicatorEngine;
use crate::pipeline::trend::TrendAnalysis;
use crate::screener::{IndicatorSnapshot, SnapshotCell};
use crate::types::CompanyId;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Cooperative cancellation flag shared between a caller and a batch
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; units not yet started are skipped
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Result of one company unit
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Computed(T),
    /// Not enough data; not an error
    Undefined,
    /// A store failure
    Failed(String),
    /// Not run because the batch was cancelled
    Skipped,
}

impl<T> Outcome<T> {
    fn from_result(result: Result<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Outcome::Computed(value),
            Ok(None) => Outcome::Undefined,
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}

/// Outcomes of a batch keyed by company id
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport<T> {
    outcomes: BTreeMap<CompanyId, Outcome<T>>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            outcomes: BTreeMap::new(),
        }
    }
}

impl<T> BatchReport<T> {
    fn from_pairs(pairs: Vec<(CompanyId, Outcome<T>)>) -> Self {
        Self {
            outcomes: pairs.into_iter().collect(),
        }
    }

    pub fn get(&self, company_id: CompanyId) -> Option<&Outcome<T>> {
        self.outcomes.get(&company_id)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (CompanyId, &Outcome<T>)> + '_ {
        self.outcomes.iter().map(|(id, outcome)| (*id, outcome))
    }

    /// Successfully computed values in company id order
    pub fn computed(&self) -> impl Iterator<Item = &T> + '_ {
        self.outcomes.values().filter_map(|outcome| match outcome {
            Outcome::Computed(value) => Some(value),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&Outcome<T>) -> bool) -> usize {
        self.outcomes.values().filter(|o| pred(o)).count()
    }

    pub fn computed_count(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Computed(_)))
    }

    pub fn undefined_count(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Undefined))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// `Err(Cancelled)` when any unit was skipped
    pub fn ensure_complete(&self) -> Result<()> {
        let skipped = self.skipped_count();
        if skipped > 0 {
            return Err(FundamentalsError::Cancelled {
                completed: self.len() - skipped,
                total: self.len(),
            });
        }
        Ok(())
    }
}

/// Runs engine computations across many companies
pub struct BatchRunner {
    engine: IndicatorEngine,
    pool: rayon::ThreadPool,
}

impl BatchRunner {
    /// Build a runner with a pool sized by the engine's batch configuration
    pub fn new(engine: IndicatorEngine) -> Result<Self> {
        let workers = engine.config().batch.workers.unwrap_or(0);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("fundamentals-batch-{i}"))
            .build()
            .map_err(|e| {
                FundamentalsError::InvalidConfig(format!("Failed to build worker pool: {}", e))
            })?;
        Ok(Self { engine, pool })
    }

    pub fn engine(&self) -> &IndicatorEngine {
        &self.engine
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Ids of every company in the statement store
    pub fn universe(&self) -> Result<Vec<CompanyId>> {
        Ok(self
            .engine
            .statements()
            .companies()?
            .into_iter()
            .map(|c| c.id)
            .collect())
    }

    fn run<T, F>(
        &self,
        label: &str,
        ids: &[CompanyId],
        cancel: &CancellationToken,
        unit: F,
    ) -> BatchReport<T>
    where
        T: Send,
        F: Fn(CompanyId) -> Result<Option<T>> + Sync,
    {
        let started = Instant::now();
        let done = AtomicUsize::new(0);
        log::info!(
            "Recomputing {} for {} companies on {} workers",
            label,
            ids.len(),
            self.workers()
        );

        let pairs: Vec<(CompanyId, Outcome<T>)> = self.pool.install(|| {
            ids.par_iter()
                .map(|&id| {
                    if cancel.is_cancelled() {
                        return (id, Outcome::Skipped);
                    }
                    let outcome = Outcome::from_result(unit(id));
                    match &outcome {
                        Outcome::Undefined => log::debug!("Company {}: {} undefined", id, label),
                        Outcome::Failed(e) => log::warn!("Company {}: {} failed: {}", id, label, e),
                        _ => {}
                    }
                    done.fetch_add(1, Ordering::Relaxed);
                    (id, outcome)
                })
                .collect()
        });

        let report = BatchReport::from_pairs(pairs);
        if report.skipped_count() > 0 {
            log::warn!(
                "Cancelled {} batch after {} of {} companies",
                label,
                done.load(Ordering::Relaxed),
                report.len()
            );
        }
        log::info!(
            "Finished {}: {} computed, {} undefined, {} failed, {} skipped in {:.2?}",
            label,
            report.computed_count(),
            report.undefined_count(),
            report.failed_count(),
            report.skipped_count(),
            started.elapsed()
        );
        report
    }

    /// Latest indicator of each company
    pub fn recompute_indicators(
        &self,
        ids: &[CompanyId],
        cancel: &CancellationToken,
    ) -> BatchReport<Indicator> {
        self.run("indicators", ids, cancel, |id| self.engine.compute_latest_indicator(id))
    }

    /// Trend channel of each company as of `as_of`
    pub fn recompute_trends(
        &self,
        ids: &[CompanyId],
        as_of: NaiveDate,
        cancel: &CancellationToken,
    ) -> BatchReport<TrendAnalysis> {
        self.run("trends", ids, cancel, |id| self.engine.compute_trend(id, as_of))
    }

    /// Publish a snapshot built from the current one plus freshly computed
    /// indicators. Readers holding the previous snapshot keep it intact.
    pub fn refresh_snapshot(
        &self,
        cell: &SnapshotCell,
        report: &BatchReport<Indicator>,
    ) -> Result<Arc<IndicatorSnapshot>> {
        let current = cell.load()?;

        let mut companies = Vec::new();
        for indicator in report.computed() {
            if let Some(company) = self.engine.statements().get_company(indicator.company_id)? {
                companies.push(company);
            }
        }

        let next = current
            .with_companies(companies)
            .with_indicators(report.computed().cloned());
        cell.publish(next)?;
        let published = cell.load()?;
        log::info!(
            "Published snapshot with {} indicators",
            published.indicator_count()
        );
        Ok(published)
    }
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("engine", &self.engine)
            .field("workers", &self.workers())
            .finish()
    }
}
