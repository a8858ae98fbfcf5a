//! Batch recompute, failure isolation and cooperative cancellation

mod common;

use chrono::NaiveDate;
use common::{date, universe};
use rusty_fundamentals::prelude::*;
use std::sync::Arc;

/// Delegating store that fails one company and can trip a cancel token
struct FlakyStore {
    inner: Arc<InMemoryStore>,
    failing: CompanyId,
    cancel_on: Option<(CompanyId, CancellationToken)>,
}

impl FlakyStore {
    fn check(&self, company_id: CompanyId) -> Result<()> {
        if let Some((id, token)) = &self.cancel_on {
            if *id == company_id {
                token.cancel();
            }
        }
        if company_id == self.failing {
            return Err(FundamentalsError::DataError("statement backend unavailable".into()));
        }
        Ok(())
    }
}

impl StatementStore for FlakyStore {
    fn get_statement(
        &self,
        company_id: CompanyId,
        period: PeriodKey,
    ) -> Result<Option<StatementPeriod>> {
        self.inner.get_statement(company_id, period)
    }

    fn get_prior_statement(
        &self,
        company_id: CompanyId,
        period: PeriodKey,
    ) -> Result<Option<StatementPeriod>> {
        self.inner.get_prior_statement(company_id, period)
    }

    fn get_recent_statements(
        &self,
        company_id: CompanyId,
        period: PeriodKey,
        count: usize,
    ) -> Result<Vec<StatementPeriod>> {
        self.inner.get_recent_statements(company_id, period, count)
    }

    fn latest_period(&self, company_id: CompanyId) -> Result<Option<PeriodKey>> {
        self.check(company_id)?;
        self.inner.latest_period(company_id)
    }

    fn get_market_cap(&self, company_id: CompanyId, as_of: NaiveDate) -> Result<Option<Amount>> {
        self.inner.get_market_cap(company_id, as_of)
    }

    fn get_company(&self, company_id: CompanyId) -> Result<Option<Company>> {
        self.inner.get_company(company_id)
    }

    fn companies(&self) -> Result<Vec<Company>> {
        self.inner.companies()
    }
}

fn runner_with(store: FlakyStore, prices: Arc<InMemoryStore>, workers: usize) -> BatchRunner {
    let mut config = EngineConfig::default();
    config.batch.workers = Some(workers);
    let engine = IndicatorEngine::new(Arc::new(store), prices, config).unwrap();
    BatchRunner::new(engine).unwrap()
}

#[test]
fn test_recompute_whole_universe() {
    let fx = universe();
    let runner = BatchRunner::new(fx.engine).unwrap();
    let ids = runner.universe().unwrap();
    let report = runner.recompute_indicators(&ids, &CancellationToken::new());

    assert_eq!(report.len(), 6);
    assert_eq!(report.computed_count(), 6);
    assert!(report.ensure_complete().is_ok());
    let computed_ids: Vec<CompanyId> = report.computed().map(|i| i.company_id).collect();
    assert_eq!(computed_ids, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_unknown_company_is_undefined() {
    let fx = universe();
    let runner = BatchRunner::new(fx.engine).unwrap();
    let report = runner.recompute_indicators(&[1, 42], &CancellationToken::new());
    assert!(matches!(report.get(1), Some(Outcome::Computed(_))));
    assert_eq!(report.get(42), Some(&Outcome::Undefined));
}

#[test]
fn test_store_failure_isolated_to_company() {
    let fx = universe();
    let store = FlakyStore {
        inner: fx.store.clone(),
        failing: 3,
        cancel_on: None,
    };
    let runner = runner_with(store, fx.store.clone(), 2);
    let report = runner.recompute_indicators(&[1, 2, 3, 4], &CancellationToken::new());

    assert_eq!(report.computed_count(), 3);
    assert_eq!(report.failed_count(), 1);
    match report.get(3) {
        Some(Outcome::Failed(message)) => assert!(message.contains("unavailable")),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn test_pre_cancelled_batch_skips_everything() {
    let fx = universe();
    let runner = BatchRunner::new(fx.engine).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = runner.recompute_trends(&[1, 2, 3], date(2024, 6, 30), &cancel);
    assert_eq!(report.skipped_count(), 3);
    assert!(matches!(
        report.ensure_complete(),
        Err(FundamentalsError::Cancelled { completed: 0, total: 3 })
    ));
}

#[test]
fn test_cancel_mid_batch() {
    let fx = universe();
    let cancel = CancellationToken::new();
    let store = FlakyStore {
        inner: fx.store.clone(),
        failing: 0,
        cancel_on: Some((1, cancel.clone())),
    };
    let runner = runner_with(store, fx.store.clone(), 1);
    let ids: Vec<CompanyId> = (1..=6).collect();
    let report = runner.recompute_indicators(&ids, &cancel);

    // the unit that tripped the token still completes
    assert!(matches!(report.get(1), Some(Outcome::Computed(_))));
    assert!(report.skipped_count() > 0);
    assert_eq!(
        report.computed_count() + report.skipped_count(),
        ids.len()
    );
    assert!(report.ensure_complete().is_err());
}

#[test]
fn test_recompute_trends() {
    let fx = universe();
    let runner = BatchRunner::new(fx.engine).unwrap();
    let report = runner.recompute_trends(&[1, 2, 99], date(2024, 3, 31), &CancellationToken::new());

    assert_eq!(report.computed_count(), 2);
    assert_eq!(report.get(99), Some(&Outcome::Undefined));
    for trend in report.computed() {
        assert!(trend.sd_minus_2 <= trend.trend_line && trend.trend_line <= trend.sd_plus_2);
        assert_eq!(trend.calculation_date, date(2024, 3, 31));
    }
}

#[test]
fn test_bounded_pool_size() {
    let fx = universe();
    let store = FlakyStore {
        inner: fx.store.clone(),
        failing: 0,
        cancel_on: None,
    };
    let runner = runner_with(store, fx.store.clone(), 3);
    assert_eq!(runner.workers(), 3);
}
