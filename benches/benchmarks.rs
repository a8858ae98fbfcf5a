use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rusty_fundamentals::{
    batch::{BatchRunner, CancellationToken},
    company::{Company, Market},
    config::{EngineConfig, TrendConfig},
    pipeline::{trend::TrendAnalyzer, IndicatorEngine},
    price::PricePoint,
    screener::{Screener, ScreenerFilter, SnapshotCell},
    statement::{PeriodKey, StatementPeriod},
    store::InMemoryStore,
};
use std::sync::Arc;

fn synthetic_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + i as f64 * 0.05 + (i as f64 * 0.7).sin() * 3.0)
        .collect()
}

fn benchmark_trend_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("trend_fit");
    let date = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
    for &n in &[250usize, 1278] {
        let closes = synthetic_closes(n);
        for log_scale in [false, true] {
            let analyzer = TrendAnalyzer::new(TrendConfig {
                window_size: n,
                use_log_scale: log_scale,
                min_points: 2,
            });
            let id = format!("{}{}", n, if log_scale { "_log" } else { "" });
            group.bench_with_input(BenchmarkId::from_parameter(id), &closes, |b, closes| {
                b.iter(|| analyzer.analyze(1, date, black_box(closes)));
            });
        }
    }
    group.finish();
}

fn build_universe(companies: u64) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    for id in 1..=companies {
        store
            .add_company(Company::new(
                id,
                format!("{:04}", 1000 + id),
                format!("Company {}", id),
                Market::Listed,
            ))
            .unwrap();
        for (year, season) in [(2023, 3), (2023, 4), (2024, 1), (2024, 2), (2024, 3)] {
            let mut s = StatementPeriod::new(id, PeriodKey::new(year, season).unwrap());
            let scale = 1.0 + (id % 7) as f64 * 0.1 + f64::from(season) * 0.01;
            s.revenue = Some(1000.0 * scale);
            s.net_income = Some(80.0 * scale);
            s.gross_profit = Some(350.0 * scale);
            s.total_assets = Some(900.0);
            s.total_equity = Some(450.0);
            s.total_liabilities = Some(450.0);
            s.current_assets = Some(300.0);
            s.current_liabilities = Some(160.0);
            s.inventory = Some(40.0);
            s.shares_outstanding = Some(10.0);
            store.add_statement(s).unwrap();
        }
        let closes = synthetic_closes(1278);
        store
            .add_prices(
                closes
                    .iter()
                    .enumerate()
                    .map(|(day, close)| {
                        PricePoint::close_only(id, start + Duration::days(day as i64), *close)
                    }),
            )
            .unwrap();
        store.add_market_cap(id, start, 2000.0 + id as f64 * 10.0).unwrap();
    }
    store
}

fn benchmark_batch_recompute(c: &mut Criterion) {
    let store = build_universe(200);
    let engine = IndicatorEngine::new(store.clone(), store, EngineConfig::default()).unwrap();
    let runner = BatchRunner::new(engine).unwrap();
    let ids = runner.universe().unwrap();
    let as_of = NaiveDate::from_ymd_opt(2023, 6, 30).unwrap();

    c.bench_function("recompute_indicators_200", |b| {
        b.iter(|| runner.recompute_indicators(black_box(&ids), &CancellationToken::new()));
    });
    c.bench_function("recompute_trends_200", |b| {
        b.iter(|| runner.recompute_trends(black_box(&ids), as_of, &CancellationToken::new()));
    });
}

fn benchmark_screen(c: &mut Criterion) {
    let store = build_universe(500);
    let engine = IndicatorEngine::new(store.clone(), store, EngineConfig::default()).unwrap();
    let runner = BatchRunner::new(engine).unwrap();
    let ids = runner.universe().unwrap();
    let report = runner.recompute_indicators(&ids, &CancellationToken::new());
    let cell = SnapshotCell::default();
    let snapshot = runner.refresh_snapshot(&cell, &report).unwrap();

    let screener = Screener::default();
    let filter = ScreenerFilter {
        pe_max: Some(30.0),
        roe_min: Some(5.0),
        ..Default::default()
    };
    c.bench_function("screen_500", |b| {
        b.iter(|| screener.screen(black_box(&snapshot), &filter, 1, 50));
    });
}

criterion_group!(
    benches,
    benchmark_trend_fit,
    benchmark_batch_recompute,
    benchmark_screen
);
criterion_main!(benches);
