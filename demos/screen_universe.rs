//! Load a universe, recompute indicators and run a value screen
//!
//! Reads the five CSV files from the directory given as the first argument.
//! Without an argument a small built-in universe is used instead.
//!
//! Run with: cargo run --example screen_universe -- [data_dir]

use chrono::{Duration, NaiveDate};
use rusty_fundamentals::prelude::*;
use std::sync::Arc;

fn sample_universe() -> Result<InMemoryStore> {
    let store = InMemoryStore::new();
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .ok_or_else(|| FundamentalsError::DataError("invalid start date".to_string()))?;
    let companies = [
        (1, "2330", "Semiconductors", 120.0, 2000.0),
        (2, "2317", "Electronics", 45.0, 600.0),
        (3, "1101", "Cement", 20.0, 4000.0),
        (4, "2454", "Semiconductors", 60.0, 5000.0),
    ];

    for (id, code, industry, income, cap) in companies {
        store.add_company(
            Company::new(id, code.to_string(), format!("Company {}", code), Market::Listed)
                .with_industry(industry.to_string()),
        )?;

        let mut period = PeriodKey::new(2024, 4)?;
        for quarter in 0..5 {
            let mut s = StatementPeriod::new(id, period);
            let growth = 1.0 - quarter as f64 * 0.03;
            s.revenue = Some(1000.0 * growth);
            s.net_income = Some(income * growth);
            s.gross_profit = Some(400.0 * growth);
            s.operating_income = Some(150.0 * growth);
            s.total_assets = Some(800.0);
            s.total_equity = Some(400.0);
            s.total_liabilities = Some(400.0);
            s.current_assets = Some(300.0);
            s.current_liabilities = Some(150.0);
            s.inventory = Some(50.0);
            s.shares_outstanding = Some(10.0);
            s.operating_cash_flow = Some(income * growth * 1.2);
            store.add_statement(s)?;
            period = period.prior();
        }

        store.add_prices((0..300).map(|day| {
            let close = 50.0 + id as f64 + day as f64 * 0.1;
            PricePoint::close_only(id, start + Duration::days(day), close)
        }))?;
        store.add_market_cap(id, start, cap)?;
    }
    Ok(store)
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== Screen Universe Example ===\n");

    let store = match std::env::args().nth(1) {
        Some(dir) => {
            let (store, summary) = CsvLoader::new(&dir).load()?;
            println!(
                "Loaded {} records from {} ({} rows skipped)",
                summary.total(),
                dir,
                summary.skipped
            );
            store
        }
        None => {
            println!("No data directory given, using the built-in universe");
            sample_universe()?
        }
    };
    let store = Arc::new(store);

    let engine = IndicatorEngine::new(store.clone(), store, EngineConfig::default())?;
    let runner = BatchRunner::new(engine)?;
    let ids = runner.universe()?;

    let cancel = CancellationToken::new();
    let report = runner.recompute_indicators(&ids, &cancel);
    println!(
        "Recomputed {} companies on {} workers: {} computed, {} undefined, {} failed\n",
        report.len(),
        runner.workers(),
        report.computed_count(),
        report.undefined_count(),
        report.failed_count()
    );

    let cell = SnapshotCell::default();
    let snapshot = runner.refresh_snapshot(&cell, &report)?;

    let filter = ScreenerFilter {
        pe_max: Some(25.0),
        signal: vec![Signal::Undervalued, Signal::LowPrice, Signal::Medium],
        ..Default::default()
    };
    let result = Screener::default().screen(&snapshot, &filter, 1, 20)?;

    println!("{} of {} companies pass the screen", result.total, snapshot.company_count());
    for item in &result.items {
        let fmt = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{:.2}", v));
        println!(
            "  {} {:<16} PE {:>8}  PB {:>6}  CBS {:>4}  {}",
            item.company.stock_code,
            item.company.name,
            fmt(item.indicator.ratios.pe_ttm),
            fmt(item.indicator.ratios.pb_ratio),
            item.indicator.cbs_score.map_or("-".to_string(), |v| v.to_string()),
            item.indicator.signal
        );
    }

    Ok(())
}
