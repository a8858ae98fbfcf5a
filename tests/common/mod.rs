//! Shared fixture universe for integration tests

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use rusty_fundamentals::prelude::*;
use std::sync::Arc;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn period(year: i32, season: u8) -> PeriodKey {
    PeriodKey::new(year, season).unwrap()
}

/// Statement built around the reference figures, scaled by `scale`
pub fn statement(
    company_id: CompanyId,
    key: PeriodKey,
    scale: f64,
    net_income: f64,
) -> StatementPeriod {
    let mut s = StatementPeriod::new(company_id, key);
    s.revenue = Some(1000.0 * scale);
    s.net_income = Some(net_income * scale);
    s.gross_profit = Some(400.0 * scale);
    s.operating_income = Some(150.0 * scale);
    s.total_assets = Some(800.0 * scale);
    s.total_equity = Some(400.0 * scale);
    s.total_liabilities = Some(400.0 * scale);
    s.current_assets = Some(300.0 * scale);
    s.current_liabilities = Some(150.0 * scale);
    s.inventory = Some(50.0 * scale);
    s.cash_and_equivalents = Some(90.0 * scale);
    s.shares_outstanding = Some(10.0 * scale);
    s.operating_cash_flow = Some(net_income * scale * 1.2);
    s
}

pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub engine: IndicatorEngine,
}

/// Company spec: id, code, industry, market, quarterly net income, market cap
type Spec = (CompanyId, &'static str, Option<&'static str>, Market, [f64; 5], Option<f64>);

/// Six companies with five quarters each (2023Q4..=2024Q4) and 300 daily
/// closes from 2024-01-01 rising 0.1 a day with a +0.5/0/-0.5/0 wiggle.
/// Equity is 400 for everyone, so PB = cap / 400.
///
/// | id | code | TTM income | cap  | PE    | PB    | signal      |
/// |----|------|------------|------|-------|-------|-------------|
/// | 1  | 2330 | 460        | 350  | 0.76  | 0.875 | Undervalued |
/// | 2  | 2317 | 180        | 500  | 2.78  | 1.25  | LowPrice    |
/// | 3  | 1101 | 80         | 4000 | 50    | 10    | Overheated  |
/// | 4  | 6488 | < 0        | 900  | n/a   | 2.25  | Watch       |
/// | 5  | 2002 | 120        | n/a  | n/a   | n/a   | Watch       |
/// | 6  | 2454 | 200        | 4000 | 20    | 10    | Medium      |
pub fn universe() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let specs: [Spec; 6] = [
        (
            1,
            "2330",
            Some("Semiconductors"),
            Market::Listed,
            [90.0, 100.0, 110.0, 120.0, 130.0],
            Some(350.0),
        ),
        (
            2,
            "2317",
            Some("Electronics"),
            Market::Listed,
            [40.0, 40.0, 45.0, 45.0, 50.0],
            Some(500.0),
        ),
        (
            3,
            "1101",
            Some("Cement"),
            Market::Listed,
            [20.0, 20.0, 20.0, 20.0, 20.0],
            Some(4000.0),
        ),
        (
            4,
            "6488",
            Some("Semiconductors"),
            Market::Otc,
            [-10.0, -20.0, -5.0, -10.0, -15.0],
            Some(900.0),
        ),
        (5, "2002", None, Market::Emerging, [30.0, 30.0, 30.0, 30.0, 30.0], None),
        (
            6,
            "2454",
            Some("Semiconductors"),
            Market::Listed,
            [50.0, 50.0, 50.0, 50.0, 50.0],
            Some(4000.0),
        ),
    ];
    let periods = [
        period(2023, 4),
        period(2024, 1),
        period(2024, 2),
        period(2024, 3),
        period(2024, 4),
    ];

    for (id, code, industry, market, incomes, cap) in specs {
        let mut company = Company::new(id, code.to_string(), format!("Company {}", code), market);
        if let Some(industry) = industry {
            company = company.with_industry(industry.to_string());
        }
        store.add_company(company).unwrap();

        for (key, income) in periods.iter().zip(incomes) {
            store.add_statement(statement(id, *key, 1.0, income)).unwrap();
        }

        let start = date(2024, 1, 1);
        for day in 0..300 {
            let noise = match day % 4 {
                0 => 0.5,
                2 => -0.5,
                _ => 0.0,
            };
            let close = 50.0 + id as f64 + day as f64 * 0.1 + noise;
            store
                .add_price(PricePoint::close_only(id, start + Duration::days(day), close))
                .unwrap();
        }
        if let Some(cap) = cap {
            store.add_market_cap(id, date(2024, 1, 1), cap).unwrap();
        }
    }

    let engine =
        IndicatorEngine::new(store.clone(), store.clone(), EngineConfig::default()).unwrap();
    Fixture { store, engine }
}
