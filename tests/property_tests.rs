//! Property-based checks of the computation invariants

use chrono::NaiveDate;
use proptest::prelude::*;
use rusty_fundamentals::config::TrendConfig;
use rusty_fundamentals::pipeline::composite::{CompositeScorer, Metric};
use rusty_fundamentals::pipeline::{
    ChannelFit, FScore, RatioCalculator, RatioInputs, SignalClassifier, TrendAnalyzer,
};
use rusty_fundamentals::prelude::*;

fn opt_amount() -> impl Strategy<Value = Option<f64>> {
    prop::option::weighted(0.85, -1.0e6..1.0e6f64)
}

fn statement_strategy() -> impl Strategy<Value = StatementPeriod> {
    (
        (opt_amount(), opt_amount(), opt_amount(), opt_amount()),
        (opt_amount(), opt_amount(), opt_amount(), opt_amount()),
        (opt_amount(), opt_amount(), opt_amount(), opt_amount()),
    )
        .prop_map(|(a, b, c)| {
            let mut s = StatementPeriod::new(1, PeriodKey::new(2024, 2).unwrap());
            s.revenue = a.0;
            s.net_income = a.1;
            s.gross_profit = a.2;
            s.operating_cash_flow = a.3;
            s.total_assets = b.0;
            s.total_equity = b.1;
            s.total_liabilities = b.2;
            s.current_assets = b.3;
            s.current_liabilities = c.0;
            s.inventory = c.1;
            s.shares_outstanding = c.2.map(f64::abs);
            s.operating_income = c.3;
            s
        })
}

fn metric_strategy() -> impl Strategy<Value = (Metric, f64)> {
    let metrics = vec![
        Metric::Roe,
        Metric::NetMargin,
        Metric::GrossMargin,
        Metric::CurrentRatio,
        Metric::QuickRatio,
        Metric::DebtRatio,
        Metric::FScore,
        Metric::PeTtm,
        Metric::PbRatio,
    ];
    (prop::sample::select(metrics), -1.0e4..1.0e4f64)
}

proptest! {
    #[test]
    fn prop_dupont_identity(statement in statement_strategy()) {
        let ratios = RatioCalculator::new().compute(&RatioInputs::statement_only(&statement));
        if let (Some(nm), Some(at), Some(em)) =
            (ratios.net_margin, ratios.asset_turnover, ratios.equity_multiplier)
        {
            let roe = ratios.roe.unwrap();
            let expected = nm / 100.0 * at * em * 100.0;
            prop_assert!((roe - expected).abs() <= 1e-6 * expected.abs().max(1.0));
        } else {
            prop_assert!(ratios.roe.is_none());
        }
    }

    #[test]
    fn prop_undefined_never_zero_filled(statement in statement_strategy()) {
        let ratios = RatioCalculator::new().compute(&RatioInputs::statement_only(&statement));
        if statement.revenue.is_none() {
            prop_assert!(ratios.net_margin.is_none());
            prop_assert!(ratios.gross_margin.is_none());
        }
        if statement.current_liabilities.is_none() {
            prop_assert!(ratios.current_ratio.is_none());
            prop_assert!(ratios.quick_ratio.is_none());
        }
    }

    #[test]
    fn prop_f_score_bounds(current in statement_strategy(), prior in statement_strategy()) {
        let mut prior = prior;
        prior.year = 2024;
        prior.season = 1;
        let score = FScore::new().score(&current, Some(&prior));
        prop_assert!(score.map_or(false, |s| s <= 9));
        prop_assert_eq!(FScore::new().score(&current, None), None);
    }

    #[test]
    fn prop_cbs_bounds_and_order_invariance(
        metrics in prop::collection::vec(metric_strategy(), 0..20),
        seed in any::<u64>(),
    ) {
        let scorer = CompositeScorer::default();
        let forward = scorer.score_metrics(&metrics);
        if let Some(score) = forward {
            prop_assert!(score <= 100);
        }
        prop_assert_eq!(forward.is_none(), metrics.is_empty());

        let mut shuffled = metrics.clone();
        let len = shuffled.len();
        if len > 1 {
            let mut state = seed;
            for i in (1..len).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state >> 33) as usize % (i + 1);
                shuffled.swap(i, j);
            }
        }
        prop_assert_eq!(scorer.score_metrics(&shuffled), forward);
    }

    #[test]
    fn prop_signal_totality(
        pe in prop::option::of(-100.0..200.0f64),
        pb in prop::option::of(-5.0..20.0f64),
    ) {
        let signal = SignalClassifier::default().classify(pe, pb);
        prop_assert!(Signal::ALL.contains(&signal));
        match pe {
            None => prop_assert_eq!(signal, Signal::Watch),
            Some(pe) if pe <= 0.0 => prop_assert_eq!(signal, Signal::Watch),
            Some(pe) if pe > 25.0 => prop_assert_eq!(signal, Signal::Overheated),
            Some(pe) => {
                if pe < 10.0 && pb.map_or(false, |pb| pb < 1.0) {
                    prop_assert_eq!(signal, Signal::Undervalued);
                } else {
                    prop_assert!(signal != Signal::Watch && signal != Signal::Overheated);
                }
            }
        }
    }

    #[test]
    fn prop_band_ordering(
        closes in prop::collection::vec(1.0..1000.0f64, 2..200),
        log_scale in any::<bool>(),
    ) {
        let analyzer = TrendAnalyzer::new(TrendConfig {
            window_size: 250,
            use_log_scale: log_scale,
            min_points: 2,
        });
        let date = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let trend = analyzer.analyze(1, date, &closes).unwrap();

        prop_assert!(trend.sd_minus_2 <= trend.sd_minus_1);
        prop_assert!(trend.sd_minus_1 <= trend.trend_line);
        prop_assert!(trend.trend_line <= trend.sd_plus_1);
        prop_assert!(trend.sd_plus_1 <= trend.sd_plus_2);
        prop_assert!((0.0..=1.0).contains(&trend.r_squared));
        prop_assert_eq!(trend.period_days, closes.len());
    }

    #[test]
    fn prop_constant_series_degenerate(value in 0.01..1.0e5f64, n in 2usize..100) {
        let fit = ChannelFit::fit(&vec![value; n]).unwrap();
        prop_assert_eq!(fit.r_squared, 1.0);
        prop_assert_eq!(fit.sigma, 0.0);
        prop_assert_eq!(fit.center, value);
        prop_assert_eq!(fit.position(), BandPosition::TrendLine);
    }

    #[test]
    fn prop_pagination_stability(
        scores in prop::collection::vec(prop::option::of(0u8..=100), 0..40),
        page_size in 1usize..10,
    ) {
        let companies: Vec<Company> = scores
            .iter()
            .enumerate()
            .map(|(i, _)| {
                Company::new(
                    i as u64 + 1,
                    format!("{:04}", 1000 + (i * 7) % 40),
                    format!("C{}", i),
                    Market::Listed,
                )
            })
            .collect();
        let indicators: Vec<Indicator> = scores
            .iter()
            .enumerate()
            .map(|(i, cbs)| Indicator {
                company_id: i as u64 + 1,
                report_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
                year: 2024,
                season: 2,
                ratios: Ratios::default(),
                f_score: None,
                cbs_score: *cbs,
                signal: Signal::Watch,
            })
            .collect();
        let snapshot = IndicatorSnapshot::new()
            .with_companies(companies)
            .with_indicators(indicators);
        let screener = Screener::default();
        let filter = ScreenerFilter::default();

        let full = screener.screen(&snapshot, &filter, 1, 500).unwrap();
        prop_assert_eq!(full.total, scores.len());

        let mut paged = Vec::new();
        let pages = scores.len().div_ceil(page_size).max(1);
        for page in 1..=pages {
            let result = screener.screen(&snapshot, &filter, page, page_size).unwrap();
            prop_assert_eq!(result.total, scores.len());
            paged.extend(result.items.into_iter().map(|item| item.company.id));
        }
        let expected: Vec<u64> = full.items.iter().map(|item| item.company.id).collect();
        prop_assert_eq!(paged, expected);
    }
}
