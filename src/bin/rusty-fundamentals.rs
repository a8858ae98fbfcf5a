//! rusty-fundamentals CLI - indicators, trend channels and screens over CSV data
//!
//! ## Example Usage
//!
//! ```bash
//! # Latest indicator of one company
//! rusty-fundamentals --data-dir ./data indicators 2330
//!
//! # Trend channel on log scale
//! rusty-fundamentals --data-dir ./data trend 2330 --as-of 2024-06-28 --log-scale
//!
//! # Screen the universe
//! rusty-fundamentals --data-dir ./data screen --pe-max 15 --signal 低估 --signal 低價
//!
//! # Show configuration and data summary
//! rusty-fundamentals info
//! ```

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rusty_fundamentals::batch::{BatchRunner, CancellationToken};
use rusty_fundamentals::company::Market;
use rusty_fundamentals::config::EngineConfig;
use rusty_fundamentals::indicator::Indicator;
use rusty_fundamentals::pipeline::composite::HealthBand;
use rusty_fundamentals::pipeline::engine::IndicatorEngine;
use rusty_fundamentals::pipeline::trend::TrendAnalysis;
use rusty_fundamentals::pipeline::Signal;
use rusty_fundamentals::screener::{
    IndicatorSnapshot, ScreenResult, Screener, ScreenerFilter, SnapshotCell,
};
use rusty_fundamentals::statement::PeriodKey;
use rusty_fundamentals::store::{CsvLoader, LoadSummary};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Instant;

/// rusty-fundamentals: financial indicator engine and stock screener
#[derive(Parser)]
#[command(name = "rusty-fundamentals")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Financial indicator engine and stock screener", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding companies.csv, statements.csv, prices.csv, ...
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute indicators for one company
    Indicators {
        /// Stock code
        #[arg(value_name = "CODE")]
        code: String,

        /// Period such as 2024Q1 (default: latest on file)
        #[arg(short, long)]
        period: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Fit the trend channel for one company
    Trend {
        /// Stock code
        #[arg(value_name = "CODE")]
        code: String,

        /// Calculation date (YYYY-MM-DD, default: today)
        #[arg(long)]
        as_of: Option<String>,

        /// Override the configured window size
        #[arg(short, long)]
        window: Option<usize>,

        /// Fit on log prices
        #[arg(long)]
        log_scale: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Recompute the universe and run a screen
    Screen {
        /// JSON file with a full filter; flags below override its fields
        #[arg(long)]
        filter: Option<PathBuf>,

        #[arg(long)]
        roe_min: Option<f64>,
        #[arg(long)]
        roe_max: Option<f64>,
        #[arg(long)]
        pe_min: Option<f64>,
        #[arg(long)]
        pe_max: Option<f64>,
        #[arg(long)]
        pb_min: Option<f64>,
        #[arg(long)]
        pb_max: Option<f64>,
        #[arg(long)]
        current_ratio_min: Option<f64>,
        #[arg(long)]
        f_score_min: Option<u8>,
        #[arg(long)]
        cbs_score_min: Option<u8>,

        /// Signal (English or display label), repeatable
        #[arg(long)]
        signal: Vec<String>,

        /// Industry, repeatable
        #[arg(long)]
        industry: Vec<String>,

        /// Market venue, repeatable
        #[arg(long)]
        market: Vec<String>,

        #[arg(long, default_value = "1")]
        page: usize,

        /// Page size (default from configuration)
        #[arg(long)]
        page_size: Option<usize>,

        /// Write the page to a file (.json or .csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show a progress bar during recompute
        #[arg(short = 'p', long)]
        show_progress: bool,
    },

    /// Show configuration and data summary
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rusty-fundamentals")
}

fn default_data_dir() -> PathBuf {
    default_home().join("data")
}

/// Explicit path must load; the default location is optional
fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let default_config = default_home().join("config.toml");
            if default_config.exists() {
                EngineConfig::load(&default_config)
                    .with_context(|| format!("Failed to load config {}", default_config.display()))?
            } else {
                EngineConfig::default()
            }
        }
    };
    config.validate()?;
    Ok(config)
}

struct Session {
    engine: IndicatorEngine,
    summary: LoadSummary,
}

fn open_session(data_dir: &Path, config: EngineConfig) -> anyhow::Result<Session> {
    let (store, summary) = CsvLoader::new(data_dir)
        .load()
        .with_context(|| format!("Failed to load data from {}", data_dir.display()))?;
    let store = Arc::new(store);
    let engine = IndicatorEngine::new(store.clone(), store, config)?;
    Ok(Session { engine, summary })
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);

    if cli.verbose {
        println!(
            "{} v{}",
            "rusty-fundamentals".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
        println!("Data dir: {}", data_dir.display().to_string().dimmed());
    }

    match cli.command {
        Commands::Indicators {
            code,
            period,
            format,
        } => {
            let session = open_session(&data_dir, config)?;
            show_indicators(&session, &code, period.as_deref(), format)
        }
        Commands::Trend {
            code,
            as_of,
            window,
            log_scale,
            format,
        } => {
            let mut config = config;
            if let Some(window) = window {
                config.trend.window_size = window;
            }
            config.trend.use_log_scale |= log_scale;
            let session = open_session(&data_dir, config)?;
            show_trend(&session, &code, as_of.as_deref(), format)
        }
        Commands::Screen {
            filter,
            roe_min,
            roe_max,
            pe_min,
            pe_max,
            pb_min,
            pb_max,
            current_ratio_min,
            f_score_min,
            cbs_score_min,
            signal,
            industry,
            market,
            page,
            page_size,
            output,
            show_progress,
        } => {
            let mut screen_filter = match filter {
                Some(path) => {
                    let contents = fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read filter {}", path.display()))?;
                    serde_json::from_str::<ScreenerFilter>(&contents)?
                }
                None => ScreenerFilter::default(),
            };
            screen_filter.roe_min = roe_min.or(screen_filter.roe_min);
            screen_filter.roe_max = roe_max.or(screen_filter.roe_max);
            screen_filter.pe_min = pe_min.or(screen_filter.pe_min);
            screen_filter.pe_max = pe_max.or(screen_filter.pe_max);
            screen_filter.pb_min = pb_min.or(screen_filter.pb_min);
            screen_filter.pb_max = pb_max.or(screen_filter.pb_max);
            screen_filter.current_ratio_min = current_ratio_min.or(screen_filter.current_ratio_min);
            screen_filter.f_score_min = f_score_min.or(screen_filter.f_score_min);
            screen_filter.cbs_score_min = cbs_score_min.or(screen_filter.cbs_score_min);
            for label in &signal {
                screen_filter.signal.push(label.parse::<Signal>()?);
            }
            screen_filter.industry.extend(industry);
            for venue in &market {
                screen_filter.market.push(venue.parse::<Market>()?);
            }

            let page_size = page_size.unwrap_or(config.screener.default_page_size);
            let session = open_session(&data_dir, config)?;
            run_screen(&session, &screen_filter, page, page_size, output.as_deref(), show_progress)
        }
        Commands::Info => {
            show_info(&config, &data_dir);
            Ok(())
        }
    }
}

fn fmt_opt(value: Option<f64>, suffix: &str) -> String {
    match value {
        Some(v) => format!("{:.2}{}", v, suffix),
        None => "n/a".dimmed().to_string(),
    }
}

fn fmt_score(value: Option<u8>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "n/a".dimmed().to_string(),
    }
}

fn colored_signal(signal: Signal) -> colored::ColoredString {
    let text = format!("{} ({})", signal.label(), signal);
    match signal {
        Signal::Undervalued => text.bright_green().bold(),
        Signal::LowPrice => text.green(),
        Signal::Medium => text.yellow(),
        Signal::Overheated => text.red().bold(),
        Signal::Watch => text.dimmed(),
    }
}

fn show_indicators(
    session: &Session,
    code: &str,
    period: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let company = session.engine.find_company(code)?;
    let indicator = match period {
        Some(period) => {
            let period: PeriodKey = period.parse()?;
            session.engine.compute_indicator(company.id, period)?
        }
        None => session.engine.compute_latest_indicator(company.id)?,
    };
    let Some(indicator) = indicator else {
        bail!("No statement on file for {}", company.stock_code);
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&indicator)?);
        return Ok(());
    }

    print_indicator(&company.to_string(), &indicator);
    Ok(())
}

fn print_indicator(title: &str, ind: &Indicator) {
    let r = &ind.ratios;
    println!("{}", title.cyan().bold());
    println!("{}", "=".repeat(title.chars().count()).cyan());
    println!("  {} {} (reported {})", "Period:".bold(), ind.period(), ind.report_date);
    println!();
    println!("{}", "Profitability".bold());
    println!("  ROE:               {}", fmt_opt(r.roe, "%"));
    println!("  Net margin:        {}", fmt_opt(r.net_margin, "%"));
    println!("  Asset turnover:    {}", fmt_opt(r.asset_turnover, "x"));
    println!("  Equity multiplier: {}", fmt_opt(r.equity_multiplier, "x"));
    println!("  Gross margin:      {}", fmt_opt(r.gross_margin, "%"));
    println!("  Operating margin:  {}", fmt_opt(r.operating_margin, "%"));
    println!("{}", "Solvency".bold());
    println!("  Current ratio:     {}", fmt_opt(r.current_ratio, ""));
    println!("  Quick ratio:       {}", fmt_opt(r.quick_ratio, ""));
    println!("  Debt ratio:        {}", fmt_opt(r.debt_ratio, "%"));
    println!("  Cash ratio:        {}", fmt_opt(r.cash_ratio, "%"));
    println!("{}", "Efficiency".bold());
    println!("  Inventory days:    {}", fmt_opt(r.inventory_turnover_days, ""));
    println!("  Receivable days:   {}", fmt_opt(r.receivable_turnover_days, ""));
    println!("  Goodwill ratio:    {}", fmt_opt(r.goodwill_ratio, "%"));
    println!("{}", "Valuation".bold());
    println!("  PE (TTM):          {}", fmt_opt(r.pe_ttm, ""));
    println!("  PB:                {}", fmt_opt(r.pb_ratio, ""));
    println!("  Dividend yield:    {}", fmt_opt(r.dividend_yield, "%"));
    println!();
    println!("  {} {}", "F-Score:".bold(), fmt_score(ind.f_score));
    match ind.cbs_score {
        Some(score) => println!(
            "  {} {} ({})",
            "CBS:".bold(),
            score,
            HealthBand::from_score(score)
        ),
        None => println!("  {} {}", "CBS:".bold(), fmt_score(None)),
    }
    println!("  {} {}", "Signal:".bold(), colored_signal(ind.signal));
}

fn parse_date(value: Option<&str>) -> anyhow::Result<NaiveDate> {
    match value {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid date: {}", s)),
        None => Ok(Local::now().date_naive()),
    }
}

fn show_trend(
    session: &Session,
    code: &str,
    as_of: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let company = session.engine.find_company(code)?;
    let as_of = parse_date(as_of)?;
    let Some(trend) = session.engine.compute_trend(company.id, as_of)? else {
        bail!(
            "Not enough prices for {} as of {} (need {})",
            company.stock_code,
            as_of,
            session.engine.config().trend.min_points
        );
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&trend)?);
        return Ok(());
    }
    print_trend(&company.to_string(), &trend);
    Ok(())
}

fn print_trend(title: &str, trend: &TrendAnalysis) {
    println!("{}", title.cyan().bold());
    println!("{}", "=".repeat(title.chars().count()).cyan());
    println!(
        "  {} {} ({} points, r² {:.3}, slope {:+.4})",
        "As of:".bold(),
        trend.calculation_date,
        trend.period_days,
        trend.r_squared,
        trend.slope
    );
    println!();
    let rows = [
        ("+2SD", trend.sd_plus_2),
        ("+1SD", trend.sd_plus_1),
        ("TL", trend.trend_line),
        ("-1SD", trend.sd_minus_1),
        ("-2SD", trend.sd_minus_2),
    ];
    for (label, value) in rows {
        let marker = if label == trend.position.label() {
            "◀".yellow().bold().to_string()
        } else {
            String::new()
        };
        println!("  {:>5}  {:>10.2} {}", label, value, marker);
    }
    println!();
    println!(
        "  {} {:.2} ({})",
        "Close:".bold(),
        trend.current_price,
        trend.position.to_string().yellow()
    );
}

#[derive(Serialize)]
struct ScreenRow {
    stock_code: String,
    name: String,
    industry: Option<String>,
    market: String,
    period: String,
    roe: Option<f64>,
    pe_ttm: Option<f64>,
    pb_ratio: Option<f64>,
    current_ratio: Option<f64>,
    f_score: Option<u8>,
    cbs_score: Option<u8>,
    signal: String,
}

fn screen_rows(result: &ScreenResult) -> Vec<ScreenRow> {
    result
        .items
        .iter()
        .map(|item| ScreenRow {
            stock_code: item.company.stock_code.clone(),
            name: item.company.name.clone(),
            industry: item.company.industry.clone(),
            market: item.company.market.to_string(),
            period: item.indicator.period().to_string(),
            roe: item.indicator.ratios.roe,
            pe_ttm: item.indicator.ratios.pe_ttm,
            pb_ratio: item.indicator.ratios.pb_ratio,
            current_ratio: item.indicator.ratios.current_ratio,
            f_score: item.indicator.f_score,
            cbs_score: item.indicator.cbs_score,
            signal: item.indicator.signal.to_string(),
        })
        .collect()
}

fn run_screen(
    session: &Session,
    filter: &ScreenerFilter,
    page: usize,
    page_size: usize,
    output: Option<&Path>,
    show_progress: bool,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let runner = BatchRunner::new(session.engine.clone())?;
    let ids = runner.universe()?;

    let pb = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
        );
        pb.set_message(format!("Computing indicators for {} companies...", ids.len()));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let cancel = CancellationToken::new();
    let report = runner.recompute_indicators(&ids, &cancel);
    let cell = SnapshotCell::new(IndicatorSnapshot::new());
    let snapshot = runner.refresh_snapshot(&cell, &report)?;

    if let Some(pb) = pb {
        pb.finish_with_message(format!(
            "Computed {} indicators ({} undefined, {} failed)",
            report.computed_count(),
            report.undefined_count(),
            report.failed_count()
        ));
    }

    let result =
        Screener::new(session.engine.config().screener).screen(&snapshot, filter, page, page_size)?;
    let rows = screen_rows(&result);

    println!(
        "{} {} matches, page {} of {}",
        "Screen:".cyan().bold(),
        result.total,
        result.page,
        result.total.div_ceil(result.page_size).max(1)
    );
    println!();
    println!(
        "  {:<8} {:<20} {:>8} {:>8} {:>6} {:>4} {:>4}  {}",
        "Code".bold(),
        "Name".bold(),
        "ROE".bold(),
        "PE".bold(),
        "PB".bold(),
        "F".bold(),
        "CBS".bold(),
        "Signal".bold()
    );
    for item in &result.items {
        let ind = &item.indicator;
        println!(
            "  {:<8} {:<20} {:>8} {:>8} {:>6} {:>4} {:>4}  {}",
            item.company.stock_code,
            item.company.name,
            fmt_opt(ind.ratios.roe, ""),
            fmt_opt(ind.ratios.pe_ttm, ""),
            fmt_opt(ind.ratios.pb_ratio, ""),
            fmt_score(ind.f_score),
            fmt_score(ind.cbs_score),
            colored_signal(ind.signal)
        );
    }
    println!();
    println!(
        "{}",
        format!(
            "Loaded {} companies, {} statements, {} prices in {:.2?}",
            session.summary.companies,
            session.summary.statements,
            session.summary.prices,
            started.elapsed()
        )
        .dimmed()
    );

    if let Some(output_path) = output {
        let extension = output_path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("json");
        match extension {
            "csv" => {
                let mut wtr = csv::Writer::from_path(output_path)?;
                for row in &rows {
                    wtr.serialize(row)?;
                }
                wtr.flush()?;
            }
            _ => {
                let json = serde_json::to_string_pretty(&result)?;
                fs::write(output_path, json)?;
            }
        }
        println!(
            "{} Results saved to: {}",
            "✓".green().bold(),
            output_path.display()
        );
    }

    Ok(())
}

fn show_info(config: &EngineConfig, data_dir: &Path) {
    println!("{}", "rusty-fundamentals".cyan().bold());
    println!("{}", "==================".cyan());
    println!("  {} {}", "Version:".bold(), env!("CARGO_PKG_VERSION"));
    println!("  {} {}", "Data dir:".bold(), data_dir.display());
    println!();

    let w = &config.cbs.weights;
    println!("{}", "CBS weights".bold());
    println!(
        "  profitability {} / solvency {} / growth {} / valuation {}",
        w.profitability, w.solvency, w.growth, w.valuation
    );
    println!("{}", "Signal thresholds".bold());
    println!(
        "  undervalued PE < {} and PB < {}; low price PE < {} and PB < {}; medium PE <= {}",
        config.signal.undervalued_pe,
        config.signal.undervalued_pb,
        config.signal.low_price_pe,
        config.signal.low_price_pb,
        config.signal.medium_pe_max
    );
    println!("{}", "Trend".bold());
    println!(
        "  window {} days, log scale {}",
        config.trend.window_size,
        if config.trend.use_log_scale { "on".green() } else { "off".dimmed() }
    );
    println!(
        "  {} {}",
        "Workers:".bold(),
        config
            .batch
            .workers
            .map_or_else(|| "all cores".to_string(), |n| n.to_string())
    );
    println!();

    if data_dir.is_dir() {
        match CsvLoader::new(data_dir).load() {
            Ok((_, summary)) => {
                println!("{}", "Data".bold());
                println!("  Companies:   {}", summary.companies);
                println!("  Statements:  {}", summary.statements);
                println!("  Prices:      {}", summary.prices);
                println!("  Market caps: {}", summary.market_caps);
                println!("  Dividends:   {}", summary.dividends);
                if summary.skipped > 0 {
                    println!("  {} {}", "Skipped rows:".yellow(), summary.skipped);
                }
            }
            Err(e) => println!("  {} {}", "Data:".bold(), e.to_string().red()),
        }
    } else {
        println!(
            "{}",
            "  No data directory. Pass --data-dir with CSV files.".dimmed()
        );
    }
}
