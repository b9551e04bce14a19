mod analysis;
mod backtest;
mod config;
mod demon;
mod entropy;
mod error;
mod forecast;
mod indicator;
mod model;
mod output;
mod params;
mod pattern;
mod portfolio;
mod risk;
mod settings;
mod signal;
mod source;
mod stats;

use std::path::Path;

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use model::{Interval, PriceSeries};
use output::ReportSink;
use output::json::JsonSink;
use output::terminal::TerminalSink;
use settings::{AnalysisSettings, OutputFormat};
use source::PriceSource;
use source::json::JsonFileSource;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("price data error")]
    Source,
    #[display("analysis error")]
    Analysis,
    #[display("output error")]
    Output,
}

#[derive(Parser)]
#[command(name = "demon-quant", about = "Entropy-based price series analysis")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// JSON price file, overriding `[data].path`
    #[arg(short, long)]
    prices: Option<String>,

    /// Run seed, overriding `[analysis].seed`
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = config::load(Path::new(&cli.config)).change_context(AppError::Config)?;

    init_tracing(&config);

    let mut settings = AnalysisSettings::from_config(&config);
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }

    let path = cli
        .prices
        .or_else(|| config.data.path.clone())
        .ok_or_else(|| Report::new(AppError::Config))
        .attach_with(|| "no price file given in [data].path or --prices")?;

    let series = load_series(&JsonFileSource::new(&path), settings.interval)?;
    let holdings = config
        .data
        .portfolio
        .iter()
        .map(|entry| {
            let series = load_series(&JsonFileSource::new(&entry.path), settings.interval)?;
            Ok((entry.name.clone(), series))
        })
        .collect::<Result<Vec<_>, Report<AppError>>>()?;

    info!(
        observations = series.len(),
        holdings = holdings.len(),
        backtest = ?settings.backtest,
        seed = settings.seed,
        "starting analysis"
    );
    let report = analysis::run(&series, &settings, &holdings).change_context(AppError::Analysis)?;

    let sink: Box<dyn ReportSink> = match OutputFormat::from_config(&config) {
        OutputFormat::Json => Box::new(JsonSink),
        OutputFormat::Text => Box::new(TerminalSink),
    };
    sink.emit(&report).change_context(AppError::Output)?;

    info!(run_id = %report.run_id, "analysis complete");
    Ok(())
}

fn load_series(source: &dyn PriceSource, interval: Interval) -> Result<PriceSeries, Report<AppError>> {
    info!(source = %source.describe(), "loading prices");
    let observations = source.load().change_context(AppError::Source)?;
    PriceSeries::from_observations(&observations, interval)
        .change_context(AppError::Source)
        .attach_with(|| format!("source: {}", source.describe()))
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
