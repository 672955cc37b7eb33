// Engine main entry point
use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use engine::analysis::{analyze_interval, default_indicators, IntervalAnalysis};
use engine::config::EngineSettings;
use engine::data::{load_dataset, KlineClient, LoadStatus};
use engine::services::{FetchService, IntervalReport, IntervalStatus, LiveFeed};
use shared::models::Interval;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "engine", about = "Fetch, store and summarise exchange kline data")]
struct Cli {
    /// JSON settings file; built-in defaults are used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch every configured interval once and append it to the CSV store
    Fetch {
        /// Keep the live feed running afterwards until Ctrl-C
        #[arg(long)]
        listen: bool,
    },
    /// Load stored CSVs and print statistics and latest indicator values
    Summary {
        #[arg(long)]
        interval: Option<Interval>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Only run the live feed, until Ctrl-C
    Listen,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => EngineSettings::from_file(path)?,
        None => EngineSettings::default(),
    };
    info!(pair = %settings.pair, data_dir = %settings.data_dir.display(), "Settings loaded");

    match cli.command {
        Command::Fetch { listen } => {
            run_fetch(&settings).await?;
            if listen {
                run_live_feed(&settings).await?;
            }
        }
        Command::Summary { interval, json } => run_summary(&settings, interval, json)?,
        Command::Listen => run_live_feed(&settings).await?,
    }
    Ok(())
}

async fn run_fetch(settings: &EngineSettings) -> Result<()> {
    let client = KlineClient::new(settings)?;
    info!(url = %client.url(), "Starting fetch cycle");
    let service = FetchService::new(client, settings.clone());

    match service.run(Utc::now()).await {
        Ok(cycle) => {
            print_reports(&cycle.reports);
            Ok(())
        }
        Err(aborted) => {
            print_reports(&aborted.reports);
            Err(aborted.into())
        }
    }
}

fn print_reports(reports: &[IntervalReport]) {
    for report in reports {
        match &report.status {
            IntervalStatus::Saved { path, rows } => {
                println!("{:>4}  saved    {} rows -> {}", report.interval, rows, path.display())
            }
            IntervalStatus::Empty { path } => {
                println!("{:>4}  empty    nothing written to {}", report.interval, path.display())
            }
            IntervalStatus::Skipped { reason } => println!("{:>4}  skipped  {}", report.interval, reason),
        }
    }
}

fn run_summary(settings: &EngineSettings, only: Option<Interval>, json: bool) -> Result<()> {
    let intervals = match only {
        Some(interval) => vec![interval],
        None => settings.configured_intervals(),
    };
    let (dataset, reports) = load_dataset(&settings.data_dir, &settings.pair, &intervals);

    for report in &reports {
        match &report.status {
            LoadStatus::Loaded { .. } => {}
            LoadStatus::Missing => eprintln!("{:>4}  no data file at {}", report.interval, report.path.display()),
            LoadStatus::Failed { reason } => eprintln!("{:>4}  unreadable: {}", report.interval, reason),
        }
    }

    let indicators = default_indicators();
    let analyses: Vec<IntervalAnalysis> = dataset
        .iter()
        .map(|(interval, candles)| analyze_interval(interval, candles, &indicators))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&analyses)?);
        return Ok(());
    }
    for analysis in &analyses {
        print_analysis(&settings.pair, analysis);
    }
    Ok(())
}

fn print_analysis(pair: &str, analysis: &IntervalAnalysis) {
    println!("== {} {} ==", pair, analysis.interval);
    let Some(summary) = &analysis.summary else {
        println!("no records");
        return;
    };
    println!(
        "records: {}  range: {} .. {}  days: {}",
        summary.records,
        summary.first_start,
        summary.last_start,
        analysis.daily_closes.len()
    );
    println!(
        "{:<7} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14}",
        "column", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for col in &summary.columns {
        let std = col.std.map(|s| format!("{:.4}", s)).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<7} {:>14.4} {:>14} {:>14.4} {:>14.4} {:>14.4} {:>14.4} {:>14.4}",
            col.name, col.mean, std, col.min, col.q25, col.median, col.q75, col.max
        );
    }
    if let Some(change) = &analysis.price_change {
        let std = change.std.map(|s| format!("{:.2}", s)).unwrap_or_else(|| "-".to_string());
        println!("price change (close - open): mean {:.2}  std {}", change.mean, std);
    }
    for indicator in &analysis.indicators {
        match indicator.latest {
            Some(value) => println!("{}: {:.2}", indicator.name, value),
            None => println!("{}: not enough data", indicator.name),
        }
    }
    if let Some(matrix) = &analysis.correlation {
        println!("correlation:");
        print!("{:<7}", "");
        for name in &matrix.columns {
            print!(" {:>7}", name);
        }
        println!();
        for (name, row) in matrix.columns.iter().zip(&matrix.values) {
            print!("{:<7}", name);
            for value in row {
                match value {
                    Some(r) => print!(" {:>7.3}", r),
                    None => print!(" {:>7}", "-"),
                }
            }
            println!();
        }
    }
    println!("close distribution:");
    for bin in &analysis.close_histogram {
        println!("  {:>14.2} .. {:>14.2}  {}", bin.lower, bin.upper, bin.count);
    }
    println!("daily closes:");
    for (day, close) in &analysis.daily_closes {
        println!("  {}  {:.2}", day, close);
    }
}

async fn run_live_feed(settings: &EngineSettings) -> Result<()> {
    info!(url = %settings.ws_url, "Connecting to live feed");
    let handle = LiveFeed::new(settings.ws_url.clone()).spawn();

    handle
        .stop_on(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Ctrl-C received, stopping live feed"),
                Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C, stopping live feed"),
            }
        })
        .await?;
    Ok(())
}
