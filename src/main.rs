mod cli;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use dotenv::dotenv;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use brandscout::browser::{BrowserOptions, ChromeSession};
use brandscout::export;
use brandscout::input;
use brandscout::progress::BarProgress;
use brandscout::report::RunSummary;
use brandscout::sites;
use brandscout::{MatchResult, Pipeline, RunOutcome};

use crate::cli::Cli;

/// Exit status when the run completed but found nothing to export.
const EXIT_NO_RESULTS: u8 = 2;

const NO_RESULTS: &str = "No results found. Please check your configuration and try again.";

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("brandscout=info")),
        1 => EnvFilter::new("brandscout=debug"),
        _ => EnvFilter::new("brandscout=trace"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config = cli.to_config();
    config.validate()?;

    let table = input::load_brands(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    info!(
        "Found {} brands with {} keyword columns",
        table.records.len(),
        table.keyword_columns.len()
    );
    println!("{config}\n");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current search");
            on_interrupt.cancel();
        }
    });

    let browser_options = BrowserOptions::from_config(&config);
    let mut pipeline = Pipeline::new(&config, sites::active_profiles(&config.sites))
        .with_progress(BarProgress::new())
        .with_cancellation(cancel);

    let outcome = pipeline
        .run(&table.records, || ChromeSession::launch(&browser_options))
        .await?;

    match outcome {
        RunOutcome::Completed(rows) => {
            save(&cli, &rows)?;
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Cancelled(rows) => {
            warn!(
                rows = rows.len(),
                "Run was cancelled; exporting partial results"
            );
            if !rows.is_empty() {
                save(&cli, &rows)?;
            }
            Ok(ExitCode::FAILURE)
        }
        RunOutcome::NoResults => {
            println!("{NO_RESULTS}");
            Ok(ExitCode::from(EXIT_NO_RESULTS))
        }
    }
}

fn save(cli: &Cli, rows: &[MatchResult]) -> anyhow::Result<()> {
    println!("\n{}\n", RunSummary::from_rows(rows));

    let at = Local::now().naive_local();
    let paths = export::export_all(rows, &cli.output_dir, cli.format, at)
        .context("exporting results")?;
    for path in paths {
        println!("Saved {}", path.display());
    }
    Ok(())
}
