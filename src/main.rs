//! edutrend: school statistics trend CLI
//!
//! Loads the cleaned table (from cache or source), prints an overview,
//! renders the charts and reports the trend model's hold-out error.

use anyhow::{Context, Result};
use clap::Parser;
use edutrend::{estimate, estimate_average, generate_report, load_data, viz, Args, HttpFetcher};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Rows shown in the table preview
const PREVIEW_ROWS: usize = 15;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let config = args.into_config()?;
    let start_time = Instant::now();

    // Step 1: cached table, or download and clean
    let table = load_data(&config, &HttpFetcher::new())
        .with_context(|| format!("Failed to load data from {}", config.source_url))?;
    println!("✓ Data loaded: {} school years", table.len());

    // Step 2: overview
    viz::print_table_overview(&table, PREVIEW_ROWS)?;

    // Step 3: charts
    if config.charts {
        let viz_start = Instant::now();
        let written = generate_report(&table, &config)?;
        println!("\n✓ {} charts saved to {}", written.len(), config.output_dir.display());
        for path in &written {
            println!("  {}", path.display());
        }
        info!(elapsed = ?viz_start.elapsed(), "charts rendered");
    }

    // Step 4: hold-out error of the linear trend
    let single = estimate(
        &table,
        &config.predictor,
        &config.accuracy_target,
        config.report_seed,
    )?;
    println!(
        "\nLinear model error on {} with seed {}: {:.2}",
        config.accuracy_target, config.report_seed, single
    );

    let average = estimate_average(
        &table,
        &config.predictor,
        &config.accuracy_target,
        config.trials,
    )?;
    println!(
        "Average linear model error on {} over {} seeds: {:.2}",
        config.accuracy_target, config.trials, average
    );

    println!("\nTotal processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}
