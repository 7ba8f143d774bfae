//! Command-line interface definitions and argument parsing

use crate::config::{
    PipelineConfig, DEFAULT_CACHE_NAME, DEFAULT_FUTURE_YEARS, DEFAULT_REPORT_SEED,
    DEFAULT_SOURCE_URL, DEFAULT_TRIALS,
};
use crate::data::{CleanedTable, SourceSchema, NUMBER_OF_TEACHERS, NUMERIC_COLUMNS};
use clap::Parser;
use std::path::PathBuf;

/// School statistics: clean, chart and project trends by school year
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// URL of the semicolon-separated source table
    #[arg(long, default_value = DEFAULT_SOURCE_URL)]
    pub url: String,

    /// Directory holding the cleaned-table cache
    #[arg(long, default_value = ".")]
    pub cache_dir: PathBuf,

    /// Cache file name, without extension
    #[arg(long, default_value = DEFAULT_CACHE_NAME)]
    pub cache_name: String,

    /// Extrapolation horizon in years for the projection chart
    #[arg(short, long, default_value_t = DEFAULT_FUTURE_YEARS)]
    pub future_years: i64,

    /// Number of seeded train/test splits averaged for the error estimate
    #[arg(short, long, default_value_t = DEFAULT_TRIALS)]
    pub trials: usize,

    /// Seed of the single-split error estimate
    #[arg(short, long, default_value_t = DEFAULT_REPORT_SEED)]
    pub seed: u64,

    /// Column whose hold-out error is reported
    #[arg(long, default_value = NUMBER_OF_TEACHERS)]
    pub target: String,

    /// Directory for the PNG charts
    #[arg(short, long, default_value = "charts")]
    pub output_dir: PathBuf,

    /// Only check the column count of the source, not its header names
    #[arg(long)]
    pub positional_schema: bool,

    /// Skip chart rendering
    #[arg(long)]
    pub no_charts: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Build the pipeline configuration, checking the target column name
    pub fn into_config(self) -> crate::Result<PipelineConfig> {
        if !CleanedTable::is_numeric_column(&self.target) {
            anyhow::bail!(
                "Unknown target column '{}'; expected one of {}",
                self.target,
                NUMERIC_COLUMNS.join(", ")
            );
        }
        if self.trials == 0 {
            anyhow::bail!("Trials must be at least 1");
        }
        if self.future_years < 1 {
            anyhow::bail!("Future years must be at least 1, got {}", self.future_years);
        }

        let schema = if self.positional_schema {
            SourceSchema::positional()
        } else {
            SourceSchema::school_statistics()
        };

        Ok(PipelineConfig {
            source_url: self.url,
            schema,
            cache_name: self.cache_name,
            cache_dir: self.cache_dir,
            future_years: self.future_years,
            trials: self.trials,
            report_seed: self.seed,
            accuracy_target: self.target,
            output_dir: self.output_dir,
            charts: !self.no_charts,
            ..PipelineConfig::default()
        })
    }
}
