//! Pipeline configuration

use crate::data::{SourceSchema, NUMBER_OF_TEACHERS, YEAR_START};
use std::path::PathBuf;

/// Statistics office table: schools, classrooms, teachers and students by school year
pub const DEFAULT_SOURCE_URL: &str = "https://www.ksh.hu/stadat_files/okt/hu/okt0008.csv";
pub const DEFAULT_CACHE_NAME: &str = "school";
pub const DEFAULT_FUTURE_YEARS: i64 = 10;
pub const DEFAULT_TRIALS: usize = 10;
pub const DEFAULT_REPORT_SEED: u64 = 1;

/// Everything the pipeline entry point needs, passed explicitly
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub source_url: String,
    /// File name of the cache artifact, without extension
    pub cache_name: String,
    pub cache_dir: PathBuf,
    pub schema: SourceSchema,
    /// Extrapolation horizon; projected years run to `max(year) + future_years - 1`
    pub future_years: i64,
    pub trials: usize,
    /// Seed of the single-split error reported next to the average
    pub report_seed: u64,
    pub predictor: String,
    pub accuracy_target: String,
    pub output_dir: PathBuf,
    pub charts: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            cache_dir: PathBuf::from("."),
            schema: SourceSchema::positional(),
            future_years: DEFAULT_FUTURE_YEARS,
            trials: DEFAULT_TRIALS,
            report_seed: DEFAULT_REPORT_SEED,
            predictor: YEAR_START.to_string(),
            accuracy_target: NUMBER_OF_TEACHERS.to_string(),
            output_dir: PathBuf::from("charts"),
            charts: true,
        }
    }
}
