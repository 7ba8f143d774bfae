//! edutrend: school statistics by school year, cleaned, charted and projected
//!
//! This library downloads the statistics office table of schools, classrooms,
//! teachers and students, normalizes its locale-formatted numbers into typed
//! columns, caches the cleaned table on disk and fits linear trends to project
//! the counts into the future.

pub mod accuracy;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod fetch;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod viz;

// Re-export public items for easier access
pub use accuracy::{estimate, estimate_average};
pub use cache::TabularCache;
pub use cli::Args;
pub use config::PipelineConfig;
pub use data::{clean, CleanedRow, CleanedTable, RawTable, SourceSchema};
pub use error::Error;
pub use fetch::{HttpFetcher, SourceFetcher};
pub use model::{project, Projection, TrendModel};
pub use normalize::{normalize_column, Number, NumericColumn};
pub use pipeline::load_data;
pub use viz::generate_report;

/// Result type of the binary and the chart glue
pub type Result<T> = anyhow::Result<T>;
