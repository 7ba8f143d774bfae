//! Error types for the cleaning, caching and modelling core.
//!
//! Data-contract violations (`Parse`, `Format`, `SchemaMismatch`) and
//! modelling failures (`InsufficientData`, `Fit`) are kept as separate
//! variants so callers can tell a bad source file from a degenerate fit.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the library core.
#[derive(Debug, Error)]
pub enum Error {
    /// A cell is not a number at all (not merely non-integer).
    #[error("Cannot parse {value:?} in column '{column}' as a number")]
    Parse {
        /// Logical column name.
        column: String,
        /// Cell text after whitespace stripping and comma replacement.
        value: String,
    },

    /// The composite period field is not of the form `start/end`.
    #[error("Period {value:?} is not of the form 'start/end'")]
    Format {
        /// Offending period text.
        value: String,
    },

    /// The source columns do not match the expected layout.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A column name that is not part of the cleaned schema.
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    /// Not enough distinct predictor values for a line fit.
    #[error("Insufficient data: need at least {required} distinct predictor values, got {actual}")]
    InsufficientData {
        /// Required number of distinct values.
        required: usize,
        /// Distinct values actually present.
        actual: usize,
    },

    /// The regression solver itself failed.
    #[error("Model fit failed: {0}")]
    Fit(String),

    /// Invalid parameter value.
    #[error("Invalid parameter '{name}': {value} (expected {expected})")]
    InvalidParameter {
        /// Name of the parameter.
        name: &'static str,
        /// Provided value as string.
        value: String,
        /// Description of expected value.
        expected: &'static str,
    },

    /// The source answered with something other than HTTP 200.
    #[error("Data is not available from {url} (HTTP status {status})")]
    FetchStatus {
        /// Requested URL.
        url: String,
        /// Status code returned.
        status: u16,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read delimited text: {0}")]
    Csv(#[from] csv::Error),

    #[error("Table error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::InsufficientData {
            required: 2,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient data: need at least 2 distinct predictor values, got 1"
        );

        let err = Error::Format {
            value: "1990".to_string(),
        };
        assert!(err.to_string().contains("\"1990\""));
    }
}
