//! Locale-tolerant conversion of text columns into numeric columns

use crate::error::{Error, Result};
use tracing::debug;

/// A single numeric cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }
}

/// Numeric column with one type shared by every row
#[derive(Debug, Clone, PartialEq)]
pub enum NumericColumn {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl NumericColumn {
    pub fn len(&self) -> usize {
        match self {
            NumericColumn::Int(v) => v.len(),
            NumericColumn::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_float(&self) -> bool {
        matches!(self, NumericColumn::Float(_))
    }

    pub fn get(&self, index: usize) -> Option<Number> {
        match self {
            NumericColumn::Int(v) => v.get(index).copied().map(Number::Int),
            NumericColumn::Float(v) => v.get(index).copied().map(Number::Float),
        }
    }

    /// Column values widened to `f64` for modelling and plotting
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            NumericColumn::Int(v) => v.iter().map(|&x| x as f64).collect(),
            NumericColumn::Float(v) => v.clone(),
        }
    }

    /// Keep the first `n` rows
    pub fn truncated(&self, n: usize) -> Self {
        match self {
            NumericColumn::Int(v) => NumericColumn::Int(v.iter().take(n).copied().collect()),
            NumericColumn::Float(v) => NumericColumn::Float(v.iter().take(n).copied().collect()),
        }
    }
}

/// Remove every whitespace character and turn decimal commas into periods.
///
/// Thousands separators in the source are (non-breaking) spaces, so
/// `"1 234,5"` becomes `"1234.5"`.
pub fn clean_numeric_text(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}

/// Convert a text column to a [`NumericColumn`].
///
/// Every value is first tried as an integer. If any single value fails, the
/// whole column is parsed again as floating point. Empty cells are missing
/// values: they force the float pass and become NaN.
///
/// # Errors
/// `Error::Parse` when a value is not a number at all.
pub fn normalize_column<S: AsRef<str>>(column: &str, values: &[S]) -> Result<NumericColumn> {
    let cleaned: Vec<String> = values
        .iter()
        .map(|v| clean_numeric_text(v.as_ref()))
        .collect();

    let ints: std::result::Result<Vec<i64>, _> =
        cleaned.iter().map(|v| v.parse::<i64>()).collect();
    if let Ok(ints) = ints {
        debug!(column, rows = ints.len(), "integer column");
        return Ok(NumericColumn::Int(ints));
    }

    let floats = cleaned
        .iter()
        .map(|v| {
            if v.is_empty() {
                return Ok(f64::NAN);
            }
            v.parse::<f64>().map_err(|_| Error::Parse {
                column: column.to_string(),
                value: v.clone(),
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    debug!(column, rows = floats.len(), "float column");
    Ok(NumericColumn::Float(floats))
}
