//! Linear trend model and year-by-year projections

use crate::data::CleanedTable;
use crate::error::{Error, Result};
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use tracing::debug;

/// Ordinary least-squares line `y = slope * x + intercept`.
///
/// Fit once, predict many; the parameters never change after fitting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendModel {
    slope: f64,
    intercept: f64,
}

impl TrendModel {
    /// Fit on two columns of the full table
    ///
    /// # Arguments
    /// * `table` - Cleaned dataset
    /// * `predictor_column` - Column used as x (usually `year_start`)
    /// * `target_column` - Column to predict
    ///
    /// # Errors
    /// * `UnknownColumn` for a name outside the cleaned schema
    /// * `InsufficientData` when fewer than 2 distinct predictor values exist
    pub fn fit(table: &CleanedTable, predictor_column: &str, target_column: &str) -> Result<Self> {
        let x = table.column(predictor_column)?.to_f64();
        let y = table.column(target_column)?.to_f64();
        Self::fit_xy(&x, &y)
    }

    /// Fit on paired predictor and target values
    pub fn fit_xy(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(Error::InvalidParameter {
                name: "target",
                value: format!("{} values", y.len()),
                expected: "one target value per predictor value",
            });
        }

        let distinct = distinct_count(x);
        if distinct < 2 {
            return Err(Error::InsufficientData {
                required: 2,
                actual: distinct,
            });
        }

        let records = Array2::from_shape_vec((x.len(), 1), x.to_vec())
            .map_err(|e| Error::Fit(e.to_string()))?;
        let targets = Array1::from_vec(y.to_vec());
        let dataset = Dataset::new(records, targets);

        let fitted = LinearRegression::new()
            .fit(&dataset)
            .map_err(|e| Error::Fit(e.to_string()))?;

        let model = Self {
            slope: fitted.params()[0],
            intercept: fitted.intercept(),
        };
        debug!(slope = model.slope, intercept = model.intercept, rows = x.len(), "fitted trend");
        Ok(model)
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn predict_one(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Apply the line pointwise; values outside the fitted range are extrapolated as is
    pub fn predict(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&x| self.predict_one(x)).collect()
    }
}

fn distinct_count(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();
    sorted.len()
}

/// Real values of one column extended with trend values into the future
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub target: String,
    /// Every year from the first observed one to the end of the horizon
    pub years: Vec<i64>,
    /// Trend value for every entry of `years`
    pub predicted: Vec<f64>,
    /// Observed values in table order, followed by the trend beyond them
    pub real_and_predicted: Vec<f64>,
}

/// Fit a trend on the whole table and project it `horizon` years ahead
///
/// # Arguments
/// * `table` - Cleaned dataset
/// * `predictor_column` - Year column used as x
/// * `target_column` - Column to project
/// * `horizon` - Projected years run to `max(year) + horizon - 1`; at least 1
pub fn project(
    table: &CleanedTable,
    predictor_column: &str,
    target_column: &str,
    horizon: i64,
) -> Result<Projection> {
    if horizon < 1 {
        return Err(Error::InvalidParameter {
            name: "horizon",
            value: horizon.to_string(),
            expected: "at least 1",
        });
    }

    let model = TrendModel::fit(table, predictor_column, target_column)?;

    let observed = table.column(predictor_column)?.to_f64();
    let first = observed.iter().copied().fold(f64::INFINITY, f64::min) as i64;
    let last = observed.iter().copied().fold(f64::NEG_INFINITY, f64::max) as i64;

    let end = last
        .checked_add(horizon)
        .ok_or_else(|| Error::InvalidParameter {
            name: "horizon",
            value: horizon.to_string(),
            expected: "a year range that fits in i64",
        })?;
    let years: Vec<i64> = (first..end).collect();
    let predicted = model.predict(&years.iter().map(|&y| y as f64).collect::<Vec<_>>());

    let mut real_and_predicted = table.column(target_column)?.to_f64();
    if real_and_predicted.len() < predicted.len() {
        real_and_predicted.extend_from_slice(&predicted[real_and_predicted.len()..]);
    }

    Ok(Projection {
        target: target_column.to_string(),
        years,
        predicted,
        real_and_predicted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{NUMBER_OF_STUDENTS, YEAR_START};
    use crate::normalize::NumericColumn;

    fn table(years: Vec<i64>, students: Vec<i64>) -> CleanedTable {
        let n = years.len();
        CleanedTable {
            school_year: years.iter().map(|y| format!("{}/{}", y, y + 1)).collect(),
            school_number: NumericColumn::Int(vec![1; n]),
            classroom_number: NumericColumn::Int(vec![1; n]),
            number_of_teachers: NumericColumn::Float(vec![1.5; n]),
            number_of_students: NumericColumn::Int(students),
            year_end: NumericColumn::Int(years.iter().map(|y| y + 1).collect()),
            year_start: NumericColumn::Int(years),
        }
    }

    #[test]
    fn test_fit_and_predict() {
        let model = TrendModel::fit_xy(&[0.0, 1.0, 2.0, 3.0], &[0.0, 2.0, 4.0, 6.0]).unwrap();
        assert!((model.slope() - 2.0).abs() < 1e-9);
        assert!(model.intercept().abs() < 1e-9);

        let predicted = model.predict(&[4.0, 5.0]);
        assert!((predicted[0] - 8.0).abs() < 1e-9);
        assert!((predicted[1] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_on_table_columns() {
        let t = table(vec![2000, 2001, 2002, 2003], vec![100, 90, 80, 70]);
        let model = TrendModel::fit(&t, YEAR_START, NUMBER_OF_STUDENTS).unwrap();
        assert!((model.slope() + 10.0).abs() < 1e-6);
        assert!((model.predict_one(2004.0) - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_fit() {
        let err = TrendModel::fit_xy(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientData {
                required: 2,
                actual: 1
            }
        ));

        let err = TrendModel::fit_xy(&[], &[]).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { actual: 0, .. }));
    }

    #[test]
    fn test_unknown_column() {
        let t = table(vec![2000, 2001], vec![1, 2]);
        let err = TrendModel::fit(&t, "year", NUMBER_OF_STUDENTS).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn(_)));
    }

    #[test]
    fn test_projection() {
        let t = table(vec![2000, 2001, 2002], vec![100, 110, 120]);
        let projection = project(&t, YEAR_START, NUMBER_OF_STUDENTS, 3).unwrap();

        assert_eq!(projection.years, vec![2000, 2001, 2002, 2003, 2004]);
        assert_eq!(projection.predicted.len(), 5);
        assert!((projection.predicted[4] - 140.0).abs() < 1e-6);

        assert_eq!(projection.real_and_predicted.len(), 5);
        assert_eq!(&projection.real_and_predicted[..3], &[100.0, 110.0, 120.0]);
        assert!((projection.real_and_predicted[3] - 130.0).abs() < 1e-6);
    }

    #[test]
    fn test_projection_rejects_short_horizon() {
        let t = table(vec![2000, 2001, 2002], vec![100, 110, 120]);

        for horizon in [0, -3] {
            let err = project(&t, YEAR_START, NUMBER_OF_STUDENTS, horizon).unwrap_err();
            assert!(matches!(err, Error::InvalidParameter { name: "horizon", .. }));
        }

        let err = project(&t, YEAR_START, NUMBER_OF_STUDENTS, i64::MAX).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "horizon", .. }));
    }
}
