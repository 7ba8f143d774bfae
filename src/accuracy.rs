//! Hold-out error of the trend model over seeded random splits

use crate::data::CleanedTable;
use crate::error::{Error, Result};
use crate::model::TrendModel;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

/// One row in `HOLD_OUT_EVERY` is held out from fitting (20%)
pub const HOLD_OUT_EVERY: usize = 5;

/// Shuffle `0..n` with `seed` and cut it into (train, test) index sets.
///
/// The held-out set is the first `ceil(n / 5)` shuffled indices.
pub fn split_indices(n: usize, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = n.div_ceil(HOLD_OUT_EVERY);
    let train = indices.split_off(n_test);
    (train, indices)
}

/// Mean absolute error between paired values
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }

    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();

    sum / actual.len() as f64
}

/// Fit on a seeded 80% of the rows and return the MAE on the other 20%.
///
/// The same seed always produces the same partition for the same table.
pub fn estimate(
    table: &CleanedTable,
    predictor_column: &str,
    target_column: &str,
    seed: u64,
) -> Result<f64> {
    let x = table.column(predictor_column)?.to_f64();
    let y = table.column(target_column)?.to_f64();
    let (train, test) = split_indices(x.len(), seed);

    let pick = |values: &[f64], idx: &[usize]| idx.iter().map(|&i| values[i]).collect::<Vec<f64>>();
    let model = TrendModel::fit_xy(&pick(&x, &train), &pick(&y, &train))?;

    let predicted = model.predict(&pick(&x, &test));
    let error = mean_absolute_error(&pick(&y, &test), &predicted);
    debug!(seed, train = train.len(), test = test.len(), error, "hold-out error");
    Ok(error)
}

/// Average of [`estimate`] over seeds `0..trials`
pub fn estimate_average(
    table: &CleanedTable,
    predictor_column: &str,
    target_column: &str,
    trials: usize,
) -> Result<f64> {
    if trials == 0 {
        return Err(Error::InvalidParameter {
            name: "trials",
            value: trials.to_string(),
            expected: "at least 1",
        });
    }

    let errors = (0..trials as u64)
        .map(|seed| estimate(table, predictor_column, target_column, seed))
        .collect::<Result<Vec<f64>>>()?;

    Ok(errors.iter().sum::<f64>() / errors.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{NUMBER_OF_TEACHERS, YEAR_START};
    use crate::normalize::NumericColumn;

    fn noisy_table() -> CleanedTable {
        let years: Vec<i64> = (1990..2010).collect();
        let teachers: Vec<f64> = years
            .iter()
            .enumerate()
            .map(|(i, &y)| 90_000.0 - 250.0 * (y - 1990) as f64 + if i % 3 == 0 { 400.0 } else { -150.0 })
            .collect();
        let n = years.len();
        CleanedTable {
            school_year: years.iter().map(|y| format!("{}/{}", y, y + 1)).collect(),
            school_number: NumericColumn::Int(vec![3500; n]),
            classroom_number: NumericColumn::Int(vec![48000; n]),
            number_of_teachers: NumericColumn::Float(teachers),
            number_of_students: NumericColumn::Int(vec![1_000_000; n]),
            year_end: NumericColumn::Int(years.iter().map(|y| y + 1).collect()),
            year_start: NumericColumn::Int(years),
        }
    }

    #[test]
    fn test_split_sizes_and_coverage() {
        let (train, test) = split_indices(20, 3);
        assert_eq!(test.len(), 4);
        assert_eq!(train.len(), 16);

        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());

        let (train, test) = split_indices(7, 0);
        assert_eq!(test.len(), 2);
        assert_eq!(train.len(), 5);
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let table = noisy_table();
        let a = estimate(&table, YEAR_START, NUMBER_OF_TEACHERS, 1).unwrap();
        let b = estimate(&table, YEAR_START, NUMBER_OF_TEACHERS, 1).unwrap();
        assert_eq!(a, b);
        assert!(a.is_finite() && a >= 0.0);
    }

    #[test]
    fn test_average_is_mean_of_seeds() {
        let table = noisy_table();
        let average = estimate_average(&table, YEAR_START, NUMBER_OF_TEACHERS, 10).unwrap();
        let manual: f64 = (0..10)
            .map(|seed| estimate(&table, YEAR_START, NUMBER_OF_TEACHERS, seed).unwrap())
            .sum::<f64>()
            / 10.0;
        assert!((average - manual).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_line_has_no_error() {
        let mut table = noisy_table();
        table.number_of_teachers =
            NumericColumn::Int((0..20).map(|i| 1000 + 5 * i).collect());
        let error = estimate(&table, YEAR_START, NUMBER_OF_TEACHERS, 4).unwrap();
        assert!(error < 1e-6);
    }

    #[test]
    fn test_zero_trials_rejected() {
        let err = estimate_average(&noisy_table(), YEAR_START, NUMBER_OF_TEACHERS, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "trials", .. }));
    }

    #[test]
    fn test_too_few_rows() {
        let table = noisy_table().head(1);
        let err = estimate(&table, YEAR_START, NUMBER_OF_TEACHERS, 0).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { .. }));
    }

    #[test]
    fn test_mae() {
        assert!((mean_absolute_error(&[1.0, 2.0], &[2.0, 0.0]) - 1.5).abs() < 1e-12);
        assert!(mean_absolute_error(&[], &[]).is_nan());
    }
}
