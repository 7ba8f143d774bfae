//! Raw source parsing, dataset cleaning and the cleaned table type

use crate::error::{Error, Result};
use crate::normalize::{normalize_column, Number, NumericColumn};
use ndarray::Array1;
use polars::prelude::*;
use tracing::{debug, info};

pub const SCHOOL_YEAR: &str = "school_year";
pub const SCHOOL_NUMBER: &str = "school_number";
pub const CLASSROOM_NUMBER: &str = "classroom_number";
pub const NUMBER_OF_TEACHERS: &str = "number_of_teachers";
pub const NUMBER_OF_STUDENTS: &str = "number_of_students";
pub const YEAR_START: &str = "year_start";
pub const YEAR_END: &str = "year_end";

/// Number of leading source columns the cleaner keeps
pub const SOURCE_COLUMNS: usize = 5;

/// Logical names given to the kept source columns, in source order
pub const SOURCE_SCHEMA: [&str; SOURCE_COLUMNS] = [
    SCHOOL_YEAR,
    SCHOOL_NUMBER,
    CLASSROOM_NUMBER,
    NUMBER_OF_TEACHERS,
    NUMBER_OF_STUDENTS,
];

/// Every numeric column of the cleaned table, in storage order
pub const NUMERIC_COLUMNS: [&str; 6] = [
    SCHOOL_NUMBER,
    CLASSROOM_NUMBER,
    NUMBER_OF_TEACHERS,
    NUMBER_OF_STUDENTS,
    YEAR_START,
    YEAR_END,
];

/// Metric columns in report order
pub const METRIC_COLUMNS: [&str; 4] = [
    NUMBER_OF_STUDENTS,
    NUMBER_OF_TEACHERS,
    SCHOOL_NUMBER,
    CLASSROOM_NUMBER,
];

/// Source text split into header and rows, every cell still a string
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Parse delimited text.
    ///
    /// The first `skip_lines` lines are discarded (the statistics office puts
    /// a title line above the header). The next record is the header row.
    /// Blank records are ignored and rows may be ragged.
    pub fn parse(text: &str, delimiter: u8, skip_lines: usize) -> Result<Self> {
        let text = text.trim_start_matches('\u{feff}');
        let mut body = text;
        for _ in 0..skip_lines {
            body = match body.split_once('\n') {
                Some((_, rest)) => rest,
                None => "",
            };
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(body.as_bytes());

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let mut records = records.into_iter();
        let headers = records.next().unwrap_or_default();
        let rows: Vec<Vec<String>> = records.collect();
        debug!(columns = headers.len(), rows = rows.len(), "parsed raw table");

        Ok(Self { headers, rows })
    }

    /// Cells of column `index`; a missing cell in a short row reads as ""
    pub fn column(&self, index: usize) -> Vec<&str> {
        self.rows
            .iter()
            .map(|row| row.get(index).map(String::as_str).unwrap_or(""))
            .collect()
    }
}

/// Header fragments of the live source, in column order
pub const SCHOOL_STATISTICS_HEADERS: [&str; SOURCE_COLUMNS] =
    ["tanév", "iskol", "osztály", "pedagógus", "tanul"];

/// Expected layout of the five leading source columns.
///
/// The source is positional: period first, then school, classroom, teacher
/// and student counts. A schema can additionally pin a header fragment per
/// column so a reordered source fails instead of being misattributed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceSchema {
    header_fragments: Option<[String; SOURCE_COLUMNS]>,
}

impl SourceSchema {
    /// Only require at least five columns
    pub fn positional() -> Self {
        Self::default()
    }

    /// Header stems of the statistics office table (school year, schools,
    /// classrooms, teachers, students), matched in singular or plural form
    pub fn school_statistics() -> Self {
        Self::with_headers(SCHOOL_STATISTICS_HEADERS)
    }

    /// Require each header to contain the given fragment (case-insensitive)
    pub fn with_headers(fragments: [&str; SOURCE_COLUMNS]) -> Self {
        Self {
            header_fragments: Some(fragments.map(|f| f.trim().to_lowercase())),
        }
    }

    pub fn validate(&self, headers: &[String]) -> Result<()> {
        if headers.len() < SOURCE_COLUMNS {
            return Err(Error::SchemaMismatch(format!(
                "expected at least {} columns, found {}",
                SOURCE_COLUMNS,
                headers.len()
            )));
        }

        if let Some(fragments) = &self.header_fragments {
            for (i, fragment) in fragments.iter().enumerate() {
                let header = headers[i].trim().to_lowercase();
                if !header.contains(fragment.as_str()) {
                    return Err(Error::SchemaMismatch(format!(
                        "column {} ('{}') should hold '{}' but its header is '{}'",
                        i,
                        SOURCE_SCHEMA[i],
                        fragment,
                        headers[i].trim()
                    )));
                }
            }
        }

        Ok(())
    }
}

/// One cleaned row, materialized from the column store
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRow {
    pub school_year: String,
    pub school_number: Number,
    pub classroom_number: Number,
    pub number_of_teachers: Number,
    pub number_of_students: Number,
    pub year_start: Number,
    pub year_end: Number,
}

/// Cleaned dataset, one typed column per logical field.
///
/// Row order is source order; the row index is implicit, so a table is
/// always numbered 0..n whether it was cleaned or loaded from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTable {
    /// Original period text, e.g. "1990/1991"
    pub school_year: Vec<String>,
    pub school_number: NumericColumn,
    pub classroom_number: NumericColumn,
    pub number_of_teachers: NumericColumn,
    pub number_of_students: NumericColumn,
    pub year_start: NumericColumn,
    pub year_end: NumericColumn,
}

impl CleanedTable {
    pub fn len(&self) -> usize {
        self.school_year.len()
    }

    pub fn is_empty(&self) -> bool {
        self.school_year.is_empty()
    }

    pub fn is_numeric_column(name: &str) -> bool {
        NUMERIC_COLUMNS.contains(&name)
    }

    /// Look up a numeric column by its logical name
    pub fn column(&self, name: &str) -> Result<&NumericColumn> {
        match name {
            SCHOOL_NUMBER => Ok(&self.school_number),
            CLASSROOM_NUMBER => Ok(&self.classroom_number),
            NUMBER_OF_TEACHERS => Ok(&self.number_of_teachers),
            NUMBER_OF_STUDENTS => Ok(&self.number_of_students),
            YEAR_START => Ok(&self.year_start),
            YEAR_END => Ok(&self.year_end),
            other => Err(Error::UnknownColumn(other.to_string())),
        }
    }

    /// Numeric column names in storage order
    pub fn numeric_columns(&self) -> [(&'static str, &NumericColumn); 6] {
        [
            (SCHOOL_NUMBER, &self.school_number),
            (CLASSROOM_NUMBER, &self.classroom_number),
            (NUMBER_OF_TEACHERS, &self.number_of_teachers),
            (NUMBER_OF_STUDENTS, &self.number_of_students),
            (YEAR_START, &self.year_start),
            (YEAR_END, &self.year_end),
        ]
    }

    pub fn row(&self, index: usize) -> Option<CleanedRow> {
        Some(CleanedRow {
            school_year: self.school_year.get(index)?.clone(),
            school_number: self.school_number.get(index)?,
            classroom_number: self.classroom_number.get(index)?,
            number_of_teachers: self.number_of_teachers.get(index)?,
            number_of_students: self.number_of_students.get(index)?,
            year_start: self.year_start.get(index)?,
            year_end: self.year_end.get(index)?,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = CleanedRow> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Self {
        Self {
            school_year: self.school_year.iter().take(n).cloned().collect(),
            school_number: self.school_number.truncated(n),
            classroom_number: self.classroom_number.truncated(n),
            number_of_teachers: self.number_of_teachers.truncated(n),
            number_of_students: self.number_of_students.truncated(n),
            year_start: self.year_start.truncated(n),
            year_end: self.year_end.truncated(n),
        }
    }

    /// Summary statistics of the named numeric columns
    pub fn describe(&self, columns: &[&str]) -> Result<Vec<ColumnSummary>> {
        columns
            .iter()
            .map(|&name| -> Result<ColumnSummary> {
                Ok(ColumnSummary::of(name, &self.column(name)?.to_f64()))
            })
            .collect()
    }

    /// Polars view of the table, `school_year` first
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![Column::new(SCHOOL_YEAR.into(), self.school_year.clone())];
        for (name, values) in self.numeric_columns() {
            let column = match values {
                NumericColumn::Int(v) => Column::new(name.into(), v.clone()),
                NumericColumn::Float(v) => Column::new(name.into(), v.clone()),
            };
            columns.push(column);
        }
        Ok(DataFrame::new(columns)?)
    }

    /// Rebuild a table from a polars frame with the cleaned schema.
    ///
    /// Integer dtypes map to int columns and float dtypes to float columns;
    /// nulls in a float column become NaN.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let school_year = df
            .column(SCHOOL_YEAR)?
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect();

        Ok(Self {
            school_year,
            school_number: numeric_from_frame(df, SCHOOL_NUMBER)?,
            classroom_number: numeric_from_frame(df, CLASSROOM_NUMBER)?,
            number_of_teachers: numeric_from_frame(df, NUMBER_OF_TEACHERS)?,
            number_of_students: numeric_from_frame(df, NUMBER_OF_STUDENTS)?,
            year_start: numeric_from_frame(df, YEAR_START)?,
            year_end: numeric_from_frame(df, YEAR_END)?,
        })
    }
}

fn numeric_from_frame(df: &DataFrame, name: &str) -> Result<NumericColumn> {
    let column = df.column(name)?;
    let dtype = column.dtype().clone();

    if dtype.is_integer() {
        let values = column.cast(&DataType::Int64)?;
        let values = values
            .i64()?
            .into_iter()
            .map(|v| {
                v.ok_or_else(|| Error::SchemaMismatch(format!("null in integer column '{name}'")))
            })
            .collect::<Result<Vec<i64>>>()?;
        Ok(NumericColumn::Int(values))
    } else if dtype.is_float() {
        let values = column.cast(&DataType::Float64)?;
        let values = values
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        Ok(NumericColumn::Float(values))
    } else if column.len() == 0 {
        // A header-only file carries no type information
        Ok(NumericColumn::Int(Vec::new()))
    } else {
        Err(Error::SchemaMismatch(format!(
            "column '{name}' has non-numeric type {dtype}"
        )))
    }
}

/// Split every "start/end" period into its two halves
fn split_periods(periods: &[String]) -> Result<(Vec<&str>, Vec<&str>)> {
    let mut starts = Vec::with_capacity(periods.len());
    let mut ends = Vec::with_capacity(periods.len());
    for period in periods {
        let mut parts = period.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(start), Some(end), None) => {
                starts.push(start);
                ends.push(end);
            }
            _ => {
                return Err(Error::Format {
                    value: period.clone(),
                })
            }
        }
    }
    Ok((starts, ends))
}

/// Clean a raw source table into the fixed logical schema.
///
/// Keeps the first five columns, names them positionally, splits the period
/// into `year_start`/`year_end` and normalizes every numeric column on its
/// own. `year_end == year_start + 1` is not checked.
pub fn clean(raw: &RawTable, schema: &SourceSchema) -> Result<CleanedTable> {
    schema.validate(&raw.headers)?;
    if raw.headers.len() > SOURCE_COLUMNS {
        debug!(
            dropped = raw.headers.len() - SOURCE_COLUMNS,
            "discarding trailing source columns"
        );
    }

    let school_year: Vec<String> = raw.column(0).into_iter().map(str::to_string).collect();
    let (starts, ends) = split_periods(&school_year)?;

    let table = CleanedTable {
        school_number: normalize_column(SCHOOL_NUMBER, &raw.column(1))?,
        classroom_number: normalize_column(CLASSROOM_NUMBER, &raw.column(2))?,
        number_of_teachers: normalize_column(NUMBER_OF_TEACHERS, &raw.column(3))?,
        number_of_students: normalize_column(NUMBER_OF_STUDENTS, &raw.column(4))?,
        year_start: normalize_column(YEAR_START, &starts)?,
        year_end: normalize_column(YEAR_END, &ends)?,
        school_year,
    };

    info!(rows = table.len(), "cleaned source table");
    Ok(table)
}

/// Descriptive statistics of one numeric column, NaN cells excluded
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1)
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnSummary {
    pub fn of(name: &str, values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let present = Array1::from_vec(sorted.clone());
        let count = present.len();

        let std = if count < 2 { f64::NAN } else { present.std(1.0) };

        Self {
            name: name.to_string(),
            count,
            mean: present.mean().unwrap_or(f64::NAN),
            std,
            min: sorted.first().copied().unwrap_or(f64::NAN),
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted.last().copied().unwrap_or(f64::NAN),
        }
    }
}

/// Linear-interpolation quantile of sorted values
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
