//! Integration tests for edutrend

use edutrend::data::{NUMBER_OF_STUDENTS, NUMBER_OF_TEACHERS, YEAR_START};
use edutrend::pipeline::clean_source;
use edutrend::{
    estimate, estimate_average, load_data, project, Error, Number, NumericColumn,
    PipelineConfig, SourceFetcher, TabularCache, TrendModel,
};
use tempfile::tempdir;

/// Source text in the statistics office layout: title line, header, data rows
fn create_test_source() -> String {
    let mut text = String::from("8.1. Schools, classrooms, teachers and students\n");
    text.push_str("Tanév;Iskolák;Osztálytermek;Pedagógusok;Tanulók;\n");

    for i in 0..12i64 {
        let year = 2000 + i;
        let schools = 3_600 - 15 * i;
        let classrooms = 48_000 + 120 * i;
        let teachers = 90_000.0 - 210.5 * i as f64 + if i % 2 == 0 { 75.0 } else { -75.0 };
        let students = 1_120_000 - 9_500 * i;
        text.push_str(&format!(
            "{}/{};{};{};{};{};\n",
            year,
            year + 1,
            group_thousands(schools),
            group_thousands(classrooms),
            format!("{:.1}", teachers).replace('.', ","),
            group_thousands(students),
        ));
    }
    text
}

/// Format with a non-breaking space thousands separator
fn group_thousands(value: i64) -> String {
    let digits = value.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('\u{a0}');
        }
        out.push(c);
    }
    out
}

struct FixedSource(String);

impl SourceFetcher for FixedSource {
    fn fetch(&self, _url: &str) -> edutrend::error::Result<String> {
        Ok(self.0.clone())
    }
}

#[test]
fn test_end_to_end_pipeline() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig {
        cache_dir: dir.path().to_path_buf(),
        ..PipelineConfig::default()
    };

    // Clean and cache
    let table = load_data(&config, &FixedSource(create_test_source())).unwrap();
    assert_eq!(table.len(), 12);
    assert_eq!(table.school_year[0], "2000/2001");
    assert_eq!(table.number_of_students.get(1), Some(Number::Int(1_110_500)));
    assert!(table.number_of_teachers.is_float());
    assert!(!table.school_number.is_float());

    // Every period is consecutive in well-formed input
    for row in table.rows() {
        assert_eq!(row.year_end.as_f64(), row.year_start.as_f64() + 1.0);
    }

    // Second run is served from the cache
    let cached = TabularCache::new(dir.path()).load("school").unwrap().unwrap();
    assert_eq!(cached, table);
}

#[test]
fn test_single_row_cleaning() {
    let text = "title\nperiod;a;b;c;d\n1990/1991;100;50;5,5;200\n";
    let table = clean_source(text, &PipelineConfig::default()).unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(table.year_start, NumericColumn::Int(vec![1990]));
    assert_eq!(table.year_end, NumericColumn::Int(vec![1991]));
    assert_eq!(table.school_number, NumericColumn::Int(vec![100]));
    assert_eq!(table.classroom_number, NumericColumn::Int(vec![50]));
    assert_eq!(table.number_of_teachers, NumericColumn::Float(vec![5.5]));
    assert_eq!(table.number_of_students, NumericColumn::Int(vec![200]));
}

#[test]
fn test_trend_and_projection() {
    let table = clean_source(&create_test_source(), &PipelineConfig::default()).unwrap();

    let model = TrendModel::fit(&table, YEAR_START, NUMBER_OF_STUDENTS).unwrap();
    assert!((model.slope() + 9_500.0).abs() < 1e-4);

    let projection = project(&table, YEAR_START, NUMBER_OF_STUDENTS, 10).unwrap();
    assert_eq!(projection.years.first(), Some(&2000));
    assert_eq!(projection.years.last(), Some(&2020));
    assert_eq!(projection.real_and_predicted.len(), projection.years.len());
    assert_eq!(projection.real_and_predicted[0], 1_120_000.0);
}

#[test]
fn test_accuracy_report() {
    let table = clean_source(&create_test_source(), &PipelineConfig::default()).unwrap();

    let single = estimate(&table, YEAR_START, NUMBER_OF_TEACHERS, 1).unwrap();
    assert_eq!(single, estimate(&table, YEAR_START, NUMBER_OF_TEACHERS, 1).unwrap());

    let average = estimate_average(&table, YEAR_START, NUMBER_OF_TEACHERS, 10).unwrap();
    let expected: f64 = (0..10)
        .map(|seed| estimate(&table, YEAR_START, NUMBER_OF_TEACHERS, seed).unwrap())
        .sum::<f64>()
        / 10.0;
    assert!((average - expected).abs() < 1e-9);

    // Residuals are +-75 around the trend
    assert!(average < 200.0, "average error {average}");
}

#[test]
fn test_error_handling() {
    let config = PipelineConfig::default();

    let err = clean_source("title\np;a;b;c;d\n1990/1991;1;2;x;4\n", &config).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));

    let err = clean_source("title\np;a;b;c;d\n1990-1991;1;2;3;4\n", &config).unwrap_err();
    assert!(matches!(err, Error::Format { .. }));

    let err = clean_source("title\np;a;b\n1990/1991;1;2\n", &config).unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch(_)));

    let table = clean_source("title\np;a;b;c;d\n1990/1991;1;2;3;4\n", &config).unwrap();
    let err = TrendModel::fit(&table, YEAR_START, NUMBER_OF_STUDENTS).unwrap_err();
    assert!(matches!(err, Error::InsufficientData { .. }));
}
