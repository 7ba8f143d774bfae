//! Chart rendering with Plotters and the console overview of the table

use crate::config::PipelineConfig;
use crate::data::{
    CleanedTable, ColumnSummary, METRIC_COLUMNS, NUMBER_OF_STUDENTS, NUMBER_OF_TEACHERS,
    SCHOOL_NUMBER, YEAR_START,
};
use crate::model::{project, Projection};
use plotters::prelude::*;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default palette, cycled when a chart has more series than colours
const SERIES_COLORS: [RGBColor; 5] = [BLUE, RED, GREEN, MAGENTA, CYAN];

const LIGHT_BLUE: RGBColor = RGBColor(135, 206, 250);
const ORANGE: RGBColor = RGBColor(255, 165, 0);

/// Real/model colour pairs of the projection chart: left axis, then right axis
pub const PROJECTION_COLORS: [RGBColor; 4] = [BLUE, LIGHT_BLUE, RED, ORANGE];

/// One named y series
#[derive(Debug, Clone, Copy)]
pub struct NamedSeries<'a> {
    pub name: &'a str,
    pub values: &'a [f64],
}

impl<'a> NamedSeries<'a> {
    pub fn new(name: &'a str, values: &'a [f64]) -> Self {
        Self { name, values }
    }
}

/// Cosmetic chart parameters
#[derive(Debug, Clone, Default)]
pub struct ChartOptions {
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    /// Empty means the default palette
    pub colors: Vec<RGBColor>,
}

impl ChartOptions {
    pub fn new(x_label: &str, y_label: &str) -> Self {
        Self {
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_colors(mut self, colors: &[RGBColor]) -> Self {
        self.colors = colors.to_vec();
        self
    }

    /// Explicit title, else "`kind`: x vs y" when both axis labels are set
    fn resolved_title(&self, kind: &str) -> Option<String> {
        match &self.title {
            Some(title) if !title.is_empty() => Some(title.clone()),
            _ if !self.x_label.is_empty() && !self.y_label.is_empty() => {
                Some(format!("{}: {} vs {}", kind, self.x_label, self.y_label))
            }
            _ => None,
        }
    }

    fn color(&self, idx: usize) -> RGBColor {
        if self.colors.is_empty() {
            SERIES_COLORS[idx % SERIES_COLORS.len()]
        } else {
            self.colors[idx % self.colors.len()]
        }
    }
}

/// Padded plotting range of the finite values
fn value_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> Range<f64> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if !min.is_finite() {
        return 0.0..1.0;
    }
    let pad = if max > min {
        (max - min) * 0.05
    } else {
        min.abs() * 0.05 + 1.0
    };
    (min - pad)..(max + pad)
}

fn points<'a>(x: &'a [f64], y: &'a [f64]) -> impl Iterator<Item = (f64, f64)> + 'a {
    x.iter()
        .copied()
        .zip(y.iter().copied())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
}

fn format_tick(v: f64) -> String {
    if v.abs() >= 100.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}

/// Line chart of several series against one x axis
///
/// # Arguments
/// * `output_path` - PNG file to write
/// * `x` - Shared x values (e.g. school year start)
/// * `series` - One or more named y series, each as long as `x`
/// * `options` - Labels, optional title and colours
pub fn line_chart(
    output_path: &Path,
    x: &[f64],
    series: &[NamedSeries],
    options: &ChartOptions,
) -> crate::Result<()> {
    let root = BitMapBackend::new(output_path, (1000, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let y_range = value_range(series.iter().flat_map(|s| s.values.iter()));
    let mut builder = ChartBuilder::on(&root);
    builder.margin(15).x_label_area_size(45).y_label_area_size(90);
    if let Some(title) = options.resolved_title("Line chart") {
        builder.caption(title, ("sans-serif", 26));
    }
    let mut chart = builder.build_cartesian_2d(value_range(x), y_range)?;

    chart
        .configure_mesh()
        .x_desc(options.x_label.as_str())
        .y_desc(options.y_label.as_str())
        .x_label_formatter(&|v| format_tick(*v))
        .y_label_formatter(&|v| format_tick(*v))
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (idx, s) in series.iter().enumerate() {
        let color = options.color(idx);
        chart
            .draw_series(LineSeries::new(points(x, s.values), color.stroke_width(2)))?
            .label(s.name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart.draw_series(points(x, s.values).map(|p| Circle::new(p, 4, color.filled())))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    info!(path = %output_path.display(), "line chart saved");
    Ok(())
}

/// One line panel per series, stacked vertically
pub fn multiline_chart(
    output_path: &Path,
    x: &[f64],
    series: &[NamedSeries],
    x_label: &str,
) -> crate::Result<()> {
    let height = 250 * series.len().max(1) as u32;
    let root = BitMapBackend::new(output_path, (1000, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((series.len().max(1), 1));
    for (idx, (panel, s)) in panels.iter().zip(series.iter()).enumerate() {
        let color = SERIES_COLORS[idx % SERIES_COLORS.len()];
        let mut chart = ChartBuilder::on(panel)
            .caption(format!("Line chart: {} vs {}", x_label, s.name), ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(90)
            .build_cartesian_2d(value_range(x), value_range(s.values.iter()))?;

        chart
            .configure_mesh()
            .x_desc(x_label)
            .y_desc(s.name)
            .x_label_formatter(&|v| format_tick(*v))
            .y_label_formatter(&|v| format_tick(*v))
            .draw()?;

        chart
            .draw_series(LineSeries::new(points(x, s.values), color.stroke_width(2)))?
            .label(s.name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart.draw_series(points(x, s.values).map(|p| Circle::new(p, 3, color.filled())))?;

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    info!(path = %output_path.display(), "multi-line chart saved");
    Ok(())
}

/// Scatter chart; with `mirror_x` the x axis runs from high to low
pub fn scatter_chart(
    output_path: &Path,
    x: &[f64],
    y: &[f64],
    options: &ChartOptions,
    mirror_x: bool,
) -> crate::Result<()> {
    let sign = if mirror_x { -1.0 } else { 1.0 };
    let x: Vec<f64> = x.iter().map(|v| v * sign).collect();

    let root = BitMapBackend::new(output_path, (1000, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut builder = ChartBuilder::on(&root);
    builder.margin(15).x_label_area_size(45).y_label_area_size(90);
    if let Some(title) = options.resolved_title("Scatter chart") {
        builder.caption(title, ("sans-serif", 26));
    }
    let mut chart = builder.build_cartesian_2d(value_range(x.iter()), value_range(y.iter()))?;

    chart
        .configure_mesh()
        .x_desc(options.x_label.as_str())
        .y_desc(options.y_label.as_str())
        .x_label_formatter(&|v| format_tick(*v * sign))
        .y_label_formatter(&|v| format_tick(*v))
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    let color = options.color(0);
    chart
        .draw_series(points(&x, y).map(|p| Cross::new(p, 5, color.stroke_width(2))))?
        .label(options.y_label.as_str())
        .legend(move |(x, y)| Cross::new((x + 10, y), 5, color.stroke_width(2)));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    info!(path = %output_path.display(), "scatter chart saved");
    Ok(())
}

/// Two projections on one chart, the first on the left y axis and the
/// second on the right one.
///
/// Real values (extended with the trend past the last observation) are drawn
/// as crosses, the fitted trend as a line. `options.colors` is read pairwise:
/// real/trend for the left axis, then real/trend for the right axis.
pub fn projection_chart(
    output_path: &Path,
    left: &Projection,
    right: &Projection,
    options: &ChartOptions,
) -> crate::Result<()> {
    let years: Vec<f64> = left.years.iter().map(|&y| y as f64).collect();
    let right_years: Vec<f64> = right.years.iter().map(|&y| y as f64).collect();

    let root = BitMapBackend::new(output_path, (1000, 550)).into_drawing_area();
    root.fill(&WHITE)?;

    let left_range = value_range(left.real_and_predicted.iter().chain(left.predicted.iter()));
    let right_range = value_range(right.real_and_predicted.iter().chain(right.predicted.iter()));
    let x_range = value_range(years.iter().chain(right_years.iter()));

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(90)
        .right_y_label_area_size(90);
    if let Some(title) = &options.title {
        builder.caption(title, ("sans-serif", 26));
    }
    let mut chart = builder
        .build_cartesian_2d(x_range.clone(), left_range)?
        .set_secondary_coord(x_range, right_range);

    let left_color = options.color(0);
    let right_color = options.color(2);

    chart
        .configure_mesh()
        .x_desc(options.x_label.as_str())
        .y_desc(left.target.as_str())
        .x_label_formatter(&|v| format_tick(*v))
        .y_label_formatter(&|v| format_tick(*v))
        .axis_desc_style(("sans-serif", 15).into_font().color(&left_color))
        .draw()?;
    chart
        .configure_secondary_axes()
        .y_desc(right.target.as_str())
        .y_label_formatter(&|v| format_tick(*v))
        .axis_desc_style(("sans-serif", 15).into_font().color(&right_color))
        .draw()?;

    let real_name = format!("{} (real and projected)", left.target);
    let trend_name = format!("{} (trend)", left.target);
    let trend_color = options.color(1);
    chart
        .draw_series(
            points(&years, &left.real_and_predicted)
                .map(|p| Cross::new(p, 5, left_color.stroke_width(2))),
        )?
        .label(real_name)
        .legend(move |(x, y)| Cross::new((x + 10, y), 5, left_color.stroke_width(2)));
    chart
        .draw_series(LineSeries::new(
            points(&years, &left.predicted),
            trend_color.stroke_width(2),
        ))?
        .label(trend_name)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], trend_color));

    let real_name = format!("{} (real and projected)", right.target);
    let trend_name = format!("{} (trend)", right.target);
    let trend_color = options.color(3);
    chart
        .draw_secondary_series(
            points(&right_years, &right.real_and_predicted)
                .map(|p| Cross::new(p, 5, right_color.stroke_width(2))),
        )?
        .label(real_name)
        .legend(move |(x, y)| Cross::new((x + 10, y), 5, right_color.stroke_width(2)));
    chart
        .draw_secondary_series(LineSeries::new(
            points(&right_years, &right.predicted),
            trend_color.stroke_width(2),
        ))?
        .label(trend_name)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], trend_color));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    info!(path = %output_path.display(), "projection chart saved");
    Ok(())
}

/// Print the first rows and summary statistics of the metric columns
pub fn print_table_overview(table: &CleanedTable, rows: usize) -> crate::Result<()> {
    println!("\n=== First {} rows ===", rows.min(table.len()));
    println!("{}", table.head(rows).to_dataframe()?);

    println!("\n=== Summary statistics ===");
    print_summaries(&table.describe(&METRIC_COLUMNS)?);
    Ok(())
}

/// Print describe-style statistics, one column per summary
pub fn print_summaries(summaries: &[ColumnSummary]) {
    print!("{:>6}", "");
    for s in summaries {
        print!(" {:>20}", s.name);
    }
    println!();

    let stats: [(&str, fn(&ColumnSummary) -> f64); 8] = [
        ("count", |s| s.count as f64),
        ("mean", |s| s.mean),
        ("std", |s| s.std),
        ("min", |s| s.min),
        ("25%", |s| s.q25),
        ("50%", |s| s.median),
        ("75%", |s| s.q75),
        ("max", |s| s.max),
    ];
    for (label, get) in stats {
        print!("{:>6}", label);
        for s in summaries {
            print!(" {:>20.2}", get(s));
        }
        println!();
    }
}

/// Render the full chart set of the analysis into `config.output_dir`
///
/// # Returns
/// * Paths of the written PNG files
pub fn generate_report(table: &CleanedTable, config: &PipelineConfig) -> crate::Result<Vec<PathBuf>> {
    fs::create_dir_all(&config.output_dir)?;
    let out = |name: &str| config.output_dir.join(name);
    let mut written = Vec::new();

    let years = table.column(YEAR_START)?.to_f64();
    let metrics = METRIC_COLUMNS
        .iter()
        .map(|&name| -> crate::Result<(&'static str, Vec<f64>)> {
            Ok((name, table.column(name)?.to_f64()))
        })
        .collect::<crate::Result<Vec<_>>>()?;
    let series: Vec<NamedSeries> = metrics
        .iter()
        .map(|(name, values)| NamedSeries::new(name, values))
        .collect();

    let path = out("metrics_line.png");
    line_chart(&path, &years, &series, &ChartOptions::new("School year start", "Values"))?;
    written.push(path);

    let path = out("metrics_panels.png");
    multiline_chart(&path, &years, &series, "School year start")?;
    written.push(path);

    let students = table.column(NUMBER_OF_STUDENTS)?.to_f64();
    let teachers = table.column(NUMBER_OF_TEACHERS)?.to_f64();
    let schools = table.column(SCHOOL_NUMBER)?.to_f64();

    let scatters: [(&str, &[f64], &[f64], ChartOptions, bool); 6] = [
        ("students_teachers.png", &students[..], &teachers[..], ChartOptions::new("Students", "Teachers"), false),
        ("students_teachers_mirrored.png", &students[..], &teachers[..], ChartOptions::new("Students", "Teachers"), true),
        ("schools_teachers.png", &schools[..], &teachers[..], ChartOptions::new("Schools", "Teachers"), false),
        ("schools_students.png", &schools[..], &students[..], ChartOptions::new("Schools", "Students"), false),
        ("year_students.png", &years[..], &students[..], ChartOptions::new("Year", "Students"), false),
        ("year_teachers.png", &years[..], &teachers[..], ChartOptions::new("Year", "Teachers"), false),
    ];
    for (name, x, y, options, mirror) in scatters.iter() {
        let path = out(*name);
        scatter_chart(&path, x, y, options, *mirror)?;
        written.push(path);
    }

    let student_projection = project(table, &config.predictor, NUMBER_OF_STUDENTS, config.future_years)?;
    let teacher_projection = project(table, &config.predictor, NUMBER_OF_TEACHERS, config.future_years)?;
    let path = out("projection.png");
    projection_chart(
        &path,
        &student_projection,
        &teacher_projection,
        &ChartOptions::new("School year start", "")
            .with_title("Number of students and teachers")
            .with_colors(&PROJECTION_COLORS),
    )?;
    written.push(path);

    Ok(written)
}
