use plotters::prelude::*;
use std::collections::BTreeMap;
use std::error::Error;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

use super::questions::{Chart, Metric, Question};
use super::{AnalysisError, PrMetrics};
use crate::dataset::PullRequestState;

const CHART_SIZE: (u32, u32) = (800, 500);

/// Render the chart of one question to an SVG file, replacing any previous one.
pub fn render(question: &Question, rows: &[PrMetrics], path: &Path) -> Result<(), AnalysisError> {
    let drawn = match question.chart {
        Chart::ByState(metric) => box_plot(question.title, metric, rows, path),
        Chart::Scatter { x, y } => scatter_plot(question.title, x, y, rows, path),
    };
    drawn.map_err(|err| AnalysisError::Chart {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    debug!(question = question.id, path = %path.display(), "chart written");
    Ok(())
}

fn box_plot(title: &str, metric: Metric, rows: &[PrMetrics], path: &Path) -> Result<(), Box<dyn Error>> {
    let mut groups: BTreeMap<PullRequestState, Vec<f64>> = BTreeMap::new();
    for row in rows {
        if let Some(value) = metric.value(row) {
            groups.entry(row.state).or_default().push(value);
        }
    }
    let labels: Vec<String> = groups.keys().map(ToString::to_string).collect();
    let y_range = padded_range(groups.values().flatten().copied());

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(labels[..].into_segmented(), y_range.start as f32..y_range.end as f32)?;

    chart
        .configure_mesh()
        .x_desc(Metric::State.axis_label())
        .y_desc(metric.axis_label())
        .x_label_formatter(&|value| match value {
            SegmentValue::Exact(label) | SegmentValue::CenterOf(label) => label.to_string(),
            SegmentValue::Last => String::new(),
        })
        .draw()?;

    chart.draw_series(labels.iter().zip(groups.values()).map(|(label, values)| {
        Boxplot::new_vertical(SegmentValue::CenterOf(label), &Quartiles::new(values.as_slice()))
    }))?;

    root.present()?;
    Ok(())
}

fn scatter_plot(
    title: &str,
    x: Metric,
    y: Metric,
    rows: &[PrMetrics],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let points: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|row| Some((x.value(row)?, y.value(row)?)))
        .collect();
    let x_range = padded_range(points.iter().map(|p| p.0));
    let y_range = padded_range(points.iter().map(|p| p.1));

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(x.axis_label())
        .y_desc(y.axis_label())
        .draw()?;

    chart.draw_series(
        points
            .iter()
            .map(|&(px, py)| Circle::new((px, py), 3, BLUE.mix(0.4).filled())),
    )?;

    root.present()?;
    Ok(())
}

/// Axis range covering every value with a 5% margin; never empty.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let span = max - min;
    let pad = if span > 0.0 { span * 0.05 } else { 1.0 };
    (min - pad)..(max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::questions::QUESTIONS;

    fn rows() -> Vec<PrMetrics> {
        (0..12)
            .map(|i| PrMetrics {
                state: if i % 3 == 0 {
                    PullRequestState::Closed
                } else {
                    PullRequestState::Merged
                },
                analysis_time_hours: i as f64 * 1.5,
                total_changes: 10 * i,
                description_size: 100 + i,
                interactions: i % 4,
                review_count: i % 5,
            })
            .collect()
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range([2.0, 2.0].into_iter()), 1.0..3.0);
        assert_eq!(padded_range(std::iter::empty()), 0.0..1.0);
        let range = padded_range([0.0, 100.0].into_iter());
        assert_eq!(range, -5.0..105.0);
    }

    #[test]
    fn test_render_every_question() {
        let dir = tempfile::tempdir().unwrap();
        let rows = rows();
        for question in &QUESTIONS {
            let path = dir.path().join(question.chart_file_name());
            render(question, &rows, &path).unwrap();
            let svg = std::fs::read_to_string(&path).unwrap();
            assert!(svg.contains("<svg"));
        }
    }

    #[test]
    fn test_render_into_missing_directory_fails() {
        let path = Path::new("/nonexistent/pr-insights/chart.svg");
        let err = render(&QUESTIONS[4], &rows(), path).unwrap_err();
        assert!(matches!(err, AnalysisError::Chart { .. }));
    }
}
