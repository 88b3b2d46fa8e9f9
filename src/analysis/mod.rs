pub mod charts;
pub mod questions;
pub mod stats;

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

use crate::dataset::{PullRequestState, Repository};
use questions::{Metric, Question, QUESTIONS};
use stats::Summary;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No resolved pull requests to analyze")]
    EmptyDataset,

    #[error("Failed to render chart {}: {reason}", path.display())]
    Chart { path: PathBuf, reason: String },
}

/// One row of the flattened table: a resolved PR and its derived metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct PrMetrics {
    pub state: PullRequestState,
    pub analysis_time_hours: f64,
    pub total_changes: u64,
    pub description_size: u64,
    pub interactions: u64,
    pub review_count: u64,
}

/// Result of correlating one question's field pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correlation {
    Coefficient(f64),
    /// Fewer than two rows, or a constant column.
    Undefined,
    /// One side is categorical; a rank correlation would be meaningless.
    Categorical(Metric),
}

#[derive(Debug, Clone)]
pub struct QuestionResult {
    pub question: Question,
    pub correlation: Correlation,
    pub chart: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Rows analyzed after dropping unresolved PRs.
    pub rows: usize,
    pub dropped: usize,
    pub results: Vec<QuestionResult>,
    pub summaries: Vec<(Metric, Summary)>,
}

/// Flatten every repository's PRs into table rows. PRs without a
/// resolution time are dropped; the second value counts them.
pub fn flatten(repositories: &[Repository]) -> (Vec<PrMetrics>, usize) {
    let mut rows = Vec::new();
    let mut dropped = 0;
    for repo in repositories {
        for pr in &repo.pull_requests {
            let Some(elapsed) = pr.resolution_time() else {
                dropped += 1;
                continue;
            };
            rows.push(PrMetrics {
                state: pr.state,
                analysis_time_hours: elapsed.num_milliseconds() as f64 / 3_600_000.0,
                total_changes: pr.additions + pr.deletions,
                description_size: pr.description_size,
                interactions: pr.comments_count + pr.participants_count,
                review_count: pr.review_count,
            });
        }
    }
    (rows, dropped)
}

/// Correlate a pair of columns. Categorical columns are flagged, not ranked.
pub fn correlate(rows: &[PrMetrics], pair: (Metric, Metric)) -> Correlation {
    let (a, b) = pair;
    if let Some(categorical) = [a, b].into_iter().find(|m| !m.is_numeric()) {
        return Correlation::Categorical(categorical);
    }
    let xs: Vec<f64> = rows.iter().filter_map(|r| a.value(r)).collect();
    let ys: Vec<f64> = rows.iter().filter_map(|r| b.value(r)).collect();
    match stats::spearman(&xs, &ys) {
        Some(rho) => Correlation::Coefficient(rho),
        None => Correlation::Undefined,
    }
}

pub fn summarize(rows: &[PrMetrics]) -> Vec<(Metric, Summary)> {
    Metric::SUMMARIZED
        .iter()
        .filter_map(|&metric| {
            let values: Vec<f64> = rows.iter().filter_map(|r| metric.value(r)).collect();
            Summary::of(&values).map(|summary| (metric, summary))
        })
        .collect()
}

/// Run every research question over the filtered dataset, writing one chart
/// per question into `chart_dir`.
pub fn run(repositories: &[Repository], chart_dir: &Path) -> Result<AnalysisReport, AnalysisError> {
    let (rows, dropped) = flatten(repositories);
    info!(rows = rows.len(), dropped, "flattened pull requests");
    if rows.is_empty() {
        return Err(AnalysisError::EmptyDataset);
    }

    let mut results = Vec::with_capacity(QUESTIONS.len());
    for question in QUESTIONS {
        let _span = info_span!("question", id = question.id).entered();

        let correlation = correlate(&rows, question.correlation);
        match correlation {
            Correlation::Categorical(metric) => warn!(
                column = metric.column(),
                "skipping rank correlation against a categorical column"
            ),
            other => debug!(correlation = ?other, "correlation computed"),
        }

        let chart = chart_dir.join(question.chart_file_name());
        charts::render(&question, &rows, &chart)?;
        results.push(QuestionResult {
            question,
            correlation,
            chart,
        });
    }

    Ok(AnalysisReport {
        rows: rows.len(),
        dropped,
        results,
        summaries: summarize(&rows),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{sample_record, sample_repository};

    fn sample_dataset() -> Vec<Repository> {
        let records = (1..=25)
            .map(|i| {
                let mut pr = sample_record(30 * i, (i % 4) as u64, 1);
                pr.additions = 10 * i as u64;
                pr.deletions = i as u64;
                pr.participants_count = (i % 3) as u64;
                if i % 5 == 0 {
                    pr.state = PullRequestState::Closed;
                    pr.merged_at = None;
                }
                pr
            })
            .collect();
        vec![sample_repository("octo/repo", records)]
    }

    #[test]
    fn test_flatten_derives_metrics() {
        let mut pr = sample_record(90, 2, 3);
        pr.additions = 7;
        pr.deletions = 5;
        pr.participants_count = 4;
        let (rows, dropped) = flatten(&[sample_repository("a/b", vec![pr])]);
        assert_eq!(dropped, 0);
        assert_eq!(rows[0].analysis_time_hours, 1.5);
        assert_eq!(rows[0].total_changes, 12);
        assert_eq!(rows[0].interactions, 7);
    }

    #[test]
    fn test_flatten_drops_unresolved() {
        let mut open = sample_record(90, 2, 3);
        open.merged_at = None;
        open.closed_at = None;
        let (rows, dropped) = flatten(&[sample_repository("a/b", vec![open, sample_record(20, 1, 1)])]);
        assert_eq!(rows.len(), 1);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_categorical_pair_is_flagged() {
        let (rows, _) = flatten(&sample_dataset());
        assert_eq!(
            correlate(&rows, (Metric::TotalChanges, Metric::State)),
            Correlation::Categorical(Metric::State)
        );
    }

    #[test]
    fn test_numeric_pair_is_correlated() {
        let (rows, _) = flatten(&sample_dataset());
        // total changes grow with analysis time in the sample
        match correlate(&rows, (Metric::TotalChanges, Metric::AnalysisTimeHours)) {
            Correlation::Coefficient(rho) => assert!((rho - 1.0).abs() < 1e-9),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_run_writes_all_charts() {
        let dir = tempfile::tempdir().unwrap();
        let report = run(&sample_dataset(), dir.path()).unwrap();
        assert_eq!(report.rows, 25);
        assert_eq!(report.results.len(), 8);
        assert_eq!(report.summaries.len(), 5);
        for result in &report.results {
            assert!(result.chart.exists(), "missing {}", result.chart.display());
        }
        assert!(matches!(report.results[0].correlation, Correlation::Categorical(_)));
        assert!(matches!(report.results[4].correlation, Correlation::Coefficient(_)));
    }

    #[test]
    fn test_run_rejects_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(run(&[], dir.path()), Err(AnalysisError::EmptyDataset)));
    }
}
