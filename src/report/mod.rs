use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::analysis::stats::Summary;
use crate::analysis::{AnalysisReport, Correlation};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Output the analysis to the terminal (default) or to a markdown file.
#[instrument(skip(report), fields(rows = report.rows))]
pub fn output(report: &AnalysisReport, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing report to terminal");
            print_terminal_report(report);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing report to file");
            std::fs::write(path, render_markdown(report))?;
            Ok(())
        }
    }
}

/// Correlations are shown to three decimals.
fn format_correlation(correlation: Correlation) -> String {
    match correlation {
        Correlation::Coefficient(rho) => format!("{rho:.3}"),
        Correlation::Undefined => "undefined".to_string(),
        Correlation::Categorical(metric) => format!("n/a (categorical: {})", metric.column()),
    }
}

const STAT_ROWS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

fn stat_cells(summary: &Summary) -> [String; 8] {
    [
        summary.count.to_string(),
        format!("{:.6}", summary.mean),
        summary.std.map_or("NaN".to_string(), |std| format!("{std:.6}")),
        format!("{:.6}", summary.min),
        format!("{:.6}", summary.q25),
        format!("{:.6}", summary.median),
        format!("{:.6}", summary.q75),
        format!("{:.6}", summary.max),
    ]
}

fn print_terminal_report(report: &AnalysisReport) {
    println!();
    println!(
        "Pull requests analyzed: {} ({} unresolved dropped)",
        report.rows, report.dropped
    );
    println!();

    println!("═══ Spearman correlations ═══");
    for result in &report.results {
        let (a, b) = result.question.correlation;
        let value = match result.correlation {
            Correlation::Coefficient(_) => format_correlation(result.correlation).bold(),
            _ => format_correlation(result.correlation).yellow(),
        };
        println!(
            "  {}: {} × {} = {}",
            result.question.id.cyan(),
            a.column(),
            b.column(),
            value
        );
    }
    println!();

    println!("═══ Charts ═══");
    for result in &report.results {
        println!("  {} → {}", result.question.id.cyan(), result.chart.display());
    }
    println!();

    println!("═══ Descriptive statistics ═══");
    let width = report
        .summaries
        .iter()
        .map(|(metric, _)| metric.column().len())
        .max()
        .unwrap_or(0)
        .max(14);
    let mut header = format!("{:>6}", "");
    for (metric, _) in &report.summaries {
        header.push_str(&format!("  {:>width$}", metric.column()));
    }
    println!("{}", header.bold());

    let cells: Vec<[String; 8]> = report.summaries.iter().map(|(_, s)| stat_cells(s)).collect();
    for (i, name) in STAT_ROWS.iter().enumerate() {
        let mut line = format!("{:>6}", name.bold());
        for column in &cells {
            line.push_str(&format!("  {:>width$}", column[i]));
        }
        println!("{line}");
    }
    println!();
}

fn render_markdown(report: &AnalysisReport) -> String {
    let mut md = String::new();
    md.push_str("# Pull request analysis\n\n");
    md.push_str(&format!(
        "**Pull requests analyzed:** {} | **Unresolved dropped:** {}\n\n",
        report.rows, report.dropped
    ));

    md.push_str("## Spearman correlations\n\n");
    md.push_str("| Question | Fields | Correlation | Chart |\n|---|---|---|---|\n");
    for result in &report.results {
        let (a, b) = result.question.correlation;
        md.push_str(&format!(
            "| {} | `{}` × `{}` | {} | `{}` |\n",
            result.question.id,
            a.column(),
            b.column(),
            format_correlation(result.correlation),
            result.chart.display()
        ));
    }
    md.push('\n');

    md.push_str("## Descriptive statistics\n\n|");
    for (metric, _) in &report.summaries {
        md.push_str(&format!(" | {}", metric.column()));
    }
    md.push_str(" |\n|---");
    md.push_str(&"|---".repeat(report.summaries.len()));
    md.push_str("|\n");
    let cells: Vec<[String; 8]> = report.summaries.iter().map(|(_, s)| stat_cells(s)).collect();
    for (i, name) in STAT_ROWS.iter().enumerate() {
        md.push_str(&format!("| {name}"));
        for column in &cells {
            md.push_str(&format!(" | {}", column[i]));
        }
        md.push_str(" |\n");
    }
    md
}
