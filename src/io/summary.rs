use crate::compile::CompileReport;
use crate::experiment::{ExperimentReport, RowState};

pub fn format_generate_summary(reports: &[ExperimentReport]) -> String {
    let version = env!("CARGO_PKG_VERSION");
    let mut out = String::new();
    out.push_str(&format!("paint-squares v{}\n", version));
    for report in reports {
        out.push_str(&format!(
            "{}: {} included, {} excluded, {} failed, {} not selected ({:.1}s)\n",
            report.experiment_dir.display(),
            report.count(RowState::Included),
            report.count(RowState::Excluded),
            report.failed(),
            report.count(RowState::Pending) - report.failed(),
            report.elapsed_ms as f64 / 1000.0
        ));
        for row in &report.rows {
            if let Some(err) = &row.error {
                out.push_str(&format!("  skipped {}: {}\n", row.ext_recording_name, err));
            }
        }
    }
    out
}

pub fn format_compile_summary(report: &CompileReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("paint-squares v{}\n", env!("CARGO_PKG_VERSION")));
    out.push_str(&format!(
        "Compiled {} experiments, {} images, {} squares into {}\n",
        report.experiments,
        report.images,
        report.squares,
        report.output_dir.display()
    ));
    if report.missing_squares.is_empty() {
        out.push_str("Missing squares files: none\n");
    } else {
        out.push_str(&format!(
            "Missing squares files: {}\n",
            report.missing_squares.join(", ")
        ));
    }
    out
}
