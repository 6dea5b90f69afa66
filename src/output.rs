//! CLI output formatting for the end-of-run summary.
//!
//! Per-file progress goes through the logger (`-v`); stdout only carries the
//! summary, so it stays readable at the default verbosity:
//!
//! ```text
//! 12 images, 48 jobs
//!     failed: Summer-2019/Beach-Day/320x240.webp
//!         input file not found: /photos/Summer 2019/Beach Day.jpg
//! 40 written, 7 up to date, 1 failed (48 total)
//! Images file: images.json
//! ```
//!
//! Formatting functions are pure and return lines; `print_*` wrappers write
//! them to stdout.

use crate::process::{JobOutcome, RunSummary};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Show `path` relative to `root` when it lives under it.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Format the summary of a run as display lines.
///
/// Output paths are shown relative to `root` (the rendition root).
pub fn format_run_summary(summary: &RunSummary, root: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "{}, {}",
        plural(summary.manifest_entries, "image"),
        plural(summary.reports.len(), "job")
    )];

    for report in &summary.reports {
        if let JobOutcome::Failed(reason) = &report.outcome {
            lines.push(format!("{}failed: {}", indent(1), display_path(&report.output, root)));
            lines.push(format!("{}{}", indent(2), reason));
        }
    }

    lines.push(summary.stats.to_string());

    if let Some(path) = &summary.manifest_written {
        lines.push(format!("Images file: {}", path.display()));
    }
    lines
}

/// Print the run summary to stdout.
pub fn print_run_summary(summary: &RunSummary, root: &Path) {
    for line in format_run_summary(summary, root) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{BuildStats, JobReport};
    use std::path::PathBuf;

    fn summary(reports: Vec<JobReport>, manifest_written: Option<PathBuf>) -> RunSummary {
        RunSummary {
            discovered: 1,
            manifest_entries: 1,
            stats: BuildStats::from_reports(&reports),
            reports,
            manifest_written,
        }
    }

    fn report(output: &str, outcome: JobOutcome) -> JobReport {
        JobReport {
            output: output.into(),
            outcome,
        }
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "job"), "1 job");
        assert_eq!(plural(0, "job"), "0 jobs");
        assert_eq!(plural(2, "image"), "2 images");
    }

    #[test]
    fn display_path_strips_root() {
        assert_eq!(
            display_path(Path::new("/out/a/10x10.jpg"), Path::new("/out")),
            "a/10x10.jpg"
        );
        assert_eq!(
            display_path(Path::new("/elsewhere/a.jpg"), Path::new("/out")),
            "/elsewhere/a.jpg"
        );
    }

    #[test]
    fn all_written() {
        let lines = format_run_summary(
            &summary(
                vec![
                    report("/out/a/10x10.jpg", JobOutcome::Written),
                    report("/out/a/10x10.webp", JobOutcome::Written),
                ],
                None,
            ),
            Path::new("/out"),
        );
        assert_eq!(lines, vec!["1 image, 2 jobs", "2 written"]);
    }

    #[test]
    fn failures_listed_with_reason() {
        let lines = format_run_summary(
            &summary(
                vec![
                    report("/out/a/10x10.jpg", JobOutcome::UpToDate),
                    report(
                        "/out/a/10x10.gif",
                        JobOutcome::Failed("unknown file format: gif".into()),
                    ),
                ],
                Some("images.json".into()),
            ),
            Path::new("/out"),
        );
        assert_eq!(
            lines,
            vec![
                "1 image, 2 jobs",
                "    failed: a/10x10.gif",
                "        unknown file format: gif",
                "0 written, 1 up to date, 1 failed (2 total)",
                "Images file: images.json",
            ]
        );
    }
}
