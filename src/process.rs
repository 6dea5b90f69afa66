//! Build execution and the end-to-end run.
//!
//! [`run`] drives one invocation:
//!
//! ```text
//! renditions ─┐
//! manifest ───┼─→ merge discovered ─→ plan_jobs ─→ execute ─→ save manifest
//! discover ───┘
//! ```
//!
//! Only [`execute`] touches images. Each job goes through the same checks
//! before it reaches the codec:
//!
//! 1. the source must exist
//! 2. the output format must be one the codec writes
//! 3. an output that is at least as new as its source is skipped
//! 4. missing output directories are created
//!
//! A job that fails any step is logged and reported as [`JobOutcome::Failed`];
//! the run carries on with the next one. Structural problems (unreadable input
//! tree, manifest that cannot be saved) are the only errors [`run`] returns.
//!
//! Jobs run sequentially with one worker, or on a dedicated rayon pool
//! otherwise. Reports always come back in job order.

use crate::config::RunOptions;
use crate::imaging::{ImageBackend, OutputFormat, encode_job};
use crate::manifest::{Manifest, ManifestError};
use crate::plan::plan_jobs;
use crate::renditions::build_renditions;
use crate::scan::{self, ScanError};
use crate::types::BuildJob;
use log::{debug, error, info, warn};
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Failed to write images file: {0}")]
    Manifest(#[from] ManifestError),
}

/// What happened to a single job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The codec wrote the output.
    Written,
    /// The output was at least as new as the source.
    UpToDate,
    /// The job was skipped or the codec failed.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub output: PathBuf,
    pub outcome: JobOutcome,
}

/// Outcome counts for a batch of jobs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    pub written: u32,
    pub up_to_date: u32,
    pub failed: u32,
}

impl BuildStats {
    pub fn from_reports(reports: &[JobReport]) -> Self {
        let mut stats = Self::default();
        for report in reports {
            match report.outcome {
                JobOutcome::Written => stats.written += 1,
                JobOutcome::UpToDate => stats.up_to_date += 1,
                JobOutcome::Failed(_) => stats.failed += 1,
            }
        }
        stats
    }

    pub fn total(&self) -> u32 {
        self.written + self.up_to_date + self.failed
    }
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.up_to_date > 0 || self.failed > 0 {
            write!(f, "{} written, {} up to date", self.written, self.up_to_date)?;
            if self.failed > 0 {
                write!(f, ", {} failed", self.failed)?;
            }
            write!(f, " ({} total)", self.total())
        } else {
            write!(f, "{} written", self.written)
        }
    }
}

/// Result of a complete run.
#[derive(Debug)]
pub struct RunSummary {
    pub discovered: usize,
    pub manifest_entries: usize,
    pub reports: Vec<JobReport>,
    pub stats: BuildStats,
    /// Set when the images file was rewritten.
    pub manifest_written: Option<PathBuf>,
}

/// True when a source modified at `input` is newer than an output modified
/// at `output`. Equal timestamps count as up to date.
pub fn needs_rebuild(input: SystemTime, output: SystemTime) -> bool {
    input > output
}

fn modified(path: &Path) -> std::io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// Whether an existing output can be kept as is.
fn is_up_to_date(source: &Path, output: &Path) -> bool {
    if !output.exists() {
        return false;
    }
    match (modified(source), modified(output)) {
        (Ok(input), Ok(existing)) => {
            if needs_rebuild(input, existing) {
                info!("re-do {}", output.display());
                false
            } else {
                true
            }
        }
        _ => {
            debug!("cannot compare timestamps, rebuilding {}", output.display());
            false
        }
    }
}

fn failed(job: &BuildJob, reason: String) -> JobOutcome {
    error!("{}: {}", job.output.display(), reason);
    JobOutcome::Failed(reason)
}

/// Run one job through the freshness policy and the codec.
pub fn run_job(backend: &impl ImageBackend, job: &BuildJob) -> JobOutcome {
    if !job.source.is_file() {
        return failed(job, format!("input file not found: {}", job.source.display()));
    }
    if OutputFormat::from_id(&job.file_format).is_none() {
        return failed(job, format!("unknown file format: {}", job.file_format));
    }
    if job.output.is_dir() {
        return failed(job, format!("output is a folder: {}", job.output.display()));
    }
    if is_up_to_date(&job.source, &job.output) {
        info!("skipping {}", job.output.display());
        return JobOutcome::UpToDate;
    }
    if let Some(parent) = job.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            info!("create folder {}", parent.display());
            if let Err(e) = fs::create_dir_all(parent) {
                return failed(job, format!("cannot create folder: {e}"));
            }
        }
    }
    match encode_job(backend, job) {
        Ok(()) => {
            info!("written {}", job.output.display());
            JobOutcome::Written
        }
        Err(e) => failed(job, e.to_string()),
    }
}

/// Execute every job, returning one report per job in job order.
pub fn execute(backend: &impl ImageBackend, jobs: &[BuildJob], workers: usize) -> Vec<JobReport> {
    let report = |job: &BuildJob| JobReport {
        output: job.output.clone(),
        outcome: run_job(backend, job),
    };

    if workers <= 1 || jobs.len() <= 1 {
        return jobs.iter().map(report).collect();
    }

    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(|| jobs.par_iter().map(report).collect()),
        Err(e) => {
            warn!("cannot start {} workers, running sequentially: {}", workers, e);
            jobs.iter().map(report).collect()
        }
    }
}

/// Run a complete batch with the given backend.
pub fn run(options: &RunOptions, backend: &impl ImageBackend) -> Result<RunSummary, ProcessError> {
    let renditions = build_renditions(&options.rendition_sizes, &options.rendition_formats);
    debug!("renditions: {:?}", renditions);

    let mut manifest = options
        .manifest_path
        .as_deref()
        .map(Manifest::load)
        .unwrap_or_default();

    let discovered = scan::discover(&options.input, &options.files)?;
    debug!("discovered {} files: {:?}", discovered.len(), discovered);

    manifest.merge(&discovered, options.slugify);
    debug!("images: {:?}", manifest);

    let jobs = plan_jobs(&manifest, &discovered, &renditions, options);
    let reports = execute(backend, &jobs, options.workers);
    let stats = BuildStats::from_reports(&reports);

    let manifest_written = match (&options.manifest_path, options.update_manifest) {
        (Some(path), true) => {
            manifest.save(path)?;
            Some(path.clone())
        }
        (None, true) => {
            debug!("no images file given, nothing to update");
            None
        }
        _ => None,
    };

    Ok(RunSummary {
        discovered: discovered.len(),
        manifest_entries: manifest.len(),
        reports,
        stats,
        manifest_written,
    })
}
