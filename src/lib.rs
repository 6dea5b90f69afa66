//! # image-sizes
//!
//! Batch generator for resized image renditions. Point it at a folder of
//! photos, give it a list of sizes and formats, and it writes every rendition
//! into an output tree named by a filename template. An optional images file
//! (a JSON manifest) records every image it has seen along with per-image
//! resize and encoder overrides.
//!
//! # Pipeline
//!
//! ```text
//! 1. Settings   defaults < --config TOML < CLI flags  →  RunOptions
//! 2. Discover   input/ + glob                         →  relative paths
//! 3. Reconcile  images file + discovered              →  Manifest
//! 4. Plan       Manifest × renditions                 →  BuildJobs   (pure)
//! 5. Execute    BuildJobs                             →  files on disk
//! 6. Persist    Manifest                              →  images file (opt-in)
//! ```
//!
//! Planning never touches the filesystem, so output naming and option
//! precedence are unit tested without encoding a single image. Execution is
//! the only stage with side effects.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Settings layering, run option validation, worker count, log level |
//! | [`scan`] | Recursive glob discovery below the input folder |
//! | [`renditions`] | `WxH` size strings × format ids → rendition specs |
//! | [`manifest`] | Images file load/merge/save |
//! | [`naming`] | Filename templates and path slugs |
//! | [`plan`] | Build job planning with option precedence |
//! | [`process`] | Freshness policy, job execution, the end-to-end run |
//! | [`imaging`] | Pure-Rust codec: resize geometry and encoders |
//! | [`types`] | Option maps, rendition specs, build jobs |
//! | [`output`] | End-of-run summary for the CLI |
//!
//! # Design Decisions
//!
//! ## The Manifest Only Grows
//!
//! Reconciliation adds entries for new files and never rewrites or removes
//! existing ones. Hand edits to an entry (a better description, a `fit`
//! override) survive every later run, and entries for deleted files stay
//! until someone prunes them. Work is only planned for entries whose source
//! was discovered in the current run.
//!
//! ## Timestamp Freshness
//!
//! An output is rebuilt only when its source is strictly newer. Re-running
//! over an unchanged tree re-encodes nothing. Changing options does not
//! invalidate existing outputs; delete them to force a rebuild.
//!
//! ## Local Failures Stay Local
//!
//! A malformed size string, an unknown format, a vanished source or a codec
//! error affects one rendition or one job. It is logged and the run goes on.
//! Only structural problems (missing input folder, bad glob, bad settings
//! file) stop the run, and they are reported before any work starts.

pub mod config;
pub mod imaging;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod plan;
pub mod process;
pub mod renditions;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
