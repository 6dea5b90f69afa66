//! Source discovery: which files in the input directory are images to process.
//!
//! The input directory is walked recursively and every regular file whose
//! path, relative to the input directory and written with `/` separators, is
//! matched against a glob pattern. The default pattern is `**/*.jpg`.
//!
//! ## Pattern rules
//!
//! - `*` and `?` never cross a `/`
//! - `**/` matches zero or more directories, so `**/*.jpg` also matches
//!   `photo.jpg` at the top level
//! - matching is case sensitive
//! - hidden files and directories (leading `.`) are never visited
//!
//! Returned paths are relative, `/`-separated and sorted, which makes them
//! stable manifest keys on every platform.

use glob::{MatchOptions, Pattern};
use log::{debug, warn};
use std::path::Path;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("Cannot read input directory: {0}")]
    Walk(#[from] walkdir::Error),
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Compile a discovery pattern.
pub fn compile_pattern(pattern: &str) -> Result<Pattern, ScanError> {
    Pattern::new(pattern).map_err(|source| ScanError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Find all files under `root` matching `pattern`.
pub fn discover(root: &Path, pattern: &str) -> Result<Vec<String>, ScanError> {
    let pattern = compile_pattern(pattern)?;
    let mut found = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.depth() > 0 => {
                warn!("skipping unreadable entry: {}", e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(relative) = relative_path(root, entry.path()) else {
            warn!("skipping non UTF-8 path: {}", entry.path().display());
            continue;
        };
        if pattern.matches_with(&relative, MATCH_OPTIONS) {
            found.push(relative);
        }
    }

    found.sort();
    debug!("discovered {} files matching {}", found.len(), pattern);
    Ok(found)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// `root/a/b.jpg` → `a/b.jpg`, always with `/` separators.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}
