//! Work planning: manifest entries × renditions → build jobs.
//!
//! Planning is pure. It reads the manifest, the discovered file list and the
//! run options, and produces the complete list of [`BuildJob`]s without
//! touching the filesystem. Freshness checks and directory creation happen
//! later, in [`crate::process`].
//!
//! ## Output layout
//!
//! With an output directory, renditions are laid out by manifest key:
//!
//! ```text
//! key   Summer-2019/Beach-Day.jpg
//! out   <output>/Summer-2019/Beach-Day/320x240.jpg
//! copy  <output>/Summer-2019/Beach-Day.jpg          (with --copy)
//! ```
//!
//! Without one, renditions are written next to their source inside the
//! input directory, named after the source rather than the key.
//!
//! Two jobs never share an output path. When a template makes a rendition
//! collide with the copy or with another rendition, the first planned job
//! keeps the path and the later one is dropped with a warning.
//!
//! ## Option precedence
//!
//! ```text
//! resize:  {width, height}  <  run resize options  <  entry resizeOptions
//! output:                      run output options  <  entry outputOptions
//! ```

use crate::config::RunOptions;
use crate::manifest::Manifest;
use crate::naming::{file_stem, render_file_name};
use crate::types::{BuildJob, OptionMap, RenditionSpec, layer};
use log::warn;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Emit every build job for the current run, in manifest key order.
///
/// Entries whose source is not among `discovered` are skipped entirely, as
/// are rows of the images file that are not usable entries.
pub fn plan_jobs<S: AsRef<str>>(
    manifest: &Manifest,
    discovered: &[S],
    renditions: &[RenditionSpec],
    options: &RunOptions,
) -> Vec<BuildJob> {
    let present: HashSet<&str> = discovered.iter().map(|s| s.as_ref()).collect();
    let root = options.rendition_root();
    let empty = OptionMap::new();
    let mut jobs = Vec::new();
    let mut outputs = HashSet::new();
    let mut push = |job: BuildJob| {
        if outputs.insert(job.output.clone()) {
            jobs.push(job);
        } else {
            warn!("{} is planned twice, keeping the first job", job.output.display());
        }
    };

    for (key, entry) in manifest.iter() {
        if !present.contains(entry.source.as_str()) {
            continue;
        }
        let source = options.input.join(&entry.source);

        if let (true, Some(output_dir)) = (options.copy, &options.output) {
            let output = output_dir.join(key);
            push(BuildJob {
                file_format: extension_of(&output),
                source: source.clone(),
                output,
                resize_options: OptionMap::new(),
                output_options: options.output_options.clone(),
            });
        }

        let relative = if options.output.is_some() {
            key
        } else {
            entry.source.as_str()
        };
        let base = root.join(parent_of(relative));
        let name = file_stem(relative);
        let entry_resize = entry.resize_options.as_ref().unwrap_or(&empty);
        let entry_output = entry.output_options.as_ref().unwrap_or(&empty);

        for rendition in renditions {
            let file_name = render_file_name(
                &options.file_name_template,
                &name,
                rendition.width,
                rendition.height,
                &rendition.file_format,
            );
            push(BuildJob {
                source: source.clone(),
                output: base.join(file_name),
                file_format: rendition.file_format.clone(),
                resize_options: layer([
                    &rendition.size_options(),
                    &options.resize_options,
                    entry_resize,
                ]),
                output_options: layer([&options.output_options, entry_output]),
            });
        }
    }

    jobs
}

fn parent_of(relative: &str) -> PathBuf {
    Path::new(relative)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default()
}
