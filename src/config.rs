//! Run configuration: settings layering and structural validation.
//!
//! A run is configured from three layers, later layers overriding earlier
//! ones:
//!
//! ```text
//! stock defaults  <  settings file (--config, TOML)  <  command-line flags
//! ```
//!
//! The stock defaults and the settings file are merged as TOML tables
//! ([`merge_toml`]), so a settings file only needs the keys it changes.
//! Command-line flags then replace whole values. The result is validated
//! against the filesystem into an immutable [`RunOptions`] before any image
//! is looked at.
//!
//! ## Settings file
//!
//! ```toml
//! # All keys are optional - defaults shown below
//! files = "**/*.jpg"
//! copy = false
//! slugify_output = false
//! rendition_sizes = []                     # e.g. ["320x240", "1280x960"]
//! rendition_file_name_template = "${name}/${width}x${height}.${ext}"
//! rendition_file_formats = ["jpg", "webp"]
//! update_images_file = false
//! # jobs = 4                               # parallel encoders (default 1)
//!
//! [resize_options]                         # e.g. fit = "inside"
//!
//! [output_options]
//! progressive = true
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::scan::{self, ScanError};
use crate::types::OptionMap;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("input path not found: {0}")]
    InputNotFound(PathBuf),
    #[error("input folder is not a directory: {0}")]
    InputNotDirectory(PathBuf),
    #[error("output path not found: {0}")]
    OutputNotFound(PathBuf),
    #[error("output folder is not a directory: {0}")]
    OutputNotDirectory(PathBuf),
    #[error("copy can be used only when an output folder is given")]
    CopyWithoutOutput,
    #[error("image list not found: {0}")]
    ManifestNotFound(PathBuf),
    #[error("image list is not a file: {0}")]
    ManifestNotFile(PathBuf),
    #[error(transparent)]
    Pattern(#[from] ScanError),
    #[error("Config validation error: {0}")]
    Validation(String),
}

pub const DEFAULT_FILES: &str = "**/*.jpg";
pub const DEFAULT_TEMPLATE: &str = "${name}/${width}x${height}.${ext}";

/// Tunable settings, loadable from a TOML file.
///
/// All fields have defaults matching the command-line defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Glob selecting source files inside the input folder.
    pub files: String,
    /// Re-encode the original into the output folder too.
    pub copy: bool,
    /// Use slugified paths as manifest keys and output names.
    pub slugify_output: bool,
    /// `WxH` strings.
    pub rendition_sizes: Vec<String>,
    pub rendition_file_name_template: String,
    pub rendition_file_formats: Vec<String>,
    pub resize_options: OptionMap,
    pub output_options: OptionMap,
    /// Write newly discovered images back to the images file.
    pub update_images_file: bool,
    /// Parallel encoders. Absent means one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            files: DEFAULT_FILES.to_string(),
            copy: false,
            slugify_output: false,
            rendition_sizes: Vec::new(),
            rendition_file_name_template: DEFAULT_TEMPLATE.to_string(),
            rendition_file_formats: vec!["jpg".to_string(), "webp".to_string()],
            resize_options: OptionMap::new(),
            output_options: OptionMap::from([("progressive".to_string(), Value::Bool(true))]),
            update_images_file: false,
            jobs: None,
        }
    }
}

impl Settings {
    /// Validate values that do not depend on the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs == Some(0) {
            return Err(ConfigError::Validation("jobs must be at least 1".into()));
        }
        scan::compile_pattern(&self.files)?;
        Ok(())
    }

    /// Apply command-line overrides on top of these settings.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(files) = overrides.files {
            self.files = files;
        }
        self.copy |= overrides.copy;
        self.slugify_output |= overrides.slugify_output;
        if let Some(sizes) = overrides.rendition_sizes {
            self.rendition_sizes = sizes;
        }
        if let Some(template) = overrides.rendition_file_name_template {
            self.rendition_file_name_template = template;
        }
        if let Some(formats) = overrides.rendition_file_formats {
            self.rendition_file_formats = formats;
        }
        if let Some(resize) = overrides.resize_options {
            self.resize_options = resize;
        }
        if let Some(output) = overrides.output_options {
            self.output_options = output;
        }
        self.update_images_file |= overrides.update_images_file;
        if overrides.jobs.is_some() {
            self.jobs = overrides.jobs;
        }
        self
    }
}

/// Values given explicitly on the command line.
///
/// `None` (or `false` for switches) means "not given", leaving the
/// lower layers in effect.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub files: Option<String>,
    pub copy: bool,
    pub slugify_output: bool,
    pub rendition_sizes: Option<Vec<String>>,
    pub rendition_file_name_template: Option<String>,
    pub rendition_file_formats: Option<Vec<String>>,
    pub resize_options: Option<OptionMap>,
    pub output_options: Option<OptionMap>,
    pub update_images_file: bool,
    pub jobs: Option<usize>,
}

// =============================================================================
// Settings loading and merging
// =============================================================================

/// Returns the stock default settings as a `toml::Value::Table`.
///
/// This is the base layer user settings are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Settings::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a settings file as a raw TOML value.
pub fn load_raw_settings(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_settings(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Settings, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let settings: Settings = merged.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings: stock defaults, overlaid with `path` when given.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = path.map(load_raw_settings).transpose()?;
    resolve_settings(base, overlay)
}

// =============================================================================
// Run options
// =============================================================================

/// Immutable configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub input: PathBuf,
    /// Rendition root; renditions go next to their sources when absent.
    pub output: Option<PathBuf>,
    pub files: String,
    pub copy: bool,
    pub slugify: bool,
    pub rendition_sizes: Vec<String>,
    pub rendition_formats: Vec<String>,
    pub file_name_template: String,
    pub resize_options: OptionMap,
    pub output_options: OptionMap,
    pub manifest_path: Option<PathBuf>,
    pub update_manifest: bool,
    pub workers: usize,
}

impl RunOptions {
    /// Options for `input` with stock settings and no validation.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self::from_settings(input.into(), None, None, Settings::default())
    }

    fn from_settings(
        input: PathBuf,
        output: Option<PathBuf>,
        manifest_path: Option<PathBuf>,
        settings: Settings,
    ) -> Self {
        Self {
            input,
            output,
            files: settings.files,
            copy: settings.copy,
            slugify: settings.slugify_output,
            rendition_sizes: settings.rendition_sizes,
            rendition_formats: settings.rendition_file_formats,
            file_name_template: settings.rendition_file_name_template,
            resize_options: settings.resize_options,
            output_options: settings.output_options,
            manifest_path,
            update_manifest: settings.update_images_file,
            workers: effective_workers(settings.jobs),
        }
    }

    /// Build validated run options.
    ///
    /// Every structural problem is reported here, before any discovery or
    /// planning happens.
    pub fn resolve(
        input: PathBuf,
        output: Option<PathBuf>,
        manifest_path: Option<PathBuf>,
        settings: Settings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let options = Self::from_settings(input, output, manifest_path, settings);
        options.validate()?;
        Ok(options)
    }

    /// Check the filesystem preconditions of a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.input.exists() {
            return Err(ConfigError::InputNotFound(self.input.clone()));
        }
        if !self.input.is_dir() {
            return Err(ConfigError::InputNotDirectory(self.input.clone()));
        }
        if let Some(output) = &self.output {
            if !output.exists() {
                return Err(ConfigError::OutputNotFound(output.clone()));
            }
            if !output.is_dir() {
                return Err(ConfigError::OutputNotDirectory(output.clone()));
            }
        }
        if self.copy && self.output.is_none() {
            return Err(ConfigError::CopyWithoutOutput);
        }
        if let Some(manifest) = &self.manifest_path {
            if !manifest.exists() {
                return Err(ConfigError::ManifestNotFound(manifest.clone()));
            }
            if !manifest.is_file() {
                return Err(ConfigError::ManifestNotFile(manifest.clone()));
            }
        }
        Ok(())
    }

    /// Directory renditions are written under.
    pub fn rendition_root(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.input)
    }
}

/// Resolve the worker count.
///
/// - `None` → 1 (sequential)
/// - `Some(n)` → `min(n, cores)` (user can constrain down, not up)
pub fn effective_workers(jobs: Option<usize>) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    jobs.map(|n| n.clamp(1, cores)).unwrap_or(1)
}

/// Map `-v` repetitions to a log level; anything past trace stays trace.
pub fn log_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Error,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    // =========================================================================
    // Settings defaults and loading
    // =========================================================================

    #[test]
    fn default_settings_match_cli_defaults() {
        let s = Settings::default();
        assert_eq!(s.files, "**/*.jpg");
        assert_eq!(s.rendition_file_name_template, "${name}/${width}x${height}.${ext}");
        assert_eq!(s.rendition_file_formats, vec!["jpg", "webp"]);
        assert!(s.resize_options.is_empty());
        assert_eq!(s.output_options["progressive"], json!(true));
        assert!(s.rendition_sizes.is_empty());
    }

    #[test]
    fn load_settings_without_file_is_default() {
        assert_eq!(load_settings(None).unwrap(), Settings::default());
    }

    #[test]
    fn load_settings_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sizes.toml");
        fs::write(
            &path,
            r#"
rendition_sizes = ["100x100", "200x150"]
rendition_file_formats = ["png"]
jobs = 2

[resize_options]
fit = "inside"

[output_options]
quality = 70
"#,
        )
        .unwrap();

        let s = load_settings(Some(&path)).unwrap();
        assert_eq!(s.rendition_sizes, vec!["100x100", "200x150"]);
        assert_eq!(s.rendition_file_formats, vec!["png"]);
        assert_eq!(s.jobs, Some(2));
        assert_eq!(s.resize_options["fit"], json!("inside"));
        // merged onto the stock output options
        assert_eq!(s.output_options["quality"], json!(70));
        assert_eq!(s.output_options["progressive"], json!(true));
        // untouched keys keep their defaults
        assert_eq!(s.files, "**/*.jpg");
    }

    #[test]
    fn load_settings_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_settings(Some(&tmp.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "rendition_sizes = [").unwrap();
        assert!(matches!(load_settings(Some(&path)), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<Settings, _> = toml::from_str(r#"rendition_size = ["1x1"]"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn zero_jobs_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("s.toml");
        fs::write(&path, "jobs = 0").unwrap();
        assert!(matches!(
            load_settings(Some(&path)),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn empty_template_is_not_a_settings_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("s.toml");
        fs::write(&path, "rendition_file_name_template = \"\"").unwrap();
        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.rendition_file_name_template, "");
    }

    #[test]
    fn invalid_pattern_rejected() {
        let settings = Settings {
            files: "***".into(),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::Pattern(_))));
    }

    // =========================================================================
    // Overrides
    // =========================================================================

    #[test]
    fn overrides_replace_whole_values() {
        let base = Settings {
            rendition_sizes: vec!["10x10".into()],
            ..Settings::default()
        };
        let merged = base.with_overrides(Overrides {
            rendition_sizes: Some(vec!["20x20".into()]),
            output_options: Some(OptionMap::new()),
            slugify_output: true,
            jobs: Some(3),
            ..Overrides::default()
        });
        assert_eq!(merged.rendition_sizes, vec!["20x20"]);
        assert!(merged.output_options.is_empty());
        assert!(merged.slugify_output);
        assert_eq!(merged.jobs, Some(3));
        assert_eq!(merged.rendition_file_formats, vec!["jpg", "webp"]);
    }

    #[test]
    fn unset_overrides_keep_lower_layers() {
        let base = Settings {
            copy: true,
            jobs: Some(2),
            ..Settings::default()
        };
        let merged = base.clone().with_overrides(Overrides::default());
        assert_eq!(merged, base);
    }

    // =========================================================================
    // merge_toml
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"files = "*.jpg""#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"files = "*.png""#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("files").unwrap().as_str(), Some("*.png"));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[output_options]
progressive = true
quality = 90
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[output_options]
quality = 70
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let output = merged.get("output_options").unwrap();
        assert_eq!(output.get("quality").unwrap().as_integer(), Some(70));
        assert_eq!(output.get("progressive").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn merge_toml_arrays_replaced() {
        let base: toml::Value = toml::from_str(r#"rendition_sizes = ["1x1", "2x2"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"rendition_sizes = ["3x3"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(
            merged.get("rendition_sizes").unwrap().as_array().unwrap().len(),
            1
        );
    }

    // =========================================================================
    // RunOptions validation
    // =========================================================================

    fn resolve_with(
        input: PathBuf,
        output: Option<PathBuf>,
        manifest: Option<PathBuf>,
        settings: Settings,
    ) -> Result<RunOptions, ConfigError> {
        RunOptions::resolve(input, output, manifest, settings)
    }

    #[test]
    fn resolve_valid_directories() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        fs::create_dir(&out).unwrap();
        let manifest = tmp.path().join("images.json");
        fs::write(&manifest, "{}").unwrap();

        let options = resolve_with(
            tmp.path().to_path_buf(),
            Some(out.clone()),
            Some(manifest),
            Settings {
                copy: true,
                ..Settings::default()
            },
        )
        .unwrap();
        assert_eq!(options.rendition_root(), out.as_path());
        assert_eq!(options.workers, 1);
    }

    #[test]
    fn missing_input_rejected() {
        let tmp = TempDir::new().unwrap();
        let result = resolve_with(tmp.path().join("nope"), None, None, Settings::default());
        assert!(matches!(result, Err(ConfigError::InputNotFound(_))));
    }

    #[test]
    fn input_file_rejected() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file.jpg");
        fs::write(&file, "").unwrap();
        let result = resolve_with(file, None, None, Settings::default());
        assert!(matches!(result, Err(ConfigError::InputNotDirectory(_))));
    }

    #[test]
    fn bad_output_rejected() {
        let tmp = TempDir::new().unwrap();
        let missing = resolve_with(
            tmp.path().to_path_buf(),
            Some(tmp.path().join("nope")),
            None,
            Settings::default(),
        );
        assert!(matches!(missing, Err(ConfigError::OutputNotFound(_))));

        let file = tmp.path().join("out.txt");
        fs::write(&file, "").unwrap();
        let not_dir = resolve_with(tmp.path().to_path_buf(), Some(file), None, Settings::default());
        assert!(matches!(not_dir, Err(ConfigError::OutputNotDirectory(_))));
    }

    #[test]
    fn copy_without_output_rejected() {
        let tmp = TempDir::new().unwrap();
        let result = resolve_with(
            tmp.path().to_path_buf(),
            None,
            None,
            Settings {
                copy: true,
                ..Settings::default()
            },
        );
        assert!(matches!(result, Err(ConfigError::CopyWithoutOutput)));
    }

    #[test]
    fn bad_manifest_path_rejected() {
        let tmp = TempDir::new().unwrap();
        let missing = resolve_with(
            tmp.path().to_path_buf(),
            None,
            Some(tmp.path().join("images.json")),
            Settings::default(),
        );
        assert!(matches!(missing, Err(ConfigError::ManifestNotFound(_))));

        let dir = tmp.path().join("dir.json");
        fs::create_dir(&dir).unwrap();
        let not_file = resolve_with(tmp.path().to_path_buf(), None, Some(dir), Settings::default());
        assert!(matches!(not_file, Err(ConfigError::ManifestNotFile(_))));
    }

    #[test]
    fn rendition_root_defaults_to_input() {
        let options = RunOptions::new("/photos");
        assert_eq!(options.rendition_root(), Path::new("/photos"));
    }

    // =========================================================================
    // Workers and logging
    // =========================================================================

    #[test]
    fn effective_workers_default_sequential() {
        assert_eq!(effective_workers(None), 1);
    }

    #[test]
    fn effective_workers_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_workers(Some(10_000)), cores);
        assert_eq!(effective_workers(Some(1)), 1);
    }

    #[test]
    fn log_level_clamps_verbosity() {
        assert_eq!(log_level(0), LevelFilter::Error);
        assert_eq!(log_level(1), LevelFilter::Info);
        assert_eq!(log_level(2), LevelFilter::Debug);
        assert_eq!(log_level(3), LevelFilter::Trace);
        assert_eq!(log_level(9), LevelFilter::Trace);
    }
}
