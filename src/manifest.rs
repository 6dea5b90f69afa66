//! The images manifest: a persisted JSON map of known images.
//!
//! ```json
//! {
//!     "Summer-2019/Beach-Day.jpg": {
//!         "source": "Summer 2019/Beach Day.jpg",
//!         "description": "Beach Day",
//!         "resizeOptions": { "fit": "contain" },
//!         "outputOptions": { "quality": 70 }
//!     }
//! }
//! ```
//!
//! Keys are output identifiers (the source path, or its slug with
//! `--slugify-output`). The manifest only ever grows: new files found on disk
//! get default entries, existing entries are never rewritten, and entries for
//! files that disappeared stay until someone removes them by hand.
//!
//! Rows that do not read as an [`ImageEntry`] (a `null` description, a
//! missing `source`, options that are not objects) are kept as raw JSON.
//! No work is planned for them, and they are written back exactly as found.
//!
//! ## Lifecycle
//!
//! 1. [`Manifest::load`] once at start. A missing, empty, or unparsable file
//!    yields an empty manifest and a warning, never an error.
//! 2. [`Manifest::merge`] newly discovered files.
//! 3. [`Manifest::save`] once at the end, after every build job ran. Keys are
//!    written in sorted order and the file is replaced atomically.

use crate::naming::{file_stem, slugify_path};
use crate::types::OptionMap;
use log::{debug, info, warn};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One image known to the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    /// Path of the original, relative to the input directory.
    pub source: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize_options: Option<OptionMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_options: Option<OptionMap>,
    /// Fields this tool does not know about, carried through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ImageEntry {
    /// Default entry for a newly discovered file.
    pub fn for_source(source: &str) -> Self {
        Self {
            source: source.to_string(),
            description: file_stem(source),
            resize_options: None,
            output_options: None,
            extra: BTreeMap::new(),
        }
    }
}

/// Output key → image entry, always iterated in key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    entries: BTreeMap<String, ImageEntry>,
    /// Rows that are not valid entries, keyed like `entries` but disjoint.
    unparsed: BTreeMap<String, Value>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manifest from raw rows, setting aside rows that are not entries.
    pub fn from_rows(rows: BTreeMap<String, Value>) -> Self {
        let mut manifest = Self::new();
        for (key, row) in rows {
            match ImageEntry::deserialize(&row) {
                Ok(entry) => {
                    manifest.entries.insert(key, entry);
                }
                Err(e) => {
                    warn!("images file entry {} is not usable, keeping it as is: {}", key, e);
                    manifest.unparsed.insert(key, row);
                }
            }
        }
        manifest
    }

    /// Load a manifest, recovering to an empty one when the file is missing,
    /// empty, or not a JSON object.
    pub fn load(path: &Path) -> Self {
        info!("loading images file {}", path.display());
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("cannot read {}: {}", path.display(), e);
                return Self::new();
            }
        };
        if content.trim().is_empty() {
            warn!("file is empty: {}", path.display());
            return Self::new();
        }
        match serde_json::from_str(&content) {
            Ok(rows) => Self::from_rows(rows),
            Err(e) => {
                warn!("error loading file {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    /// Add default entries for discovered files that have no row yet.
    ///
    /// The key for a file is its path, slugified when `slugify` is set. Keys
    /// that already exist, usable or not, are left exactly as they are, so
    /// merging the same file list again changes nothing.
    pub fn merge<S: AsRef<str>>(&mut self, discovered: &[S], slugify: bool) {
        for file_name in discovered {
            let file_name = file_name.as_ref();
            let key = if slugify {
                slugify_path(file_name)
            } else {
                file_name.to_string()
            };
            if self.contains_key(&key) {
                continue;
            }
            debug!("new image {} -> {}", file_name, key);
            self.entries.insert(key, ImageEntry::for_source(file_name));
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key) || self.unparsed.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ImageEntry> {
        self.entries.get(key)
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, key: impl Into<String>, entry: ImageEntry) {
        let key = key.into();
        self.unparsed.remove(&key);
        self.entries.insert(key, entry);
    }

    /// Usable entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ImageEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every key, usable or not, in key order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        let mut keys: Vec<&str> = self
            .entries
            .keys()
            .chain(self.unparsed.keys())
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys.into_iter()
    }

    /// Number of rows, usable or not.
    pub fn len(&self) -> usize {
        self.entries.len() + self.unparsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize as pretty JSON (4-space indent, sorted keys, trailing newline).
    pub fn to_json(&self) -> Result<String, ManifestError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        buf.push(b'\n');
        // serde_json only ever emits UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write the manifest to `path`, replacing any previous file atomically.
    ///
    /// The JSON goes to a uniquely named temporary file in the same directory,
    /// which is synced and then renamed over the target, so readers never
    /// observe a half-written manifest.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let json = self.to_json()?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir)?;
        let mut file = temp.as_file();
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        info!("data written to {}", path.display());
        Ok(())
    }
}

impl Serialize for Manifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for key in self.keys() {
            if let Some(entry) = self.entries.get(key) {
                map.serialize_entry(key, entry)?;
            } else if let Some(row) = self.unparsed.get(key) {
                map.serialize_entry(key, row)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Manifest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<String, Value>::deserialize(deserializer).map(Self::from_rows)
    }
}
