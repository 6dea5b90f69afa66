//! Shared types passed between the planning and execution stages.
//!
//! Resize and output options stay open-ended JSON maps so that a manifest can
//! carry whatever keys a user wrote into it. They are only interpreted into
//! typed parameters at the codec boundary (see [`crate::imaging::params`]).

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// String-keyed option map, e.g. `{"fit": "cover", "quality": 70}`.
pub type OptionMap = BTreeMap<String, Value>;

/// Merge option maps in precedence order.
///
/// Layers are applied left to right; a key present in a later layer replaces
/// the value from every earlier layer. The merge is shallow: nested objects
/// are replaced wholesale, not merged.
///
/// Precedence used by the planner:
///
/// ```text
/// rendition defaults  <  run-level options  <  per-image overrides
/// ```
pub fn layer<'a>(layers: impl IntoIterator<Item = &'a OptionMap>) -> OptionMap {
    let mut merged = OptionMap::new();
    for map in layers {
        for (key, value) in map {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// One requested output size and format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionSpec {
    pub width: u32,
    pub height: u32,
    /// Format identifier as given by the user (`jpg`, `webp`, ...).
    pub file_format: String,
}

impl RenditionSpec {
    /// The `{width, height}` layer every rendition starts from.
    pub fn size_options(&self) -> OptionMap {
        OptionMap::from([
            ("width".to_string(), Value::from(self.width)),
            ("height".to_string(), Value::from(self.height)),
        ])
    }
}

/// A single concrete unit of work for the codec.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildJob {
    pub source: PathBuf,
    pub output: PathBuf,
    pub file_format: String,
    pub resize_options: OptionMap,
    pub output_options: OptionMap,
}
