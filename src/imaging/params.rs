//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. Build jobs carry
//! open-ended option maps (see [`OptionMap`]); this module turns them into
//! typed parameters before anything reaches a [`backend`](super::backend).
//!
//! ## Resize option keys
//!
//! | Key | Type | Default |
//! |---|---|---|
//! | `width`, `height` | positive integer or `null` | keep aspect ratio |
//! | `fit` | `cover` `contain` `fill` `inside` `outside` | `cover` |
//! | `kernel` | `nearest` `linear` `cubic` `mitchell` `lanczos2` `lanczos3` | `lanczos3` |
//! | `withoutEnlargement` | bool | `false` |
//! | `withoutReduction` | bool | `false` |
//! | `background` | `#rgb`, `#rrggbb` or `#rrggbbaa` | `#000000` |
//!
//! ## Output option keys
//!
//! | Key | Applies to | Default |
//! |---|---|---|
//! | `quality` | jpg | 80 |
//! | `compressionLevel` | png (0–9) | 6 |
//!
//! Any other key (e.g. `progressive`) is accepted and ignored with a debug log
//! line, so option maps written for other encoders keep working.

use super::backend::BackendError;
use crate::types::OptionMap;
use log::debug;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Encodable output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    WebP,
    Png,
    Tiff,
}

impl OutputFormat {
    /// Look up a format by id or file extension, ignoring case.
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "png" => Some(Self::Png),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "jpeg",
            Self::WebP => "webp",
            Self::Png => "png",
            Self::Tiff => "tiff",
        };
        f.write_str(name)
    }
}

/// How the image is fitted when both width and height are given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fit {
    /// Fill the box, cropping the overflow (centre gravity).
    #[default]
    Cover,
    /// Fit inside the box, letterboxing with the background colour.
    Contain,
    /// Stretch to the exact box, ignoring aspect ratio.
    Fill,
    /// Fit inside the box; the result may be smaller than the box.
    Inside,
    /// Cover the box without cropping; the result may be larger than the box.
    Outside,
}

/// Resampling kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Kernel {
    Nearest,
    Linear,
    Cubic,
    Mitchell,
    Lanczos2,
    #[default]
    Lanczos3,
}

/// Parameters for the resize step.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: Fit,
    pub kernel: Kernel,
    pub without_enlargement: bool,
    pub without_reduction: bool,
    /// RGBA, used for `contain` letterboxing and for flattening alpha.
    pub background: [u8; 4],
}

impl Default for ResizeParams {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            fit: Fit::default(),
            kernel: Kernel::default(),
            without_enlargement: false,
            without_reduction: false,
            background: [0, 0, 0, 255],
        }
    }
}

impl ResizeParams {
    pub fn from_options(options: &OptionMap) -> Result<Self, BackendError> {
        let mut params = Self::default();
        for (key, value) in options {
            match key.as_str() {
                "width" => params.width = dimension(key, value)?,
                "height" => params.height = dimension(key, value)?,
                "fit" => {
                    params.fit = match string(key, value)? {
                        "cover" => Fit::Cover,
                        "contain" => Fit::Contain,
                        "fill" => Fit::Fill,
                        "inside" => Fit::Inside,
                        "outside" => Fit::Outside,
                        other => return Err(invalid(key, format!("unknown fit '{other}'"))),
                    }
                }
                "kernel" => {
                    params.kernel = match string(key, value)? {
                        "nearest" => Kernel::Nearest,
                        "linear" => Kernel::Linear,
                        "cubic" => Kernel::Cubic,
                        "mitchell" => Kernel::Mitchell,
                        "lanczos2" => Kernel::Lanczos2,
                        "lanczos3" => Kernel::Lanczos3,
                        other => return Err(invalid(key, format!("unknown kernel '{other}'"))),
                    }
                }
                "withoutEnlargement" => params.without_enlargement = boolean(key, value)?,
                "withoutReduction" => params.without_reduction = boolean(key, value)?,
                "background" => {
                    params.background = parse_color(string(key, value)?)
                        .ok_or_else(|| invalid(key, format!("invalid colour {value}")))?
                }
                _ => debug!("resize option {} has no effect", key),
            }
        }
        Ok(params)
    }
}

/// Parameters for the encode step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputParams {
    pub quality: Quality,
    /// PNG zlib level 0-9.
    pub compression_level: Option<u8>,
}

impl OutputParams {
    pub fn from_options(options: &OptionMap) -> Result<Self, BackendError> {
        let mut params = Self::default();
        for (key, value) in options {
            match key.as_str() {
                "quality" => {
                    let q = integer(key, value)?;
                    if !(1..=100).contains(&q) {
                        return Err(invalid(key, format!("expected 1-100, got {q}")));
                    }
                    params.quality = Quality::new(q as u32);
                }
                "compressionLevel" => {
                    let level = integer(key, value)?;
                    if level > 9 {
                        return Err(invalid(key, format!("expected 0-9, got {level}")));
                    }
                    params.compression_level = Some(level as u8);
                }
                _ => debug!("output option {} has no effect", key),
            }
        }
        Ok(params)
    }
}

/// Everything a backend needs to produce one output file.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub resize: ResizeParams,
    pub output_params: OutputParams,
}

fn invalid(key: &str, message: String) -> BackendError {
    BackendError::InvalidOption(format!("{key}: {message}"))
}

fn dimension(key: &str, value: &Value) -> Result<Option<u32>, BackendError> {
    if value.is_null() {
        return Ok(None);
    }
    match value.as_u64() {
        Some(n) if n > 0 && n <= u32::MAX as u64 => Ok(Some(n as u32)),
        _ => Err(invalid(key, format!("expected positive integer, got {value}"))),
    }
}

fn integer(key: &str, value: &Value) -> Result<u64, BackendError> {
    value
        .as_u64()
        .ok_or_else(|| invalid(key, format!("expected non-negative integer, got {value}")))
}

fn boolean(key: &str, value: &Value) -> Result<bool, BackendError> {
    value
        .as_bool()
        .ok_or_else(|| invalid(key, format!("expected boolean, got {value}")))
}

fn string<'a>(key: &str, value: &'a Value) -> Result<&'a str, BackendError> {
    value
        .as_str()
        .ok_or_else(|| invalid(key, format!("expected string, got {value}")))
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` into RGBA.
pub fn parse_color(s: &str) -> Option<[u8; 4]> {
    let hex = s.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize, len: usize| u8::from_str_radix(&hex[i..i + len], 16).ok();
    match hex.len() {
        3 => Some([
            channel(0, 1)? * 17,
            channel(1, 1)? * 17,
            channel(2, 1)? * 17,
            255,
        ]),
        6 => Some([channel(0, 2)?, channel(2, 2)?, channel(4, 2)?, 255]),
        8 => Some([channel(0, 2)?, channel(2, 2)?, channel(4, 2)?, channel(6, 2)?]),
        _ => None,
    }
}
