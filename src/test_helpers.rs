//! Shared test utilities.
//!
//! Helpers for building throwaway input trees: empty placeholder files,
//! tiny synthetic JPEGs, and pinned modification times for freshness tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = photo_fixture();
//! set_mtime(&tmp.path().join("photo.jpg"), SystemTime::UNIX_EPOCH);
//! ```

use image::RgbImage;
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tempfile::TempDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// Create an empty file, creating parent directories as needed.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"").unwrap();
}

/// A small input tree of empty files covering the discovery edge cases.
///
/// ```text
/// photo.jpg
/// upper.JPG
/// image.png
/// .hidden.jpg
/// .cache/three.jpg
/// album/one.jpg
/// album/notes.txt
/// album/deep/two.jpg
/// ```
pub fn photo_fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    for relative in [
        "photo.jpg",
        "album/one.jpg",
        "album/deep/two.jpg",
        "album/notes.txt",
        "upper.JPG",
        "image.png",
        ".hidden.jpg",
        ".cache/three.jpg",
    ] {
        touch(&tmp.path().join(relative));
    }
    tmp
}

/// Write a small valid JPEG with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
}

// =========================================================================
// Timestamps
// =========================================================================

/// Pin a file's modification time.
pub fn set_mtime(path: &Path, time: SystemTime) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}
