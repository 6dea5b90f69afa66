//! Pure Rust codec backend built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` (format guessed from content) |
//! | Resize | `DynamicImage::resize_exact` with the requested kernel |
//! | Crop / letterbox | `DynamicImage::crop_imm`, `image::imageops::overlay` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality) |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless only) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (compression level) |
//! | Encode → TIFF | `image::codecs::tiff::TiffEncoder` |
//!
//! JPEG has no alpha channel, so transparent sources are flattened onto the
//! resize `background` colour first.

use super::backend::{BackendError, ImageBackend};
use super::calculations::plan_resize;
use super::params::{EncodeParams, Kernel, OutputFormat, OutputParams};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::BufWriter;
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn filter(kernel: Kernel) -> FilterType {
    match kernel {
        Kernel::Nearest => FilterType::Nearest,
        Kernel::Linear => FilterType::Triangle,
        Kernel::Cubic | Kernel::Mitchell => FilterType::CatmullRom,
        Kernel::Lanczos2 | Kernel::Lanczos3 => FilterType::Lanczos3,
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Apply the resize plan: scale, then crop or letterbox.
fn transform(img: DynamicImage, params: &EncodeParams) -> DynamicImage {
    let plan = plan_resize((img.width(), img.height()), &params.resize);

    let mut img = if plan.resize == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(plan.resize.0, plan.resize.1, filter(params.resize.kernel))
    };

    if let Some(crop) = plan.crop {
        img = img.crop_imm(crop.x, crop.y, crop.width, crop.height);
    }

    if let Some(pad) = plan.pad {
        let background = Rgba(params.resize.background);
        let mut canvas = RgbaImage::from_pixel(pad.canvas.0, pad.canvas.1, background);
        image::imageops::overlay(
            &mut canvas,
            &img.to_rgba8(),
            pad.offset.0 as i64,
            pad.offset.1 as i64,
        );
        img = DynamicImage::ImageRgba8(canvas);
    }

    img
}

/// Composite an image with alpha over a solid background.
fn flatten(img: &DynamicImage, background: [u8; 4]) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let alpha = a as f32 / 255.0;
        let mix = |fg: u8, bg: u8| (fg as f32 * alpha + bg as f32 * (1.0 - alpha)).round() as u8;
        Rgb([
            mix(r, background[0]),
            mix(g, background[1]),
            mix(b, background[2]),
        ])
    })
}

fn png_compression(level: Option<u8>) -> CompressionType {
    match level {
        Some(0..=3) => CompressionType::Fast,
        Some(7..=9) => CompressionType::Best,
        _ => CompressionType::Default,
    }
}

/// Encode `img` into `path` in the requested format.
fn save_image(
    img: &DynamicImage,
    path: &Path,
    format: OutputFormat,
    settings: &OutputParams,
    background: [u8; 4],
) -> Result<(), BackendError> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);
    let encode_err = |e: image::ImageError| {
        BackendError::ProcessingFailed(format!("{format} encode failed: {e}"))
    };

    match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(writer, settings.quality.value() as u8);
            DynamicImage::ImageRgb8(flatten(img, background))
                .write_with_encoder(encoder)
                .map_err(encode_err)
        }
        OutputFormat::WebP => {
            let encoder = WebPEncoder::new_lossless(writer);
            rgb_or_rgba(img).write_with_encoder(encoder).map_err(encode_err)
        }
        OutputFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                writer,
                png_compression(settings.compression_level),
                PngFilter::Adaptive,
            );
            img.write_with_encoder(encoder).map_err(encode_err)
        }
        OutputFormat::Tiff => {
            let encoder = TiffEncoder::new(writer);
            rgb_or_rgba(img).write_with_encoder(encoder).map_err(encode_err)
        }
    }
}

/// 8-bit RGB or RGBA, the layouts every encoder here accepts.
fn rgb_or_rgba(img: &DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

impl ImageBackend for RustBackend {
    fn encode(&self, params: &EncodeParams) -> Result<(), BackendError> {
        let img = transform(load_image(&params.source)?, params);
        let result = save_image(
            &img,
            &params.output,
            params.format,
            &params.output_params,
            params.resize.background,
        );
        if result.is_err() {
            // A partial file would look up to date on the next run.
            let _ = std::fs::remove_file(&params.output);
        }
        result
    }
}
