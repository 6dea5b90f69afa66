//! Pure calculation functions for resize geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! A resize is described as a [`ResizePlan`]: scale the source to
//! `resize`, then optionally crop (`cover`) or pad onto a canvas
//! (`contain`). The backend executes the plan step by step.

use super::params::{Fit, ResizeParams};

/// Region kept after resizing (`cover`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Canvas the resized image is centred on (`contain`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padding {
    pub canvas: (u32, u32),
    pub offset: (u32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub resize: (u32, u32),
    pub crop: Option<CropBox>,
    pub pad: Option<Padding>,
}

impl ResizePlan {
    /// Final output dimensions after crop/pad.
    pub fn output_dimensions(&self) -> (u32, u32) {
        if let Some(crop) = self.crop {
            (crop.width, crop.height)
        } else if let Some(pad) = self.pad {
            pad.canvas
        } else {
            self.resize
        }
    }
}

/// Work out how to turn a `source`-sized image into the requested size.
///
/// When only one of width/height is given the other follows the source
/// aspect ratio and `fit` is irrelevant. Enlargement/reduction limits clamp
/// the scale factor to 1.
///
/// # Examples
/// ```
/// # use image_sizes::imaging::{ResizeParams, plan_resize};
/// // 400x200 covering a 100x100 box: scale to 200x100, then crop the centre
/// let params = ResizeParams { width: Some(100), height: Some(100), ..Default::default() };
/// let plan = plan_resize((400, 200), &params);
/// assert_eq!(plan.resize, (200, 100));
/// assert_eq!(plan.output_dimensions(), (100, 100));
/// ```
pub fn plan_resize(source: (u32, u32), params: &ResizeParams) -> ResizePlan {
    let (src_w, src_h) = source;
    let clamp = |s: f64| clamp_scale(s, params);
    let plain = |resize| ResizePlan {
        resize,
        crop: None,
        pad: None,
    };

    match (params.width, params.height) {
        (None, None) => plain(source),
        (Some(w), None) => {
            let s = clamp(w as f64 / src_w as f64);
            plain((scaled(src_w, s), scaled(src_h, s)))
        }
        (None, Some(h)) => {
            let s = clamp(h as f64 / src_h as f64);
            plain((scaled(src_w, s), scaled(src_h, s)))
        }
        (Some(target_w), Some(target_h)) => {
            let sx = target_w as f64 / src_w as f64;
            let sy = target_h as f64 / src_h as f64;
            match params.fit {
                Fit::Fill => plain((scaled(src_w, clamp(sx)), scaled(src_h, clamp(sy)))),
                Fit::Inside => {
                    let s = clamp(sx.min(sy));
                    plain((scaled(src_w, s), scaled(src_h, s)))
                }
                Fit::Outside => {
                    let s = clamp(sx.max(sy));
                    plain((scaled(src_w, s), scaled(src_h, s)))
                }
                Fit::Cover => {
                    let s = clamp(sx.max(sy));
                    let resize = (scaled(src_w, s), scaled(src_h, s));
                    let crop_w = target_w.min(resize.0);
                    let crop_h = target_h.min(resize.1);
                    let crop = (resize != (crop_w, crop_h)).then(|| CropBox {
                        x: (resize.0 - crop_w) / 2,
                        y: (resize.1 - crop_h) / 2,
                        width: crop_w,
                        height: crop_h,
                    });
                    ResizePlan {
                        resize,
                        crop,
                        pad: None,
                    }
                }
                Fit::Contain => {
                    let s = clamp(sx.min(sy));
                    let resize = (scaled(src_w, s), scaled(src_h, s));
                    // withoutReduction can leave the image larger than the box
                    let canvas = (target_w.max(resize.0), target_h.max(resize.1));
                    let pad = (resize != canvas).then(|| Padding {
                        canvas,
                        offset: ((canvas.0 - resize.0) / 2, (canvas.1 - resize.1) / 2),
                    });
                    ResizePlan {
                        resize,
                        crop: None,
                        pad,
                    }
                }
            }
        }
    }
}

fn clamp_scale(scale: f64, params: &ResizeParams) -> f64 {
    if params.without_enlargement && scale > 1.0 {
        1.0
    } else if params.without_reduction && scale < 1.0 {
        1.0
    } else {
        scale
    }
}

fn scaled(len: u32, scale: f64) -> u32 {
    ((len as f64 * scale).round() as u32).max(1)
}
