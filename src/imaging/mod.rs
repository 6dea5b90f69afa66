//! Image codec service: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Resize** | `resize_exact` + crop/letterbox per `fit` |
//! | **Encode** | `image` JPEG, WebP, PNG, TIFF encoders |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for resize geometry (unit testable)
//! - **Parameters**: Typed resize/output parameters parsed from option maps
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Build job → parameters → backend

pub mod backend;
mod calculations;
pub mod operations;
pub mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{CropBox, Padding, ResizePlan, plan_resize};
pub use operations::{encode_job, encode_params};
pub use params::{EncodeParams, Fit, Kernel, OutputFormat, OutputParams, Quality, ResizeParams};
pub use rust_backend::RustBackend;
