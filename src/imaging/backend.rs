//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the boundary to the pixel work: encode one
//! output file from a source with resize and encoder parameters. Everything
//! above it (planning, freshness, directory creation) is backend-agnostic.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` below.

use super::params::EncodeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Unsupported file format: '{0}'")]
    UnsupportedFormat(String),
    #[error("Invalid option {0}")]
    InvalidOption(String),
}

/// Trait for image codec backends.
///
/// `Sync` so jobs can be spread over a rayon pool.
pub trait ImageBackend: Sync {
    /// Decode `params.source`, resize, and write `params.output`.
    fn encode(&self, params: &EncodeParams) -> Result<(), BackendError>;
}
