//! High-level image operations.
//!
//! Turns a [`BuildJob`] (paths plus open-ended option maps) into typed
//! [`EncodeParams`] and hands it to a backend.

use super::backend::{BackendError, ImageBackend};
use super::params::{EncodeParams, OutputFormat, OutputParams, ResizeParams};
use crate::types::BuildJob;
use log::trace;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Interpret a build job's format and options.
///
/// Fails on an unknown format id or a malformed known option.
pub fn encode_params(job: &BuildJob) -> Result<EncodeParams> {
    let format = OutputFormat::from_id(&job.file_format)
        .ok_or_else(|| BackendError::UnsupportedFormat(job.file_format.clone()))?;
    Ok(EncodeParams {
        source: job.source.clone(),
        output: job.output.clone(),
        format,
        resize: ResizeParams::from_options(&job.resize_options)?,
        output_params: OutputParams::from_options(&job.output_options)?,
    })
}

/// Encode a single job with the given backend.
pub fn encode_job(backend: &impl ImageBackend, job: &BuildJob) -> Result<()> {
    let params = encode_params(job)?;
    trace!("encode {:?}", params);
    backend.encode(&params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::params::Fit;
    use crate::types::OptionMap;
    use serde_json::json;

    fn job(format: &str, resize: serde_json::Value, output: serde_json::Value) -> BuildJob {
        BuildJob {
            source: "/in/photo.jpg".into(),
            output: "/out/photo/100x100.jpg".into(),
            file_format: format.to_string(),
            resize_options: serde_json::from_value::<OptionMap>(resize).unwrap(),
            output_options: serde_json::from_value::<OptionMap>(output).unwrap(),
        }
    }

    #[test]
    fn encode_params_from_job() {
        let params = encode_params(&job(
            "JPG",
            json!({"width": 100, "height": 50, "fit": "fill"}),
            json!({"quality": 70, "progressive": true}),
        ))
        .unwrap();

        assert_eq!(params.format, OutputFormat::Jpeg);
        assert_eq!(params.resize.width, Some(100));
        assert_eq!(params.resize.height, Some(50));
        assert_eq!(params.resize.fit, Fit::Fill);
        assert_eq!(params.output_params.quality.value(), 70);
    }

    #[test]
    fn unknown_format_rejected() {
        let result = encode_params(&job("gif", json!({}), json!({})));
        assert!(matches!(result, Err(BackendError::UnsupportedFormat(f)) if f == "gif"));
    }

    #[test]
    fn bad_option_rejected_before_backend() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();
        let mut bad = job("png", json!({"width": "wide"}), json!({}));
        bad.output = tmp.path().join("x.png");

        let result = encode_job(&backend, &bad);
        assert!(matches!(result, Err(BackendError::InvalidOption(_))));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn encode_job_dispatches_to_backend() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();
        let mut good = job("webp", json!({"width": 10, "height": 20}), json!({}));
        good.output = tmp.path().join("x.webp");

        encode_job(&backend, &good).unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Encode {
                format: OutputFormat::WebP,
                width: Some(10),
                height: Some(20),
                ..
            }
        ));
    }
}
