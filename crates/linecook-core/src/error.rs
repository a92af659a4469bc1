use std::path::PathBuf;

/// Reasons an upload is rejected before any page is loaded.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("file size {size} bytes exceeds maximum allowed size {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("file extension '{extension}' not allowed. Supported extensions: {allowed}")]
    UnsupportedExtension { extension: String, allowed: String },

    #[error("invalid image file: {0}")]
    CorruptImage(String),

    #[error("invalid PDF file: missing PDF header")]
    CorruptPdf,
}

#[derive(Debug, thiserror::Error)]
pub enum LineCookError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to convert input to pages: {0}")]
    Conversion(String),

    #[error("pdftoppm not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftoppmNotFound,

    #[error("pdftoppm failed with exit code {code}: {stderr}")]
    PdftoppmFailed { code: i32, stderr: String },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("inference API returned {status}: {body}")]
    InferenceStatus { status: u16, body: String },

    #[error("no predictions provided")]
    EmptyPredictionSet,

    #[error("failed to extract label: {0}")]
    Extraction(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to load configuration from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("printing is disabled in configuration")]
    PrintingDisabled,

    #[error("printing failed: {0}")]
    Printing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// How a failure should be presented to whoever submitted the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The upload itself is unusable (validation or conversion).
    BadInput,
    /// The remote inference dependency failed.
    UpstreamFailure,
    /// Anything else: configuration, IO, printing, broken invariants.
    Internal,
}

impl LineCookError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LineCookError::Validation(_)
            | LineCookError::Conversion(_)
            | LineCookError::PdftoppmFailed { .. } => ErrorCategory::BadInput,
            LineCookError::Inference(_) | LineCookError::InferenceStatus { .. } => {
                ErrorCategory::UpstreamFailure
            }
            _ => ErrorCategory::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_bad_input() {
        let err: LineCookError = ValidationError::CorruptPdf.into();
        assert_eq!(err.category(), ErrorCategory::BadInput);
        assert_eq!(err.to_string(), "invalid PDF file: missing PDF header");
    }

    #[test]
    fn test_inference_errors_are_upstream() {
        let err = LineCookError::InferenceStatus {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(err.category(), ErrorCategory::UpstreamFailure);
    }

    #[test]
    fn test_missing_pdftoppm_is_internal() {
        assert_eq!(
            LineCookError::PdftoppmNotFound.category(),
            ErrorCategory::Internal
        );
    }
}
