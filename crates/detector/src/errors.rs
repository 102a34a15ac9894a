use preprocess::PreprocessError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Failed to decode image: {0}")]
    DecodeError(#[source] image::ImageError),

    #[error("Unsupported channel count: {0}")]
    UnsupportedChannelCount(u8),

    #[error("Output tensor shape mismatch: expected {expected}, got {actual:?}")]
    ShapeMismatch { expected: String, actual: Vec<usize> },

    #[error("Inference failed: {0}")]
    InferenceFailure(String),

    #[error("Resource unavailable: {path}: {reason}")]
    ResourceUnavailable { path: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<PreprocessError> for DetectorError {
    fn from(err: PreprocessError) -> Self {
        match err {
            PreprocessError::Decode(e) => DetectorError::DecodeError(e),
            PreprocessError::UnsupportedChannelCount(n) => DetectorError::UnsupportedChannelCount(n),
            other => DetectorError::InvalidInput(other.to_string()),
        }
    }
}
