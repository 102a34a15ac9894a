use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Unsupported channel count: {0} (expected 1, 3 or 4)")]
    UnsupportedChannelCount(u8),

    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Image has zero width or height")]
    EmptyImage,

    #[error("Tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
