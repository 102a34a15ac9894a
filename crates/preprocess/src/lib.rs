pub mod errors;
pub mod preprocessor;
pub mod resize;

use ndarray::{Array, IxDyn};

pub use errors::PreprocessError;
pub use preprocessor::{DEFAULT_INPUT_SIZE, DEFAULT_NORMALIZATION_SCALE, ImagePreprocessor};
pub use resize::resize_bilinear;

/// Network input produced from one image
#[derive(Debug)]
pub struct PreprocessResult {
    /// `[1, S, S, 3]` float tensor (NHWC), already divided by the normalization scale
    pub tensor: Array<f32, IxDyn>,
    /// Width of the decoded image before resizing
    pub original_width: u32,
    /// Height of the decoded image before resizing
    pub original_height: u32,
}
