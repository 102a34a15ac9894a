use crate::{PreprocessError, PreprocessResult, resize::resize_bilinear};
use common::span;
use ndarray::{Array, IxDyn};

pub const DEFAULT_INPUT_SIZE: u32 = 416;
pub const DEFAULT_NORMALIZATION_SCALE: f32 = 255.0;

const OUTPUT_CHANNELS: usize = 3;

/// Turns encoded images into the square float tensor the network consumes.
///
/// Values are divided by `normalization_scale`; there is no mean subtraction.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    input_size: u32,
    normalization_scale: f32,
}

impl ImagePreprocessor {
    pub fn new(input_size: u32, normalization_scale: f32) -> Self {
        Self {
            input_size,
            normalization_scale,
        }
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    pub fn normalization_scale(&self) -> f32 {
        self.normalization_scale
    }

    /// Decode `image_bytes` (JPEG or PNG) and build a `[1, S, S, 3]` tensor.
    pub fn normalize(&self, image_bytes: &[u8]) -> Result<PreprocessResult, PreprocessError> {
        let _s = span!("normalize_image");

        let decoded = image::load_from_memory(image_bytes)?;
        let channels = decoded.color().channel_count();

        tracing::trace!(
            width = decoded.width(),
            height = decoded.height(),
            channels,
            encoded_bytes = image_bytes.len(),
            "Decoded image"
        );

        check_channels(channels)?;

        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        self.normalize_pixels(rgb.as_raw(), width, height, OUTPUT_CHANNELS as u8)
    }

    /// Build the network tensor from an interleaved 8-bit pixel buffer.
    ///
    /// Gray input is replicated to three channels and an alpha channel is dropped.
    pub fn normalize_pixels(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        channels: u8,
    ) -> Result<PreprocessResult, PreprocessError> {
        let _s = span!("normalize_pixels");

        check_channels(channels)?;

        if width == 0 || height == 0 {
            return Err(PreprocessError::EmptyImage);
        }

        let expected = width as usize * height as usize * channels as usize;
        if pixels.len() != expected {
            return Err(PreprocessError::BufferSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        let rgb = to_rgb_f32(pixels, channels as usize);

        let size = self.input_size as usize;
        let resized = {
            let _s = common::span_debug!("resize_bilinear");
            resize_bilinear(
                &rgb,
                width as usize,
                height as usize,
                OUTPUT_CHANNELS,
                size,
                size,
            )
        };

        let scaled: Vec<f32> = resized
            .into_iter()
            .map(|v| v / self.normalization_scale)
            .collect();

        let tensor = Array::from_shape_vec(IxDyn(&[1, size, size, OUTPUT_CHANNELS]), scaled)?;

        Ok(PreprocessResult {
            tensor,
            original_width: width,
            original_height: height,
        })
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE, DEFAULT_NORMALIZATION_SCALE)
    }
}

fn check_channels(channels: u8) -> Result<(), PreprocessError> {
    match channels {
        1 | 3 | 4 => Ok(()),
        other => Err(PreprocessError::UnsupportedChannelCount(other)),
    }
}

fn to_rgb_f32(pixels: &[u8], channels: usize) -> Vec<f32> {
    let mut rgb = Vec::with_capacity(pixels.len() / channels * OUTPUT_CHANNELS);
    for px in pixels.chunks_exact(channels) {
        match channels {
            1 => {
                let v = px[0] as f32;
                rgb.extend_from_slice(&[v, v, v]);
            }
            _ => rgb.extend(px[..OUTPUT_CHANNELS].iter().map(|&v| v as f32)),
        }
    }
    rgb
}
