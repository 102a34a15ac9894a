use crate::{
    errors::DetectorError,
    labels::LabelSet,
    types::{BoundingBox, Detection},
};
use std::borrow::Cow;

/// Number of box values ahead of the class scores: tx, ty, tw, th, objectness
const BOX_FIELDS: usize = 5;

/// Prior box size, in grid cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub width: f32,
    pub height: f32,
}

impl Anchor {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Immutable decoding parameters, built once alongside the model.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderConfig {
    pub confidence_threshold: f32,
    pub anchors: Vec<Anchor>,
}

/// Turns the raw `[1, G, G, B * (5 + C)]` grid output into candidate detections.
#[derive(Debug, Clone)]
pub struct DetectionDecoder {
    config: DecoderConfig,
}

impl DetectionDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Expected size of the last output dimension for `num_classes` labels
    pub fn channels_per_cell(&self, num_classes: usize) -> usize {
        self.config.anchors.len() * (BOX_FIELDS + num_classes)
    }

    /// Decode every (cell, anchor, class) whose combined confidence is strictly
    /// above the threshold. Boxes are projected onto the original image and
    /// clamped to its bounds.
    #[tracing::instrument(skip(self, output, labels), fields(shape = ?output.shape()))]
    pub fn decode(
        &self,
        output: &ndarray::ArrayViewD<f32>,
        labels: &LabelSet,
        original_width: u32,
        original_height: u32,
    ) -> Result<Vec<Detection>, DetectorError> {
        let grid = self.check_shape(output.shape(), labels.len())?;

        let num_classes = labels.len();
        let stride = BOX_FIELDS + num_classes;
        let depth = self.channels_per_cell(num_classes);

        let data: Cow<[f32]> = match output.as_slice() {
            Some(slice) => Cow::Borrowed(slice),
            None => Cow::Owned(output.iter().copied().collect()),
        };

        let grid_f = grid as f32;
        let image_w = original_width as f32;
        let image_h = original_height as f32;
        let threshold = self.config.confidence_threshold;

        let mut probs = vec![0.0f32; num_classes];
        let mut detections = Vec::new();

        for gy in 0..grid {
            for gx in 0..grid {
                let cell_start = (gy * grid + gx) * depth;
                let cell = &data[cell_start..cell_start + depth];

                for (b, anchor) in self.config.anchors.iter().enumerate() {
                    let entry = &cell[b * stride..(b + 1) * stride];

                    let objectness = sigmoid(entry[4]);
                    softmax(&entry[BOX_FIELDS..], &mut probs);

                    let cx = (sigmoid(entry[0]) + gx as f32) / grid_f;
                    let cy = (sigmoid(entry[1]) + gy as f32) / grid_f;
                    let w = anchor.width * entry[2].exp() / grid_f;
                    let h = anchor.height * entry[3].exp() / grid_f;

                    let bbox = to_image_box(cx, cy, w, h, image_w, image_h);

                    for (label, &prob) in labels.iter().zip(probs.iter()) {
                        let confidence = objectness * prob;

                        // Strict comparison: NaN and exact-threshold scores are dropped
                        if confidence > threshold {
                            if !bbox.is_finite() {
                                tracing::trace!(gx, gy, anchor = b, "Skipping non-finite box");
                                continue;
                            }

                            detections.push(Detection {
                                label: label.to_string(),
                                confidence,
                                bbox,
                            });
                        }
                    }
                }
            }
        }

        tracing::trace!(candidates = detections.len(), "Decoded output grid");

        Ok(detections)
    }

    /// Validate `[1, G, G, B * (5 + C)]` and return G
    fn check_shape(&self, shape: &[usize], num_classes: usize) -> Result<usize, DetectorError> {
        let depth = self.channels_per_cell(num_classes);

        let valid = shape.len() == 4 && shape[0] == 1 && shape[1] == shape[2] && shape[3] == depth;
        if !valid {
            return Err(DetectorError::ShapeMismatch {
                expected: format!(
                    "[1, G, G, {}] ({} anchors x (5 + {} classes))",
                    depth,
                    self.config.anchors.len(),
                    num_classes
                ),
                actual: shape.to_vec(),
            });
        }

        Ok(shape[1])
    }
}

/// Sigmoid activation function
#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable softmax: the max score is subtracted before exponentiating.
fn softmax(scores: &[f32], out: &mut [f32]) {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let mut sum = 0.0f32;
    for (o, &s) in out.iter_mut().zip(scores) {
        *o = (s - max).exp();
        sum += *o;
    }

    for o in out.iter_mut() {
        *o /= sum;
    }
}

/// Convert a normalized center/size box to clamped pixel corners
#[inline]
fn to_image_box(cx: f32, cy: f32, w: f32, h: f32, image_w: f32, image_h: f32) -> BoundingBox {
    BoundingBox {
        left: ((cx - w / 2.0) * image_w).clamp(0.0, image_w),
        top: ((cy - h / 2.0) * image_h).clamp(0.0, image_h),
        right: ((cx + w / 2.0) * image_w).clamp(0.0, image_w),
        bottom: ((cy + h / 2.0) * image_h).clamp(0.0, image_h),
    }
}
