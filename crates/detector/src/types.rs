/// Axis-aligned box in pixel coordinates of the original image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Overlap area, zero when the boxes are disjoint on either axis
    pub fn intersection_area(&self, other: &BoundingBox) -> f32 {
        let overlap_w = self.right.min(other.right) - self.left.max(other.left);
        let overlap_h = self.bottom.min(other.bottom) - self.top.max(other.top);

        if overlap_w <= 0.0 || overlap_h <= 0.0 {
            0.0
        } else {
            overlap_w * overlap_h
        }
    }

    pub fn is_finite(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
    }
}

/// One detected object. Never modified once the decoder has produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}
