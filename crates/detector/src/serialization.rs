//! Response mapping for detection results.
//!
//! Confidence is rendered as a string while box edges stay numeric.

use crate::types::Detection;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionRecord<'a> {
    pub label: &'a str,
    pub confidence: String,
    pub location: Location,
}

impl<'a> From<&'a Detection> for DetectionRecord<'a> {
    fn from(d: &'a Detection) -> Self {
        Self {
            label: &d.label,
            confidence: d.confidence.to_string(),
            location: Location {
                left: d.bbox.left,
                top: d.bbox.top,
                right: d.bbox.right,
                bottom: d.bbox.bottom,
            },
        }
    }
}

pub fn to_records(detections: &[Detection]) -> Vec<DetectionRecord<'_>> {
    detections.iter().map(DetectionRecord::from).collect()
}

pub fn to_json(detections: &[Detection]) -> serde_json::Result<String> {
    serde_json::to_string(&to_records(detections))
}
