pub mod config;
pub mod detector;
pub mod engine;
pub mod errors;
pub mod labels;
pub mod logging;
pub mod processing;
pub mod serialization;
pub mod types;

// Re-export commonly used types for convenience
pub use config::DetectorConfig;
pub use detector::Detector;
#[cfg(feature = "ort-backend")]
pub use engine::ort::OrtEngine;
pub use engine::{EngineConfig, InferenceEngine};
pub use errors::DetectorError;
pub use labels::LabelSet;
pub use processing::decode::{Anchor, DecoderConfig, DetectionDecoder};
pub use processing::nms::{NonMaxSuppressor, iou, suppress};
pub use types::{BoundingBox, Detection};
