use crate::{
    engine::EngineConfig,
    processing::decode::{Anchor, DecoderConfig},
};
use anyhow::Context;
use std::{env, str::FromStr};

pub use common::Environment;
pub use preprocess::{DEFAULT_INPUT_SIZE, DEFAULT_NORMALIZATION_SCALE};

/// Tiny YOLO (VOC) priors, as (width, height) in grid cells
pub const DEFAULT_ANCHORS: [(f32, f32); 5] = [
    (1.08, 1.19),
    (3.42, 4.41),
    (6.63, 11.38),
    (9.42, 5.11),
    (16.62, 10.52),
];

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub environment: Environment,
    pub model_path: String,
    pub labels_path: String,
    pub input_size: u32,
    pub normalization_scale: f32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub anchors: Vec<Anchor>,
    pub max_detections: Option<usize>,
    pub engine: EngineConfig,
}

impl DetectorConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::parse(
            &lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
        );

        let model_path =
            lookup("MODEL_PATH").unwrap_or_else(|| "models/yolo-voc.onnx".to_string());

        let labels_path =
            lookup("LABELS_PATH").unwrap_or_else(|| "models/labels.txt".to_string());

        let input_size = parse_var(&lookup, "INPUT_SIZE", DEFAULT_INPUT_SIZE)?;
        let normalization_scale =
            parse_var(&lookup, "NORMALIZATION_SCALE", DEFAULT_NORMALIZATION_SCALE)?;
        let confidence_threshold = parse_var(&lookup, "CONFIDENCE_THRESHOLD", 0.5)?;
        let iou_threshold = parse_var(&lookup, "IOU_THRESHOLD", 0.5)?;

        let anchors = match lookup("ANCHORS") {
            Some(raw) => parse_anchors(&raw).context("Invalid value for ANCHORS")?,
            None => DEFAULT_ANCHORS
                .iter()
                .map(|&(w, h)| Anchor::new(w, h))
                .collect(),
        };

        let max_detections = lookup("MAX_DETECTIONS")
            .map(|raw| {
                raw.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid value for MAX_DETECTIONS: {:?}", raw))
            })
            .transpose()?;

        let defaults = EngineConfig::default();
        let engine = EngineConfig {
            input_name: lookup("INPUT_NAME").unwrap_or(defaults.input_name),
            output_name: lookup("OUTPUT_NAME").unwrap_or(defaults.output_name),
            intra_threads: parse_var(&lookup, "INTRA_THREADS", defaults.intra_threads)?,
        };

        let config = Self {
            environment,
            model_path,
            labels_path,
            input_size,
            normalization_scale,
            confidence_threshold,
            iou_threshold,
            anchors,
            max_detections,
            engine,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.input_size == 0 {
            anyhow::bail!("INPUT_SIZE must be positive");
        }
        if !(self.normalization_scale > 0.0 && self.normalization_scale.is_finite()) {
            anyhow::bail!(
                "NORMALIZATION_SCALE must be a positive number, got {}",
                self.normalization_scale
            );
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            anyhow::bail!(
                "CONFIDENCE_THRESHOLD must be within [0, 1], got {}",
                self.confidence_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            anyhow::bail!(
                "IOU_THRESHOLD must be within [0, 1], got {}",
                self.iou_threshold
            );
        }
        if self.anchors.is_empty() {
            anyhow::bail!("At least one anchor is required");
        }
        if let Some(bad) = self
            .anchors
            .iter()
            .find(|a| !(is_positive(a.width) && is_positive(a.height)))
        {
            anyhow::bail!(
                "Anchor dimensions must be positive, got ({}, {})",
                bad.width,
                bad.height
            );
        }
        if self.engine.intra_threads == 0 {
            anyhow::bail!("INTRA_THREADS must be positive");
        }
        Ok(())
    }

    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            confidence_threshold: self.confidence_threshold,
            anchors: self.anchors.clone(),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {:?} ({})", key, raw, e)),
        None => Ok(default),
    }
}

/// Parse `w1,h1,w2,h2,...` into anchors. Whitespace around values is ignored.
fn is_positive(value: f32) -> bool {
    value > 0.0 && value.is_finite()
}

pub fn parse_anchors(raw: &str) -> anyhow::Result<Vec<Anchor>> {
    let values = raw
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<f32>()
                .with_context(|| format!("Anchor value {:?} is not a number", v))
        })
        .collect::<anyhow::Result<Vec<f32>>>()?;

    if values.is_empty() {
        anyhow::bail!("Anchor list is empty");
    }
    if values.len() % 2 != 0 {
        anyhow::bail!(
            "Anchor list needs width,height pairs, got {} values",
            values.len()
        );
    }
    if let Some(bad) = values.iter().find(|v| !is_positive(**v)) {
        anyhow::bail!("Anchor dimensions must be positive, got {}", bad);
    }

    Ok(values
        .chunks_exact(2)
        .map(|pair| Anchor::new(pair[0], pair[1]))
        .collect())
}
