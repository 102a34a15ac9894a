use crate::{
    config::DetectorConfig,
    engine::InferenceEngine,
    errors::DetectorError,
    labels::LabelSet,
    processing::{
        decode::DetectionDecoder,
        nms::{NonMaxSuppressor, limit_detections},
    },
    types::Detection,
};
use common::span;
use preprocess::ImagePreprocessor;
use std::sync::{Mutex, PoisonError};

#[cfg(feature = "ort-backend")]
use crate::engine::ort::OrtEngine;

/// Full pipeline: preprocess, infer, decode, suppress.
///
/// Owns the inference engine and label set for its whole lifetime. The engine
/// is released exactly once, by `shutdown` or on drop, whichever comes first.
/// `detect` takes `&self`, so one detector can serve several threads; only the
/// engine call itself is serialized. A panic inside the engine does not
/// disable later calls.
pub struct Detector<E: InferenceEngine> {
    engine: Mutex<E>,
    labels: LabelSet,
    preprocessor: ImagePreprocessor,
    decoder: DetectionDecoder,
    suppressor: NonMaxSuppressor,
    max_detections: Option<usize>,
}

impl<E: InferenceEngine> Detector<E> {
    pub fn new(
        mut engine: E,
        labels: LabelSet,
        config: &DetectorConfig,
    ) -> Result<Self, DetectorError> {
        if let Err(e) = config.validate() {
            engine.release();
            return Err(DetectorError::InvalidInput(format!(
                "invalid detector configuration: {e:#}"
            )));
        }

        if labels.is_empty() {
            engine.release();
            return Err(DetectorError::ResourceUnavailable {
                path: config.labels_path.clone(),
                reason: "label set is empty".to_string(),
            });
        }

        let preprocessor = ImagePreprocessor::new(config.input_size, config.normalization_scale);
        let decoder = DetectionDecoder::new(config.decoder_config());
        let suppressor = NonMaxSuppressor::new(config.iou_threshold);

        tracing::info!(
            input_size = preprocessor.input_size(),
            normalization_scale = preprocessor.normalization_scale(),
            confidence_threshold = decoder.config().confidence_threshold,
            anchors = decoder.config().anchors.len(),
            iou_threshold = suppressor.iou_threshold(),
            labels = labels.len(),
            "Detector ready"
        );

        Ok(Self {
            engine: Mutex::new(engine),
            labels,
            preprocessor,
            decoder,
            suppressor,
            max_detections: config.max_detections,
        })
    }

    /// Build the engine with `load_engine`, then read the label file.
    ///
    /// If the labels cannot be loaded the freshly built engine is released
    /// before the error is returned.
    pub fn load_with<F>(config: &DetectorConfig, load_engine: F) -> Result<Self, DetectorError>
    where
        F: FnOnce(&DetectorConfig) -> Result<E, DetectorError>,
    {
        let mut engine = load_engine(config)?;

        let labels = match LabelSet::from_file(&config.labels_path) {
            Ok(labels) => labels,
            Err(e) => {
                engine.release();
                return Err(e);
            }
        };

        Self::new(engine, labels, config)
    }

    /// Run the whole pipeline on encoded image bytes.
    ///
    /// Any failing stage aborts the call with that stage's error; the detector
    /// stays usable for later calls.
    pub fn detect(&self, image_bytes: &[u8]) -> Result<Vec<Detection>, DetectorError> {
        let _s = span!("detect");

        let input = self.preprocessor.normalize(image_bytes)?;

        let output = {
            let _s = span!("model_inference");
            // A panic inside `run` leaves no shared state half-written
            let mut engine = self.engine.lock().unwrap_or_else(|poisoned| {
                tracing::warn!("Inference engine lock poisoned by an earlier panic, recovering");
                self.engine.clear_poison();
                poisoned.into_inner()
            });
            engine.run(&input.tensor)?
        };

        let candidates = self.decoder.decode(
            &output.view(),
            &self.labels,
            input.original_width,
            input.original_height,
        )?;
        let candidate_count = candidates.len();

        let mut detections = {
            let _s = common::span_debug!("non_max_suppression");
            self.suppressor.suppress(candidates)
        };

        if let Some(max) = self.max_detections {
            detections = limit_detections(detections, max);
        }

        tracing::debug!(
            width = input.original_width,
            height = input.original_height,
            candidates = candidate_count,
            detections = detections.len(),
            "Image processed"
        );

        Ok(detections)
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Release the engine now instead of waiting for drop.
    pub fn shutdown(mut self) {
        tracing::info!("Shutting down detector");
        self.release_engine();
    }

    fn release_engine(&mut self) {
        self.engine
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .release();
    }
}

#[cfg(feature = "ort-backend")]
impl Detector<OrtEngine> {
    /// Load the ONNX model and label file named in `config`.
    pub fn load(config: &DetectorConfig) -> Result<Self, DetectorError> {
        Self::load_with(config, |config| {
            OrtEngine::load(&config.model_path, &config.engine)
        })
    }
}

impl<E: InferenceEngine> Drop for Detector<E> {
    fn drop(&mut self) {
        self.release_engine();
    }
}
