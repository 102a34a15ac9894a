use super::{EngineConfig, InferenceEngine};
use crate::errors::DetectorError;
use ndarray::{Array, IxDyn};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use std::path::Path;

/// ONNX Runtime session. The session is dropped on `release` or when the
/// engine itself is dropped.
pub struct OrtEngine {
    session: Option<Session>,
    input_name: String,
    output_name: String,
}

impl OrtEngine {
    pub fn load(path: &str, config: &EngineConfig) -> Result<Self, DetectorError> {
        let unavailable = |reason: String| DetectorError::ResourceUnavailable {
            path: path.to_string(),
            reason,
        };

        if !Path::new(path).is_file() {
            return Err(unavailable("model file not found".to_string()));
        }

        let session =
            build_session(path, config.intra_threads).map_err(|e| unavailable(format!("{e:#}")))?;

        tracing::info!(
            input = %config.input_name,
            output = %config.output_name,
            "Model loaded from {}",
            path
        );

        Ok(Self {
            session: Some(session),
            input_name: config.input_name.clone(),
            output_name: config.output_name.clone(),
        })
    }
}

fn build_session(path: &str, intra_threads: usize) -> anyhow::Result<Session> {
    // Initialize ORT environment (idempotent)
    let _ = ort::init().commit();

    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(intra_threads)?
        .commit_from_file(path)?;

    Ok(session)
}

fn run_session(
    session: &mut Session,
    input_name: &str,
    output_name: &str,
    input: &Array<f32, IxDyn>,
) -> anyhow::Result<Array<f32, IxDyn>> {
    let outputs = session.run(ort::inputs![
        input_name => TensorRef::from_array_view(input.view())?
    ])?;

    let output = outputs[output_name].try_extract_array::<f32>()?;
    Ok(output.into_owned())
}

impl InferenceEngine for OrtEngine {
    fn run(&mut self, input: &Array<f32, IxDyn>) -> Result<Array<f32, IxDyn>, DetectorError> {
        let session = self.session.as_mut().ok_or_else(|| {
            DetectorError::InferenceFailure("inference engine has been released".to_string())
        })?;

        run_session(session, &self.input_name, &self.output_name, input)
            .map_err(|e| DetectorError::InferenceFailure(format!("{e:#}")))
    }

    fn release(&mut self) {
        if self.session.take().is_some() {
            tracing::info!("ONNX Runtime session released");
        }
    }
}

impl Drop for OrtEngine {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_resource_unavailable() {
        let err = OrtEngine::load("/nonexistent/model.onnx", &EngineConfig::default())
            .err()
            .unwrap();

        match err {
            DetectorError::ResourceUnavailable { path, .. } => {
                assert_eq!(path, "/nonexistent/model.onnx")
            }
            other => panic!("Expected ResourceUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_model_is_resource_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"not an onnx graph").unwrap();

        let result = OrtEngine::load(path.to_str().unwrap(), &EngineConfig::default());
        assert!(matches!(
            result,
            Err(DetectorError::ResourceUnavailable { .. })
        ));
    }
}
