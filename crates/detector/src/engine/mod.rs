use crate::errors::DetectorError;
use ndarray::{Array, IxDyn};

#[cfg(feature = "ort-backend")]
pub mod ort;

/// Graph binding and threading options for an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub input_name: String,
    pub output_name: String,
    pub intra_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            input_name: "input".to_string(),
            output_name: "output".to_string(),
            intra_threads: 4,
        }
    }
}

/// Opaque network runner owning native resources.
///
/// The detector serializes calls to `run` behind a mutex, so implementations
/// need not be reentrant.
pub trait InferenceEngine {
    /// Run the network on a `[1, S, S, 3]` input and return the raw output tensor.
    fn run(&mut self, input: &Array<f32, IxDyn>) -> Result<Array<f32, IxDyn>, DetectorError>;

    /// Free native resources. Must be idempotent; `run` afterwards fails with
    /// `InferenceFailure`.
    fn release(&mut self);
}
