//! ONNX Runtime backend.
//!
//! The graph takes one `[1, 65, 95, 3]` float tensor and produces three
//! `[1, 1]` heads (event probability, P fraction, S fraction). Sessions run
//! with a single intra-op thread; concurrency is managed by the handle.

use std::fmt::Display;
use std::path::Path;

use ort::session::Session;
use ort::value::Tensor;

use crate::error::ModelError;
use crate::model::{Predictor, RawPrediction};
use crate::preprocess::Spectrogram;

pub struct OnnxPredictor {
    session: Session,
    graph: String,
    outputs: Vec<String>,
}

impl OnnxPredictor {
    /// Deserialize a graph file into a session
    pub fn load(graph_path: &Path, outputs: &[String]) -> Result<Self, ModelError> {
        if !graph_path.exists() {
            return Err(ModelError::ModelLoad {
                reason: format!("graph not found at {}", graph_path.display()),
            });
        }

        let session = Session::builder()
            .map_err(|err| load_error(graph_path, err))?
            .with_intra_threads(1)
            .map_err(|err| load_error(graph_path, err))?
            .commit_from_file(graph_path)
            .map_err(|err| load_error(graph_path, err))?;

        Ok(Self {
            session,
            graph: graph_path.display().to_string(),
            outputs: outputs.to_vec(),
        })
    }
}

impl Predictor for OnnxPredictor {
    fn describe(&self) -> String {
        format!("onnx:{}", self.graph)
    }

    fn predict(&mut self, spectrogram: &Spectrogram) -> Result<RawPrediction, ModelError> {
        let input = Tensor::from_array(spectrogram.view().to_owned()).map_err(inference_error)?;
        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(inference_error)?;

        let mut heads = [0.0f32; 3];
        for (slot, name) in heads.iter_mut().zip(&self.outputs) {
            let value = outputs.get(name.as_str()).ok_or_else(|| ModelError::Inference {
                reason: format!("graph produced no output named '{}'", name),
            })?;
            let array = value.try_extract_array::<f32>().map_err(inference_error)?;
            *slot = array.iter().next().copied().ok_or_else(|| ModelError::Inference {
                reason: format!("output '{}' is empty", name),
            })?;
        }

        Ok(RawPrediction::new(heads[0], heads[1], heads[2]))
    }
}

fn load_error(graph_path: &Path, err: impl Display) -> ModelError {
    ModelError::ModelLoad {
        reason: format!("failed to load {}: {}", graph_path.display(), err),
    }
}

fn inference_error(err: impl Display) -> ModelError {
    ModelError::Inference {
        reason: err.to_string(),
    }
}
