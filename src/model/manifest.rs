// Artifact manifest - describes a model directory
//
// Example `artifact.json`:
//
//     {
//       "format": "onnx",
//       "graph": "model.onnx",
//       "custom_objects": ["masked_mse"],
//       "input_shape": [1, 65, 95, 3],
//       "outputs": ["event", "p_arrival", "s_arrival"]
//     }

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::preprocess::INPUT_SHAPE;

/// File name of the manifest inside an artifact directory
pub const MANIFEST_FILE: &str = "artifact.json";

/// Serialized graph formats the loader knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    Onnx,
}

/// Parsed `artifact.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub format: ArtifactFormat,
    /// Graph file, relative to the artifact directory
    pub graph: PathBuf,
    /// Training-time objects the graph references by name
    #[serde(default)]
    pub custom_objects: Vec<String>,
    pub input_shape: Vec<usize>,
    /// Output names in event, P, S order
    pub outputs: Vec<String>,
}

impl ArtifactManifest {
    /// Read and parse the manifest of an artifact directory
    pub fn read(dir: &Path) -> Result<Self, ModelError> {
        let path = dir.join(MANIFEST_FILE);
        let contents = fs::read_to_string(&path).map_err(|err| ModelError::ModelLoad {
            reason: format!("failed to read {}: {}", path.display(), err),
        })?;
        serde_json::from_str(&contents).map_err(|err| ModelError::ModelLoad {
            reason: format!("malformed {}: {}", path.display(), err),
        })
    }

    /// Check the manifest against what the pipeline produces and consumes
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.input_shape != INPUT_SHAPE {
            return Err(ModelError::ModelLoad {
                reason: format!(
                    "artifact expects input shape {:?}, preprocessing produces {:?}",
                    self.input_shape, INPUT_SHAPE
                ),
            });
        }
        if self.outputs.len() != 3 {
            return Err(ModelError::ModelLoad {
                reason: format!(
                    "artifact must declare 3 outputs (event, P, S), found {}",
                    self.outputs.len()
                ),
            });
        }
        Ok(())
    }
}
