//! Predictor ownership and lifecycle.
//!
//! A [`PredictorHandle`] is built exactly once at startup and shared
//! read-only by every request. It is either `Ready`, holding a backend behind
//! a mutex, or `Unavailable`, holding the reason loading failed. The state is
//! fixed at construction; an unavailable handle never attempts inference.

pub mod manifest;
pub mod registry;

#[cfg(feature = "onnx")]
pub mod onnx;

use std::path::Path;
use std::sync::Mutex;

use log::info;
use serde::Serialize;

use crate::error::{log_model_error, ModelError};
use crate::preprocess::Spectrogram;

pub use manifest::{ArtifactFormat, ArtifactManifest, MANIFEST_FILE};
pub use registry::{default_registry, masked_mse, CustomObject, CustomObjectRegistry, ScoringFn};

/// The three scalar heads of the predictor, before any presentation logic
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RawPrediction {
    /// Event head, a probability in [0, 1]
    pub event_probability: f32,
    /// P-arrival head, a fraction of the 60 s window
    pub p_raw: f32,
    /// S-arrival head, a fraction of the 60 s window
    pub s_raw: f32,
}

impl RawPrediction {
    pub fn new(event_probability: f32, p_raw: f32, s_raw: f32) -> Self {
        Self {
            event_probability,
            p_raw,
            s_raw,
        }
    }
}

/// A loaded inference backend
///
/// Implementations are not required to be reentrant; the handle serializes
/// every call.
pub trait Predictor: Send {
    /// Short description used in logs and status reports
    fn describe(&self) -> String;

    /// Run one forward pass over a single-sample batch
    fn predict(&mut self, spectrogram: &Spectrogram) -> Result<RawPrediction, ModelError>;
}

enum HandleState {
    Ready {
        predictor: Mutex<Box<dyn Predictor>>,
        description: String,
    },
    Unavailable {
        reason: String,
    },
}

/// Serializable view of the handle's lifecycle state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HandleStatus {
    Ready { predictor: String },
    Unavailable { reason: String },
}

/// Process-wide owner of the predictor
pub struct PredictorHandle {
    state: HandleState,
}

impl PredictorHandle {
    /// Wrap an already constructed backend
    pub fn ready(predictor: Box<dyn Predictor>) -> Self {
        let description = predictor.describe();
        Self {
            state: HandleState::Ready {
                predictor: Mutex::new(predictor),
                description,
            },
        }
    }

    /// A handle that rejects all inference with the given reason
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: HandleState::Unavailable {
                reason: reason.into(),
            },
        }
    }

    /// Load an artifact directory, reporting any failure
    ///
    /// # Errors
    /// `ModelLoad` if the directory or manifest is missing or invalid, a
    /// custom object is not registered, or the backend rejects the graph.
    pub fn try_load(dir: &Path, registry: &CustomObjectRegistry) -> Result<Self, ModelError> {
        if !dir.exists() {
            return Err(ModelError::ModelLoad {
                reason: format!("Model not found at {}", dir.display()),
            });
        }

        let manifest = ArtifactManifest::read(dir)?;
        manifest.validate()?;

        // Training-time objects are only resolved so the graph can be rebuilt
        let resolved = registry.resolve(&manifest.custom_objects)?;
        log::debug!(
            "[Model] Resolved {} custom object(s): {:?}",
            resolved.len(),
            manifest.custom_objects
        );

        let predictor = build_backend(dir, &manifest)?;
        let handle = Self::ready(predictor);
        info!(
            "[Model] Loaded {} from {}",
            handle.status_label(),
            dir.display()
        );
        Ok(handle)
    }

    /// Startup entry point: never fails, records `Unavailable` instead
    pub fn load(dir: &Path, registry: &CustomObjectRegistry) -> Self {
        match Self::try_load(dir, registry) {
            Ok(handle) => handle,
            Err(err) => {
                log_model_error(&err, "PredictorHandle::load");
                Self::unavailable(err.reason())
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, HandleState::Ready { .. })
    }

    pub fn status(&self) -> HandleStatus {
        match &self.state {
            HandleState::Ready { description, .. } => HandleStatus::Ready {
                predictor: description.clone(),
            },
            HandleState::Unavailable { reason } => HandleStatus::Unavailable {
                reason: reason.clone(),
            },
        }
    }

    /// "ready" or the unavailability reason
    pub fn status_label(&self) -> String {
        match &self.state {
            HandleState::Ready { description, .. } => format!("ready ({})", description),
            HandleState::Unavailable { reason } => reason.clone(),
        }
    }

    /// Fail fast when the handle cannot serve inference
    pub fn ensure_ready(&self) -> Result<(), ModelError> {
        match &self.state {
            HandleState::Ready { .. } => Ok(()),
            HandleState::Unavailable { reason } => Err(ModelError::Unavailable {
                reason: reason.clone(),
            }),
        }
    }

    /// Run inference, serialized across callers
    pub fn predict(&self, spectrogram: &Spectrogram) -> Result<RawPrediction, ModelError> {
        match &self.state {
            HandleState::Ready { predictor, .. } => {
                let mut guard = predictor.lock().map_err(|_| ModelError::LockPoisoned {
                    component: "predictor".to_string(),
                })?;
                guard.predict(spectrogram)
            }
            HandleState::Unavailable { reason } => Err(ModelError::Unavailable {
                reason: reason.clone(),
            }),
        }
    }
}

#[cfg(feature = "onnx")]
fn build_backend(
    dir: &Path,
    manifest: &ArtifactManifest,
) -> Result<Box<dyn Predictor>, ModelError> {
    match manifest.format {
        ArtifactFormat::Onnx => {
            let predictor = onnx::OnnxPredictor::load(&dir.join(&manifest.graph), &manifest.outputs)?;
            Ok(Box::new(predictor))
        }
    }
}

#[cfg(not(feature = "onnx"))]
fn build_backend(
    dir: &Path,
    manifest: &ArtifactManifest,
) -> Result<Box<dyn Predictor>, ModelError> {
    match manifest.format {
        ArtifactFormat::Onnx => Err(ModelError::ModelLoad {
            reason: format!(
                "{} is an ONNX graph but this build lacks the `onnx` feature",
                dir.join(&manifest.graph).display()
            ),
        }),
    }
}

#[cfg(test)]
mod tests;
