// Model error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Model error code constants
///
/// Error code range: 2001-2004
pub struct ModelErrorCodes {}

impl ModelErrorCodes {
    /// Artifact missing, malformed or unsupported at startup
    pub const MODEL_LOAD: i32 = 2001;

    /// Inference attempted while the predictor is unavailable
    pub const UNAVAILABLE: i32 = 2002;

    /// The runtime failed while executing the graph
    pub const INFERENCE: i32 = 2003;

    /// Predictor lock was poisoned by a panicking caller
    pub const LOCK_POISONED: i32 = 2004;
}

/// Log a model error with structured context
pub fn log_model_error(err: &ModelError, context: &str) {
    error!(
        "Model error in {}: code={}, component=Predictor, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while loading or running the predictor
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Artifact could not be loaded
    ModelLoad { reason: String },

    /// Predictor handle is in the unavailable state
    Unavailable { reason: String },

    /// Forward pass failed
    Inference { reason: String },

    /// Mutex guarding the predictor was poisoned
    LockPoisoned { component: String },
}

impl ErrorCode for ModelError {
    fn code(&self) -> i32 {
        match self {
            ModelError::ModelLoad { .. } => ModelErrorCodes::MODEL_LOAD,
            ModelError::Unavailable { .. } => ModelErrorCodes::UNAVAILABLE,
            ModelError::Inference { .. } => ModelErrorCodes::INFERENCE,
            ModelError::LockPoisoned { .. } => ModelErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            ModelError::ModelLoad { reason } => format!("Failed to load model: {}", reason),
            ModelError::Unavailable { reason } => format!("Model not loaded: {}", reason),
            ModelError::Inference { reason } => format!("Inference failed: {}", reason),
            ModelError::LockPoisoned { component } => {
                format!("Lock poisoned for component: {}", component)
            }
        }
    }
}

impl ModelError {
    /// The bare detail carried by the variant, without the code prefix
    pub fn reason(&self) -> String {
        match self {
            ModelError::ModelLoad { reason }
            | ModelError::Unavailable { reason }
            | ModelError::Inference { reason } => reason.clone(),
            ModelError::LockPoisoned { component } => format!("{} lock poisoned", component),
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ModelError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ModelError {}
