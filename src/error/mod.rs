// Error types for the quake detector service
//
// Input errors describe defects in the uploaded recording and map to
// client-side failures. Model errors describe the predictor's state and map
// to server-side failures. Both carry stable numeric codes for the HTTP layer.

mod input;
mod model;

pub use input::{log_input_error, InputError, InputErrorCodes};
pub use model::{log_model_error, ModelError, ModelErrorCodes};

use std::fmt;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the HTTP boundary and the CLI.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Code reported when the blocking inference task could not be joined
pub const TASK_FAILED_CODE: i32 = 3001;

/// Any failure of a single inference request
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// The recording itself is unusable
    Input(InputError),

    /// The predictor could not serve the request
    Model(ModelError),

    /// The blocking worker running the pipeline panicked or was cancelled
    TaskFailed { reason: String },
}

impl ServiceError {
    /// True when the caller supplied a defective recording
    pub fn is_client_error(&self) -> bool {
        matches!(self, ServiceError::Input(_))
    }
}

impl ErrorCode for ServiceError {
    fn code(&self) -> i32 {
        match self {
            ServiceError::Input(err) => err.code(),
            ServiceError::Model(err) => err.code(),
            ServiceError::TaskFailed { .. } => TASK_FAILED_CODE,
        }
    }

    fn message(&self) -> String {
        match self {
            ServiceError::Input(err) => err.message(),
            ServiceError::Model(err) => err.message(),
            ServiceError::TaskFailed { reason } => {
                format!("Inference task failed: {}", reason)
            }
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Input(err) => err.fmt(f),
            ServiceError::Model(err) => err.fmt(f),
            ServiceError::TaskFailed { .. } => write!(
                f,
                "ServiceError::TaskFailed (code {}): {}",
                self.code(),
                self.message()
            ),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Input(err) => Some(err),
            ServiceError::Model(err) => Some(err),
            ServiceError::TaskFailed { .. } => None,
        }
    }
}

impl From<InputError> for ServiceError {
    fn from(err: InputError) -> Self {
        ServiceError::Input(err)
    }
}

impl From<ModelError> for ServiceError {
    fn from(err: ModelError) -> Self {
        ServiceError::Model(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_delegates_codes() {
        let input: ServiceError = InputError::ShapeMismatch { channels: 2 }.into();
        assert_eq!(input.code(), InputErrorCodes::SHAPE_MISMATCH);
        assert!(input.is_client_error());

        let model: ServiceError = ModelError::Unavailable {
            reason: "missing".to_string(),
        }
        .into();
        assert_eq!(model.code(), ModelErrorCodes::UNAVAILABLE);
        assert!(!model.is_client_error());
    }

    #[test]
    fn test_task_failed_message() {
        let err = ServiceError::TaskFailed {
            reason: "panicked".to_string(),
        };
        assert_eq!(err.code(), TASK_FAILED_CODE);
        assert_eq!(err.message(), "Inference task failed: panicked");
        assert!(format!("{}", err).contains("3001"));
    }
}
