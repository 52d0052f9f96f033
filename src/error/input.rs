// Input error types and constants

use crate::error::ErrorCode;
use log::warn;
use std::fmt;

/// Input error code constants
///
/// Error code range: 1001-1006
pub struct InputErrorCodes {}

impl InputErrorCodes {
    /// Uploaded bytes are not a readable waveform container
    pub const DECODE: i32 = 1001;

    /// Decoded sample rate differs from the reference rate
    pub const SAMPLE_RATE_MISMATCH: i32 = 1002;

    /// Channel count is neither 1 nor 3, or samples do not fill whole frames
    pub const SHAPE_MISMATCH: i32 = 1003;

    /// Recording decoded to zero samples
    pub const EMPTY_WAVEFORM: i32 = 1004;

    /// Multipart request carried no file part
    pub const MISSING_UPLOAD: i32 = 1005;

    /// Recording contains a NaN or infinite sample
    pub const NON_FINITE_SAMPLE: i32 = 1006;
}

/// Log an input error with structured context
///
/// Input errors are the caller's fault, so they are logged at warn level.
pub fn log_input_error(err: &InputError, context: &str) {
    warn!(
        "Input error in {}: code={}, component=Pipeline, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors caused by the uploaded recording
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    /// Container could not be decoded
    Decode { reason: String },

    /// Recording was not sampled at the reference rate
    SampleRateMismatch { expected: u32, actual: u32 },

    /// Channel layout cannot be mapped onto three channels
    ShapeMismatch { channels: usize },

    /// Recording contains no samples
    EmptyWaveform,

    /// Request did not include the expected upload field
    MissingUpload { field: String },

    /// Sample at this interleaved index is NaN or infinite
    NonFiniteSample { index: usize },
}

impl ErrorCode for InputError {
    fn code(&self) -> i32 {
        match self {
            InputError::Decode { .. } => InputErrorCodes::DECODE,
            InputError::SampleRateMismatch { .. } => InputErrorCodes::SAMPLE_RATE_MISMATCH,
            InputError::ShapeMismatch { .. } => InputErrorCodes::SHAPE_MISMATCH,
            InputError::EmptyWaveform => InputErrorCodes::EMPTY_WAVEFORM,
            InputError::MissingUpload { .. } => InputErrorCodes::MISSING_UPLOAD,
            InputError::NonFiniteSample { .. } => InputErrorCodes::NON_FINITE_SAMPLE,
        }
    }

    fn message(&self) -> String {
        match self {
            InputError::Decode { reason } => format!("Invalid file: {}", reason),
            InputError::SampleRateMismatch { expected, actual } => {
                format!(
                    "Expected {} Hz sampling rate, got {} Hz",
                    expected, actual
                )
            }
            InputError::ShapeMismatch { channels } => {
                format!("Expected 1 or 3 channels, got {}", channels)
            }
            InputError::EmptyWaveform => "Waveform contains no samples".to_string(),
            InputError::MissingUpload { field } => {
                format!("Multipart field '{}' is required", field)
            }
            InputError::NonFiniteSample { index } => {
                format!("Waveform contains a non-finite sample at index {}", index)
            }
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InputError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for InputError {}

impl From<hound::Error> for InputError {
    fn from(err: hound::Error) -> Self {
        InputError::Decode {
            reason: err.to_string(),
        }
    }
}
