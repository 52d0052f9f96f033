// Quake Detector Core - Seismic Event Inference Service
// Waveform decoding, STFT preprocessing and a once-loaded predictor behind HTTP

// Module declarations
pub mod audio;
pub mod config;
pub mod context;
pub mod error;
pub mod fixtures;
pub mod http;
pub mod model;
pub mod preprocess;
pub mod response;

// Re-exports for convenience
pub use audio::{decode_wav, Waveform};
pub use config::AppConfig;
pub use context::InferenceContext;
pub use error::{ErrorCode, InputError, ModelError, ServiceError};
pub use model::{Predictor, PredictorHandle, RawPrediction};
pub use preprocess::{preprocess, Preprocessor, Spectrogram};
pub use response::PredictionResult;

/// Install the process-wide tracing subscriber
///
/// `log` records from the library are forwarded through `tracing`. The
/// filter comes from `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = fmt().with_env_filter(filter).with_target(false).try_init() {
        tracing::debug!("Logging already initialized: {}", err);
    }
}
