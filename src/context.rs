// InferenceContext: Dependency Injection Container
// Holds the once-loaded predictor and runs the per-request pipeline

use std::sync::Arc;

use log::{debug, info};

use crate::audio::{decode_wav, Waveform};
use crate::config::AppConfig;
use crate::error::{InputError, ServiceError};
use crate::model::{default_registry, PredictorHandle};
use crate::preprocess::{Preprocessor, REFERENCE_SAMPLE_RATE};
use crate::response::{self, PredictionResult};

/// Dependency injection container for the inference pipeline
///
/// The predictor handle is built once and never replaced. Cloning the context
/// is cheap and shares the same handle, so it can be moved into blocking
/// tasks. Preprocessing runs outside the predictor lock, so concurrent
/// requests only serialize on the forward pass itself.
#[derive(Clone)]
pub struct InferenceContext {
    predictor: Arc<PredictorHandle>,
    preprocessor: Arc<Preprocessor>,
}

impl InferenceContext {
    pub fn new(predictor: PredictorHandle) -> Self {
        Self {
            predictor: Arc::new(predictor),
            preprocessor: Arc::new(Preprocessor::new()),
        }
    }

    /// Load the predictor named by the configuration
    ///
    /// A failed load leaves the context serving `ModelUnavailable` for its
    /// whole lifetime; it does not abort startup.
    pub fn from_config(config: &AppConfig) -> Self {
        info!("[Context] Loading model from {}", config.model.dir.display());
        Self::new(PredictorHandle::load(&config.model.dir, default_registry()))
    }

    pub fn predictor(&self) -> &PredictorHandle {
        &self.predictor
    }

    /// Run the pipeline on an already decoded recording
    pub fn predict_waveform(&self, waveform: &Waveform) -> Result<PredictionResult, ServiceError> {
        self.predictor.ensure_ready()?;
        check_sample_rate(waveform)?;

        let spectrogram = self.preprocessor.preprocess(waveform)?;
        let raw = self.predictor.predict(&spectrogram)?;
        let result = response::build(raw);

        debug!(
            "[Context] {} frames x {} channels -> p_event={} detected={}",
            waveform.frames(),
            waveform.channels(),
            result.event_probability,
            result.event_detected
        );
        Ok(result)
    }

    /// Decode an uploaded container and run the pipeline
    pub fn predict_bytes(&self, bytes: &[u8]) -> Result<PredictionResult, ServiceError> {
        let waveform = decode_wav(bytes)?;
        self.predict_waveform(&waveform)
    }

    /// Run [`predict_bytes`](Self::predict_bytes) on the blocking pool
    ///
    /// Decoding, the transform and the forward pass are CPU-bound and must
    /// not run on the async dispatcher threads.
    pub async fn predict_upload(&self, bytes: Vec<u8>) -> Result<PredictionResult, ServiceError> {
        let context = self.clone();
        tokio::task::spawn_blocking(move || context.predict_bytes(&bytes))
            .await
            .map_err(|err| ServiceError::TaskFailed {
                reason: err.to_string(),
            })?
    }
}

/// Reject recordings not captured at the reference rate
pub fn check_sample_rate(waveform: &Waveform) -> Result<(), InputError> {
    if waveform.sample_rate() != REFERENCE_SAMPLE_RATE {
        return Err(InputError::SampleRateMismatch {
            expected: REFERENCE_SAMPLE_RATE,
            actual: waveform.sample_rate(),
        });
    }
    Ok(())
}
