//! Waveform-to-tensor preprocessing.
//!
//! ```text
//! Waveform (1 or 3 channels)
//!     │  replicate mono → 3 channels
//!     ▼
//! standardize ─▶ STFT magnitude ─▶ min-max ─▶ stack ─▶ pad/truncate to 95 ─▶ batch
//!                (128 / hop 64)     per channel          columns
//! ```
//!
//! The output always has shape `(1, 65, 95, 3)`, whatever the recording
//! length. Sample-rate validation happens before this stage; the transform
//! assumes the 100 Hz reference rate.

pub mod normalize;
pub mod stft;

use ndarray::{s, Array4, ArrayView2, ArrayView4};
use once_cell::sync::Lazy;

use crate::audio::Waveform;
use crate::error::InputError;

pub use normalize::EPSILON;
pub use stft::StftProcessor;

/// Sample rate every recording must be captured at (Hz)
pub const REFERENCE_SAMPLE_RATE: u32 = 100;

/// STFT window length in samples
pub const WINDOW_SIZE: usize = 128;

/// Window advance in samples (128-sample window, 64-sample overlap)
pub const HOP_SIZE: usize = 64;

/// Transform length
pub const FFT_SIZE: usize = 128;

/// One-sided frequency bins per frame
pub const FREQUENCY_BINS: usize = FFT_SIZE / 2 + 1;

/// Time-axis width the predictor was trained on
pub const EXPECTED_WIDTH: usize = 95;

/// Channels the predictor consumes
pub const MODEL_CHANNELS: usize = 3;

/// Input tensor shape: batch, frequency, time, channel
pub const INPUT_SHAPE: [usize; 4] = [1, FREQUENCY_BINS, EXPECTED_WIDTH, MODEL_CHANNELS];

static DEFAULT_PREPROCESSOR: Lazy<Preprocessor> = Lazy::new(Preprocessor::new);

/// Preprocess a waveform with the shared default preprocessor
pub fn preprocess(waveform: &Waveform) -> Result<Spectrogram, InputError> {
    DEFAULT_PREPROCESSOR.preprocess(waveform)
}

/// Fixed-shape, normalized spectrogram batch ready for inference
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    tensor: Array4<f32>,
    /// Frames the transform produced before padding or truncation
    source_width: usize,
}

impl Spectrogram {
    pub fn shape(&self) -> [usize; 4] {
        let (b, f, t, c) = self.tensor.dim();
        [b, f, t, c]
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.tensor.view()
    }

    /// Frames produced by the transform before width conformance
    pub fn source_width(&self) -> usize {
        self.source_width
    }

    /// Number of trailing columns that are zero padding
    pub fn padded_columns(&self) -> usize {
        EXPECTED_WIDTH.saturating_sub(self.source_width)
    }

    /// `[frequency, time]` map of a single channel
    pub fn channel(&self, index: usize) -> ArrayView2<'_, f32> {
        self.tensor.slice(s![0, .., .., index])
    }

    /// Row-major copy of the tensor data
    pub fn to_vec(&self) -> Vec<f32> {
        self.tensor.iter().copied().collect()
    }
}

/// Waveform-to-spectrogram pipeline
pub struct Preprocessor {
    stft: StftProcessor,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self {
            stft: StftProcessor::new(WINDOW_SIZE, HOP_SIZE, FFT_SIZE),
        }
    }

    /// Turn a decoded recording into the predictor's input tensor
    ///
    /// # Errors
    /// `ShapeMismatch` if the recording has a channel count other than 1 or 3.
    pub fn preprocess(&self, waveform: &Waveform) -> Result<Spectrogram, InputError> {
        let channels = expand_channels(waveform)?;
        let source_width = self.stft.frame_count(waveform.frames());
        let kept = source_width.min(EXPECTED_WIDTH);

        let mut tensor = Array4::<f32>::zeros((1, FREQUENCY_BINS, EXPECTED_WIDTH, MODEL_CHANNELS));

        for (index, mut channel) in channels.into_iter().enumerate() {
            normalize::standardize(&mut channel);
            let mut magnitude = self.stft.magnitude(&channel);
            normalize::min_max(&mut magnitude);

            let mut target = tensor.slice_mut(s![0, .., ..kept, index]);
            target.assign(&magnitude.slice(s![.., ..kept]).mapv(|v| v as f32));
        }

        log::debug!(
            "[Preprocess] {} frames x {} channels -> {} columns ({} padded)",
            waveform.frames(),
            waveform.channels(),
            kept,
            EXPECTED_WIDTH - kept
        );

        Ok(Spectrogram {
            tensor,
            source_width,
        })
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Split the waveform into exactly three f64 channel buffers
fn expand_channels(waveform: &Waveform) -> Result<Vec<Vec<f64>>, InputError> {
    let to_f64 = |index: usize| -> Vec<f64> {
        waveform
            .interleaved()
            .iter()
            .skip(index)
            .step_by(waveform.channels())
            .map(|&x| x as f64)
            .collect()
    };

    match waveform.channels() {
        1 => {
            let mono = to_f64(0);
            Ok(vec![mono.clone(), mono.clone(), mono])
        }
        3 => Ok((0..3).map(to_f64).collect()),
        channels => Err(InputError::ShapeMismatch { channels }),
    }
}
