// Waveform - decoded multi-channel recording

use crate::error::InputError;

/// A complete decoded recording
///
/// Samples are stored interleaved (frame-major), exactly as the container
/// delivered them. Construction guarantees at least one channel, a whole
/// number of frames, at least one frame, and only finite samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

impl Waveform {
    /// Build a waveform from interleaved samples
    ///
    /// # Errors
    /// * `ShapeMismatch` if `channels` is zero or the sample count is not a
    ///   multiple of `channels`
    /// * `EmptyWaveform` if there are no samples
    /// * `NonFiniteSample` if any sample is NaN or infinite
    pub fn from_interleaved(
        samples: Vec<f32>,
        channels: usize,
        sample_rate: u32,
    ) -> Result<Self, InputError> {
        if channels == 0 || samples.len() % channels != 0 {
            return Err(InputError::ShapeMismatch { channels });
        }
        if samples.is_empty() {
            return Err(InputError::EmptyWaveform);
        }
        if let Some(index) = samples.iter().position(|sample| !sample.is_finite()) {
            return Err(InputError::NonFiniteSample { index });
        }

        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Build a single-channel waveform
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, InputError> {
        Self::from_interleaved(samples, 1, sample_rate)
    }

    /// Build a waveform from separate, equally long channel buffers
    pub fn from_channels(channels: &[Vec<f32>], sample_rate: u32) -> Result<Self, InputError> {
        let frames = channels.first().map(Vec::len).unwrap_or(0);
        if channels.iter().any(|channel| channel.len() != frames) {
            return Err(InputError::ShapeMismatch {
                channels: channels.len(),
            });
        }

        let mut samples = Vec::with_capacity(frames * channels.len());
        for frame in 0..frames {
            samples.extend(channels.iter().map(|channel| channel[frame]));
        }
        Self::from_interleaved(samples, channels.len(), sample_rate)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples per channel
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn interleaved(&self) -> &[f32] {
        &self.samples
    }

    /// Copy one channel out of the interleaved buffer
    ///
    /// Returns `None` if `index` is out of range.
    pub fn channel(&self, index: usize) -> Option<Vec<f32>> {
        if index >= self.channels {
            return None;
        }
        Some(
            self.samples
                .iter()
                .skip(index)
                .step_by(self.channels)
                .copied()
                .collect(),
        )
    }
}
