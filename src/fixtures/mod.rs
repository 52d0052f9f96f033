//! Fixture utilities for tests and the CLI harness.
//!
//! Provides deterministic synthetic recordings at the reference rate, a WAV
//! encoder for feeding them through the decoder, and a scripted predictor
//! that stands in for a real model artifact.

use std::f32::consts::PI;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::audio::Waveform;
use crate::error::ModelError;
use crate::model::{Predictor, RawPrediction};
use crate::preprocess::{Spectrogram, REFERENCE_SAMPLE_RATE};

/// Background noise amplitude for synthetic recordings
const NOISE_AMPLITUDE: f32 = 0.01;

/// Arrival description for a synthetic event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    /// P-wave onset (seconds from start)
    pub p_arrival_secs: f32,
    /// S-wave onset (seconds from start)
    pub s_arrival_secs: f32,
    /// Peak S-wave amplitude; the P phase is a third of it
    pub amplitude: f32,
}

impl Default for EventSpec {
    fn default() -> Self {
        Self {
            p_arrival_secs: 12.0,
            s_arrival_secs: 21.0,
            amplitude: 0.6,
        }
    }
}

/// Generate a seeded recording at the reference rate
///
/// `frames` and `channels` are clamped to at least one.
///
/// Every channel gets independent noise from the same seeded stream. When an
/// event is given, a decaying 8 Hz P phase and a stronger decaying 3 Hz S
/// phase are added to all channels.
pub fn synthetic_recording(
    frames: usize,
    channels: usize,
    seed: u64,
    event: Option<EventSpec>,
) -> Waveform {
    let frames = frames.max(1);
    let channels = channels.max(1);
    let sr = REFERENCE_SAMPLE_RATE as f32;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut samples = Vec::with_capacity(frames * channels);

    for frame in 0..frames {
        let t = frame as f32 / sr;
        let phase = event.map(|spec| event_sample(&spec, t)).unwrap_or(0.0);
        for _ in 0..channels {
            let noise = rng.gen_range(-NOISE_AMPLITUDE..NOISE_AMPLITUDE);
            samples.push(phase + noise);
        }
    }

    Waveform::from_interleaved(samples, channels, REFERENCE_SAMPLE_RATE)
        .expect("non-empty whole-frame buffer")
}

fn event_sample(spec: &EventSpec, t: f32) -> f32 {
    let burst = |onset: f32, freq: f32, amplitude: f32, decay: f32| {
        if t < onset {
            return 0.0;
        }
        let dt = t - onset;
        amplitude * (-dt / decay).exp() * (2.0 * PI * freq * dt).sin()
    };

    burst(spec.p_arrival_secs, 8.0, spec.amplitude / 3.0, 2.0)
        + burst(spec.s_arrival_secs, 3.0, spec.amplitude, 4.0)
}

/// All-zero recording at the reference rate
pub fn silence(frames: usize, channels: usize) -> Waveform {
    let frames = frames.max(1);
    let channels = channels.max(1);
    Waveform::from_interleaved(vec![0.0; frames * channels], channels, REFERENCE_SAMPLE_RATE)
        .expect("non-empty whole-frame buffer")
}

/// Encode a waveform as a 32-bit float WAV container
pub fn encode_wav(waveform: &Waveform) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: waveform.channels() as u16,
        sample_rate: waveform.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in waveform.interleaved() {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Predictor returning a fixed verdict, counting how often it ran
#[derive(Debug, Clone)]
pub struct ScriptedPredictor {
    output: RawPrediction,
    calls: Arc<AtomicUsize>,
}

impl ScriptedPredictor {
    pub fn new(output: RawPrediction) -> Self {
        Self {
            output,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of completed `predict` calls
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Predictor for ScriptedPredictor {
    fn describe(&self) -> String {
        format!(
            "scripted(p_event={}, p={}, s={})",
            self.output.event_probability, self.output.p_raw, self.output.s_raw
        )
    }

    fn predict(&mut self, spectrogram: &Spectrogram) -> Result<RawPrediction, ModelError> {
        if spectrogram.shape() != crate::preprocess::INPUT_SHAPE {
            return Err(ModelError::Inference {
                reason: format!("unexpected input shape {:?}", spectrogram.shape()),
            });
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_recording_is_seeded() {
        let a = synthetic_recording(500, 3, 99, Some(EventSpec::default()));
        let b = synthetic_recording(500, 3, 99, Some(EventSpec::default()));
        let c = synthetic_recording(500, 3, 100, Some(EventSpec::default()));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.channels(), 3);
        assert_eq!(a.frames(), 500);
    }

    #[test]
    fn test_event_raises_energy_after_s_arrival() {
        let spec = EventSpec::default();
        let waveform = synthetic_recording(6000, 1, 1, Some(spec));
        let samples = waveform.interleaved();
        let energy = |from: usize, to: usize| -> f32 {
            samples[from..to].iter().map(|x| x * x).sum::<f32>() / (to - from) as f32
        };
        let s_start = (spec.s_arrival_secs * 100.0) as usize;
        assert!(energy(s_start, s_start + 200) > 100.0 * energy(0, 200));
    }

    #[test]
    fn test_silence_shape() {
        let waveform = silence(10, 3);
        assert_eq!(waveform.frames(), 10);
        assert!(waveform.interleaved().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_scripted_predictor_counts_calls() {
        let mut predictor = ScriptedPredictor::new(RawPrediction::new(0.9, 0.2, 0.35));
        let counter = predictor.call_counter();
        let spec = crate::preprocess::preprocess(&silence(6000, 1)).unwrap();
        let output = predictor.predict(&spec).unwrap();
        assert_eq!(output, RawPrediction::new(0.9, 0.2, 0.35));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
