// STFT module - short-time magnitude spectrum
//
// Frames follow the zero-boundary convention: the signal is extended with
// half a window of zeros on both ends, then right-padded so the last hop
// lands exactly on the end of the buffer. Each frame is scaled by the inverse
// window sum, so a full-scale sinusoid at a bin centre has magnitude ~0.5.

use ndarray::Array2;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// STFT processor with a planned FFT and a pre-computed window
pub struct StftProcessor {
    fft: Arc<dyn Fft<f64>>,
    window_size: usize,
    hop_size: usize,
    fft_size: usize,
    window: Vec<f64>,
    window_sum: f64,
}

impl StftProcessor {
    /// Create a new STFT processor
    ///
    /// # Arguments
    /// * `window_size` - Samples per frame
    /// * `hop_size` - Samples between frame starts (window_size - overlap)
    /// * `fft_size` - Transform length, at least `window_size`
    pub fn new(window_size: usize, hop_size: usize, fft_size: usize) -> Self {
        assert!(hop_size > 0 && hop_size <= window_size);
        assert!(fft_size >= window_size);

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        // Periodic Hann (divides by N, not N-1)
        let window: Vec<f64> = (0..window_size)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / window_size as f64).cos())
            })
            .collect();
        let window_sum = window.iter().sum();

        Self {
            fft,
            window_size,
            hop_size,
            fft_size,
            window,
            window_sum,
        }
    }

    /// Number of one-sided frequency bins (fft_size / 2 + 1)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Number of frames produced for a signal of `samples` length
    pub fn frame_count(&self, samples: usize) -> usize {
        self.padded_len(samples).saturating_sub(self.window_size) / self.hop_size + 1
    }

    /// Length of the zero-extended buffer the frames are cut from
    fn padded_len(&self, samples: usize) -> usize {
        let extended = samples + 2 * (self.window_size / 2);
        let remainder = extended.saturating_sub(self.window_size) % self.hop_size;
        let tail = if remainder == 0 {
            0
        } else {
            self.hop_size - remainder
        };
        extended + tail
    }

    /// Compute the magnitude spectrogram as a `[bins, frames]` map
    pub fn magnitude(&self, signal: &[f64]) -> Array2<f64> {
        let half = self.window_size / 2;
        let mut padded = vec![0.0f64; self.padded_len(signal.len())];
        padded[half..half + signal.len()].copy_from_slice(signal);

        let num_frames = self.frame_count(signal.len());
        let num_bins = self.num_bins();
        let mut spectrogram = Array2::<f64>::zeros((num_bins, num_frames));

        let mut buffer = vec![Complex::new(0.0, 0.0); self.fft_size];
        let mut scratch = vec![Complex::new(0.0, 0.0); self.fft.get_inplace_scratch_len()];
        let scale = 1.0 / self.window_sum;

        for frame_idx in 0..num_frames {
            let start = frame_idx * self.hop_size;
            let frame = &padded[start..start + self.window_size];

            for (slot, (&sample, &weight)) in buffer.iter_mut().zip(frame.iter().zip(&self.window))
            {
                *slot = Complex::new(sample * weight, 0.0);
            }
            for slot in buffer[self.window_size..].iter_mut() {
                *slot = Complex::new(0.0, 0.0);
            }

            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            for (bin, value) in buffer[..num_bins].iter().enumerate() {
                spectrogram[[bin, frame_idx]] = value.norm() * scale;
            }
        }

        spectrogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_matches_boundary_padding() {
        let stft = StftProcessor::new(128, 64, 128);
        assert_eq!(stft.frame_count(0), 1);
        assert_eq!(stft.frame_count(1), 2);
        assert_eq!(stft.frame_count(64), 2);
        assert_eq!(stft.frame_count(65), 3);
        assert_eq!(stft.frame_count(6000), 95);
        assert_eq!(stft.frame_count(6016), 95);
        assert_eq!(stft.frame_count(6017), 96);
    }

    #[test]
    fn test_output_dimensions() {
        let stft = StftProcessor::new(128, 64, 128);
        let spec = stft.magnitude(&vec![0.0; 1000]);
        assert_eq!(spec.dim(), (65, stft.frame_count(1000)));
        assert!(spec.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_sine_peak_bin() {
        // 10 Hz at 100 Hz sampling, bin width 100/128 Hz
        let sr = 100.0;
        let freq = 10.0;
        let signal: Vec<f64> = (0..2000)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / sr).sin())
            .collect();

        let stft = StftProcessor::new(128, 64, 128);
        let spec = stft.magnitude(&signal);
        let mid = spec.dim().1 / 2;

        let peak_bin = (0..spec.dim().0)
            .max_by(|&a, &b| spec[[a, mid]].partial_cmp(&spec[[b, mid]]).unwrap())
            .unwrap();
        let expected_bin = (freq * 128.0 / sr).round() as usize;
        assert!(
            (peak_bin as i64 - expected_bin as i64).abs() <= 1,
            "Peak at bin {} should be near {}",
            peak_bin,
            expected_bin
        );
    }

    #[test]
    fn test_dc_scaling() {
        // A constant 1.0 signal has DC magnitude sum(w)/sum(w) = 1 in interior frames
        let stft = StftProcessor::new(128, 64, 128);
        let spec = stft.magnitude(&vec![1.0; 1024]);
        let mid = spec.dim().1 / 2;
        assert!((spec[[0, mid]] - 1.0).abs() < 1e-9);
    }
}
