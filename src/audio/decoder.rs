// Decoder - uploaded WAV bytes to a Waveform
//
// Integer PCM is scaled into [-1, 1) by the full-scale value of its bit depth
// so that downstream standardization sees the same numbers regardless of the
// container's sample format.

use std::io::Cursor;

use crate::audio::Waveform;
use crate::error::InputError;

/// Decode an in-memory WAV container
///
/// # Errors
/// * `Decode` if the bytes are not a readable WAV file or use an
///   unsupported sample format
/// * `ShapeMismatch` / `EmptyWaveform` from `Waveform` construction
pub fn decode_wav(bytes: &[u8]) -> Result<Waveform, InputError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(InputError::Decode {
            reason: "container declares zero channels".to_string(),
        });
    }

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()?,
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            match spec.bits_per_sample {
                8 | 16 | 24 | 32 => reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 / full_scale))
                    .collect::<Result<Vec<f32>, _>>()?,
                bits => {
                    return Err(InputError::Decode {
                        reason: format!("unsupported bits_per_sample={}", bits),
                    })
                }
            }
        }
    };

    Waveform::from_interleaved(samples, spec.channels as usize, spec.sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::encode_wav;

    #[test]
    fn test_decode_float_roundtrip_preserves_layout() {
        let waveform =
            Waveform::from_interleaved(vec![0.5, -0.5, 0.25, 0.1, 0.2, 0.3], 3, 100).unwrap();
        let bytes = encode_wav(&waveform).unwrap();
        let decoded = decode_wav(&bytes).unwrap();
        assert_eq!(decoded, waveform);
    }

    #[test]
    fn test_decode_int16_scales_to_unit_range() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            writer.write_sample(i16::MIN).unwrap();
            writer.write_sample(0i16).unwrap();
            writer.write_sample(16384i16).unwrap();
            writer.finalize().unwrap();
        }

        let decoded = decode_wav(cursor.get_ref()).unwrap();
        assert_eq!(decoded.channels(), 1);
        assert_eq!(decoded.sample_rate(), 100);
        assert_eq!(decoded.interleaved(), &[-1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_decode_rejects_nan_samples() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for index in 0..6000 {
                let sample = if index == 10 { f32::NAN } else { 0.01 };
                writer.write_sample(sample).unwrap();
            }
            writer.finalize().unwrap();
        }

        let err = decode_wav(cursor.get_ref()).unwrap_err();
        assert_eq!(err, InputError::NonFiniteSample { index: 10 });
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let err = decode_wav(b"definitely not a wav file").unwrap_err();
        assert!(matches!(err, InputError::Decode { .. }));
    }

    #[test]
    fn test_decode_header_only_is_empty() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        hound::WavWriter::new(&mut cursor, spec)
            .unwrap()
            .finalize()
            .unwrap();

        let err = decode_wav(cursor.get_ref()).unwrap_err();
        assert_eq!(err, InputError::EmptyWaveform);
    }
}
