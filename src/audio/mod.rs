//! Recording ingestion: container decoding and the in-memory waveform type.

pub mod decoder;
pub mod waveform;

pub use decoder::decode_wav;
pub use waveform::Waveform;
