// Audio module - media plumbing around the analysis core
//
// converter: arbitrary upload → canonical WAV (external tool)
// decoder: canonical WAV → mono f32 waveform
// synth: deterministic reference signals

pub mod converter;
pub mod decoder;
pub mod synth;

pub use converter::{FfmpegConverter, FormatConverter, NormalizationStage, PassthroughConverter};
pub use decoder::{HoundDecoder, Waveform, WaveformDecoder};
