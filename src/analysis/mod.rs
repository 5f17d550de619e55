// Analysis module - pitch extraction and voice classification
//
// Pipeline: PitchExtractor (trim → YIN → median) → classifier (band tables)
//
// Both stages are synchronous and CPU-bound; they run on whichever worker
// thread owns the request.

pub mod classifier;
pub mod pitch;
pub mod voice_type;

pub use classifier::{classify, classify_with_hint, GenderHint};
pub use pitch::{PitchAnalysis, PitchEstimator, PitchExtractor, YinEstimator};
pub use voice_type::VoiceType;
