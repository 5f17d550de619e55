// VocalCoach Core - voice range analysis service
// Upload → canonical WAV → YIN pitch → voice type classification

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod startup;
pub mod status;

// Re-exports for convenience
pub use analysis::{classify, classify_with_hint, GenderHint, VoiceType};
pub use config::AppConfig;
pub use error::{AnalysisFailure, FailureKind};
pub use orchestrator::{AnalysisOutcome, AnalysisResult, RequestOrchestrator, UploadedAudio};
