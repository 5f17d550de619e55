// Classifier - threshold rule-based voice type classification
//
// This module maps a representative fundamental frequency to a VoiceType.
// An optional gender hint selects one of three band tables:
//
// Female: Soprano / Mezzo-Soprano / Contralto
// Male: Counter-Tenor / Tenor / Baritone / Bass
// Unspecified: Soprano / Tenor / Baritone / Bass
//
// Each table is an ordered list of (lower bound, result) pairs evaluated
// high-to-low. The first band whose lower bound the pitch reaches wins, and
// every table ends with a 0 Hz floor so it covers [0, inf) without gaps.

use super::voice_type::VoiceType;

/// Gender hint supplied alongside the recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenderHint {
    Female,
    Male,
    Unspecified,
}

impl GenderHint {
    /// Parse a free-form hint
    ///
    /// Case-insensitive; accepts English and Turkish spellings. Anything
    /// unrecognised is treated as no hint at all.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return GenderHint::Unspecified;
        };

        match raw.trim().to_lowercase().as_str() {
            "female" | "kadın" => GenderHint::Female,
            "male" | "erkek" => GenderHint::Male,
            _ => GenderHint::Unspecified,
        }
    }
}

/// One row of a classification table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    /// Inclusive lower bound in Hz
    pub floor_hz: f64,
    pub voice: VoiceType,
}

const fn band(floor_hz: f64, voice: VoiceType) -> Band {
    Band { floor_hz, voice }
}

const FEMALE_BANDS: [Band; 3] = [
    band(260.0, VoiceType::Soprano),
    band(210.0, VoiceType::MezzoSoprano),
    band(0.0, VoiceType::Contralto),
];

const MALE_BANDS: [Band; 4] = [
    band(260.0, VoiceType::CounterTenor),
    band(165.0, VoiceType::Tenor),
    band(110.0, VoiceType::Baritone),
    band(0.0, VoiceType::Bass),
];

// Without a hint the mezzo/contralto and counter-tenor bands cannot be told
// apart, so this table is deliberately coarser.
const UNSPECIFIED_BANDS: [Band; 4] = [
    band(255.0, VoiceType::Soprano),
    band(175.0, VoiceType::Tenor),
    band(110.0, VoiceType::Baritone),
    band(0.0, VoiceType::Bass),
];

/// Ordered band table for a gender hint, highest floor first
pub fn bands(hint: GenderHint) -> &'static [Band] {
    match hint {
        GenderHint::Female => &FEMALE_BANDS,
        GenderHint::Male => &MALE_BANDS,
        GenderHint::Unspecified => &UNSPECIFIED_BANDS,
    }
}

/// Classify a pitch using the table selected by `hint`
///
/// Pure and total: a finite, non-negative pitch always lands in exactly one
/// band. Non-finite or negative input returns `VoiceType::Unknown`.
pub fn classify(pitch_hz: f64, hint: GenderHint) -> VoiceType {
    if !pitch_hz.is_finite() || pitch_hz < 0.0 {
        return VoiceType::Unknown;
    }

    bands(hint)
        .iter()
        .find(|band| pitch_hz >= band.floor_hz)
        .map(|band| band.voice)
        .unwrap_or(VoiceType::Unknown)
}

/// Classify with a raw, unparsed gender hint
pub fn classify_with_hint(pitch_hz: f64, gender: Option<&str>) -> VoiceType {
    classify(pitch_hz, GenderHint::parse(gender))
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
