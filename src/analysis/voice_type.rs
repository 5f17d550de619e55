use serde::{Deserialize, Serialize};
use std::fmt;

/// VoiceType is the classification vocabulary for a singing voice
///
/// Female range: Soprano, MezzoSoprano, Contralto
/// Male range: CounterTenor, Tenor, Baritone, Bass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoiceType {
    #[serde(rename = "Soprano")]
    Soprano,
    #[serde(rename = "Mezzo-Soprano")]
    MezzoSoprano,
    #[serde(rename = "Contralto")]
    Contralto,
    #[serde(rename = "Counter-Tenor")]
    CounterTenor,
    #[serde(rename = "Tenor")]
    Tenor,
    #[serde(rename = "Baritone")]
    Baritone,
    #[serde(rename = "Bass")]
    Bass,
    /// Pitch outside the classifiable domain
    #[serde(rename = "Unknown")]
    Unknown,
}

impl VoiceType {
    pub const ALL: [VoiceType; 8] = [
        VoiceType::Soprano,
        VoiceType::MezzoSoprano,
        VoiceType::Contralto,
        VoiceType::CounterTenor,
        VoiceType::Tenor,
        VoiceType::Baritone,
        VoiceType::Bass,
        VoiceType::Unknown,
    ];

    /// Display label, identical to the serialized form
    pub fn label(&self) -> &'static str {
        match self {
            VoiceType::Soprano => "Soprano",
            VoiceType::MezzoSoprano => "Mezzo-Soprano",
            VoiceType::Contralto => "Contralto",
            VoiceType::CounterTenor => "Counter-Tenor",
            VoiceType::Tenor => "Tenor",
            VoiceType::Baritone => "Baritone",
            VoiceType::Bass => "Bass",
            VoiceType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for VoiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_form_matches_label() {
        for voice in VoiceType::ALL {
            let json = serde_json::to_string(&voice).unwrap();
            assert_eq!(json, format!("\"{}\"", voice.label()));
        }
    }
}
