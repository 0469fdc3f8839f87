//! Wellness dialogue data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The wellness context the user chooses at the start of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Pregnancy,
    Postpartum,
}

impl Phase {
    /// Detect a phase in free text.
    ///
    /// Case-insensitive substring match; "pregnant" is checked before
    /// "postpartum", so input mentioning both selects pregnancy.
    pub fn detect(input: &str) -> Option<Phase> {
        let lowered = input.to_lowercase();
        if lowered.contains("pregnant") {
            Some(Phase::Pregnancy)
        } else if lowered.contains("postpartum") {
            Some(Phase::Postpartum)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pregnancy => write!(f, "pregnancy"),
            Self::Postpartum => write!(f, "postpartum"),
        }
    }
}

/// Who said a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One line of the conversation, in the order it was shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// The 7-day plan produced once all questions are answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPlan {
    pub text: String,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedPlan {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_pregnant_case_insensitive() {
        assert_eq!(Phase::detect("I am pregnant"), Some(Phase::Pregnancy));
        assert_eq!(Phase::detect("PREGNANT!"), Some(Phase::Pregnancy));
        assert_eq!(Phase::detect("Postpartum, 3 weeks"), Some(Phase::Postpartum));
    }

    #[test]
    fn detect_prefers_pregnant_when_both_appear() {
        assert_eq!(
            Phase::detect("not pregnant anymore, postpartum now"),
            Some(Phase::Pregnancy)
        );
    }

    #[test]
    fn detect_rejects_other_input() {
        for input in ["hello", "", "expecting a baby", "post partum", "pregnancy"] {
            assert_eq!(Phase::detect(input), None, "{input:?} should not match");
        }
    }

    #[test]
    fn display_matches_serde() {
        for phase in [Phase::Pregnancy, Phase::Postpartum] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(format!("\"{phase}\""), json);
        }
    }
}
