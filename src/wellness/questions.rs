//! The fixed question script for each phase.

use super::model::Phase;

/// Number of scripted questions per phase.
pub const QUESTION_COUNT: usize = 6;

const PREGNANCY: [&str; QUESTION_COUNT] = [
    "How many weeks along are you currently?",
    "How are you feeling physically and emotionally these days?",
    "Are there any pregnancy symptoms or conditions you’re dealing with (e.g., nausea, back pain, gestational diabetes)?",
    "How would you describe your sleep quality and routine lately?",
    "Do you have any preferred ways to stay active, like yoga, walking, or dancing?",
    "Would you like help managing stress or mood changes during pregnancy?",
];

const POSTPARTUM: [&str; QUESTION_COUNT] = [
    "How many weeks postpartum are you?",
    "How is your energy level throughout the day?",
    "How are you feeling mentally and emotionally after delivery?",
    "Are you experiencing any pain, sleep disruptions, or healing-related concerns?",
    "Would you like to focus more on physical recovery or mental wellness activities right now?",
    "Do you have a support system or need ideas for bonding and self-care while caring for the baby?",
];

/// All questions for a phase, in the order they are asked.
pub fn questions(phase: Phase) -> &'static [&'static str; QUESTION_COUNT] {
    match phase {
        Phase::Pregnancy => &PREGNANCY,
        Phase::Postpartum => &POSTPARTUM,
    }
}

/// The question at `index`, if the script has one.
pub fn question(phase: Phase, index: usize) -> Option<&'static str> {
    questions(phase).get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_phase_has_its_own_opening() {
        assert!(question(Phase::Pregnancy, 0).unwrap().contains("weeks along"));
        assert!(question(Phase::Postpartum, 0).unwrap().contains("weeks postpartum"));
    }

    #[test]
    fn out_of_range_is_none() {
        assert!(question(Phase::Pregnancy, QUESTION_COUNT).is_none());
        assert!(question(Phase::Postpartum, QUESTION_COUNT - 1).is_some());
    }

    #[test]
    fn questions_are_unique() {
        for phase in [Phase::Pregnancy, Phase::Postpartum] {
            let qs = questions(phase);
            for (i, q) in qs.iter().enumerate() {
                assert!(!qs[i + 1..].contains(q), "duplicate question in {phase}: {q}");
            }
        }
    }
}
