//! Dialogue lines and LLM prompts for the wellness planner.

use super::model::Phase;

/// First thing the assistant says in every session.
pub const GREETING: &str = "👋 Hello, mama! I'm here to guide you to feel your best. \
Are you currently pregnant or in the postpartum phase?";

/// Shown when the phase reply names neither phase.
pub const PHASE_REPROMPT: &str =
    "Please type either 'pregnant' or 'postpartum' so I know what plan to build.";

/// Asked once the phase is known.
pub const NAME_QUESTION: &str = "Great! Let's get to know you better. What's your name?";

/// Shown before the plan request goes out.
pub const GENERATING_NOTICE: &str = "🪄 Generating your custom wellness planner...";

/// Shown in place of an encouragement the service failed to produce.
pub const ENCOURAGEMENT_FALLBACK: &str = "Thank you for sharing that with me. 💛";

/// Shown when the plan request fails; the next message retries it.
pub const PLAN_RETRY_NOTICE: &str = "I couldn't put your plan together just now. \
Send any message and I'll try again.";

/// Shown for input that arrives after the plan is done.
pub const SESSION_DONE_NOTICE: &str =
    "Your wellness plan is ready above. Type /restart to build a new one.";

/// Welcome line after the name is captured.
pub fn welcome(name: &str) -> String {
    format!("Nice to meet you, {name}! Let's continue.")
}

/// Prompt for a short encouragement after one answer.
pub fn encouragement_prompt(phase: Phase, name: &str, question: &str, answer: &str) -> String {
    format!(
        "You are a kind assistant supporting a {phase} woman named {name}.\n\
         She answered the question:\n\
         Q: {question}\nA: {answer}\n\
         Give a short, kind and encouraging sentence."
    )
}

/// Who the plan is written for, phrased for the format instructions.
fn plan_subject(phase: Phase) -> &'static str {
    match phase {
        Phase::Pregnancy => "a pregnant woman",
        Phase::Postpartum => "a woman in the postpartum phase",
    }
}

/// Phase-specific examples of gentle activities.
fn plan_activities(phase: Phase) -> &'static str {
    match phase {
        Phase::Pregnancy => {
            "pelvic stretches, hydration reminders, prenatal vitamins, mindful walking, \
             meditation, light chores, journaling, bonding time, and balanced meal suggestions"
        }
        Phase::Postpartum => {
            "gentle pelvic floor exercises, hydration reminders, postnatal vitamins, short \
             restorative walks, rest while the baby sleeps, meditation, journaling, bonding \
             time with the baby, asking for help, and nourishing meal suggestions"
        }
    }
}

/// Phase-specific safety assumption.
fn plan_safety_note(phase: Phase) -> &'static str {
    match phase {
        Phase::Pregnancy => {
            "Ensure all activities are safe, calming, and appropriate for a pregnant woman \
             (assume she is in the second trimester unless otherwise noted)."
        }
        Phase::Postpartum => {
            "Ensure all activities are safe, calming, and appropriate for postpartum \
             recovery (assume she is within the first three months after delivery unless \
             otherwise noted)."
        }
    }
}

/// Aggregate prompt for the 7-day plan.
///
/// `pairs` are (question, answer) in the order they were asked.
pub fn plan_prompt(phase: Phase, name: &str, pairs: &[(&str, &str)]) -> String {
    let mut prompt = format!("Create a 7-day wellness plan for a {phase} woman named {name}.\n\n");
    for (question, answer) in pairs {
        prompt.push_str(&format!("Q: {question}\nA: {answer}\n\n"));
    }
    prompt.push_str(&format!(
        "Create a weekly wellness planner for {subject}, covering all 7 days from Monday to \
         Sunday. For each day, organize the schedule into four parts: Morning, Afternoon, \
         Evening, and Night. Present this schedule in a clean table format, where each row \
         represents a day and columns show activities for each time slot. Include gentle and \
         supportive activities such as {activities}. {safety} After the table, add a short, \
         uplifting paragraph that describes how she might feel emotionally during the day — \
         supported, calm, and hopeful. Avoid headings, introductions, or extra explanations — \
         just return the table and the emotional narrative.",
        subject = plan_subject(phase),
        activities = plan_activities(phase),
        safety = plan_safety_note(phase),
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encouragement_prompt_carries_context() {
        let prompt = encouragement_prompt(
            Phase::Postpartum,
            "Sarah",
            "How is your energy level throughout the day?",
            "Pretty low",
        );
        assert!(prompt.contains("postpartum woman named Sarah"));
        assert!(prompt.contains("Q: How is your energy level throughout the day?"));
        assert!(prompt.contains("A: Pretty low"));
        assert!(prompt.ends_with("Give a short, kind and encouraging sentence."));
    }

    #[test]
    fn plan_prompt_lists_pairs_in_order() {
        let pairs = [("First?", "one"), ("Second?", "two"), ("Third?", "three")];
        let prompt = plan_prompt(Phase::Pregnancy, "Ana", &pairs);

        assert!(prompt.starts_with("Create a 7-day wellness plan for a pregnancy woman named Ana."));
        let first = prompt.find("Q: First?\nA: one").unwrap();
        let second = prompt.find("Q: Second?\nA: two").unwrap();
        let third = prompt.find("Q: Third?\nA: three").unwrap();
        assert!(first < second && second < third);
        // format instructions come after the answers
        assert!(prompt.find("Monday to Sunday").unwrap() > third);
    }

    #[test]
    fn plan_prompt_is_phase_specific() {
        let pregnancy = plan_prompt(Phase::Pregnancy, "Ana", &[]);
        let postpartum = plan_prompt(Phase::Postpartum, "Ana", &[]);
        assert!(pregnancy.contains("second trimester"));
        assert!(!postpartum.contains("second trimester"));
        assert!(postpartum.contains("postpartum recovery"));
        for prompt in [&pregnancy, &postpartum] {
            assert!(prompt.contains("Morning, Afternoon, Evening, and Night"));
            assert!(prompt.contains("table"));
        }
    }

    #[test]
    fn welcome_uses_name() {
        assert_eq!(welcome("You"), "Nice to meet you, You! Let's continue.");
    }
}
