//! Fixed bot messages shown in the transcript.

pub const WELCOME: &str = "Hi! I'm here to help you fill out your survey. I'll ask you a few questions one at a time to gather the information needed. Let's get started!";

pub const PREPARING_QUESTIONS: &str = "Let me think of a few questions for you...";

pub const PROCESSING_ANSWERS: &str = "Let me process your answers and see what else I need to know...";

pub const SURVEY_COMPLETE: &str = "Perfect! I have all the information I need to complete your survey. Let me show you the summary.";

pub const MORE_QUESTIONS: &str = "Thanks for those answers! I have a few more questions to make sure I capture everything accurately.";

pub const RETRYING: &str = "Hmm, that didn't come out right. Let me try that again...";

/// Notice for one contradiction found during reconciliation.
pub fn contradiction(description: &str) -> String {
    format!("I noticed something that doesn't quite match an earlier answer: {}", description)
}
