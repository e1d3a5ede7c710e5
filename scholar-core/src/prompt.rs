//! Prompt composition for the completion API
//!
//! Layout: persona, optional subject guidance, optional prior turns, then the
//! new question followed by an `Assistant:` cue.

use crate::classifier::Subject;

pub const SYSTEM_PROMPT: &str = "You are a helpful AI study assistant. Your role is to:
- Provide clear, accurate, and educational responses
- Break down complex topics into understandable explanations
- Offer examples when helpful
- Encourage learning and critical thinking
- Be patient and supportive

Please provide helpful and educational responses to student questions.";

/// Extra instructions appended for a detected subject.
pub fn subject_guidance(subject: Subject) -> &'static str {
    match subject {
        Subject::Mathematics => "Focus on step-by-step solutions, show your work clearly, and explain mathematical concepts with examples.",
        Subject::Science => "Provide scientific explanations with examples from real life, include relevant facts and encourage further exploration.",
        Subject::History => "Provide historical context, dates, and explain cause-and-effect relationships. Include relevant historical figures and events.",
        Subject::Geography => "Include specific locations, geographical features, and relate to maps and spatial understanding.",
        Subject::Literature => "Discuss literary techniques, themes, and provide examples from well-known works when relevant.",
        Subject::ComputerScience => "Provide clear code examples when relevant, explain concepts step-by-step, and relate to practical applications.",
        Subject::LanguageArts => "Focus on clear explanations of language rules, provide examples, and help with writing improvement.",
        Subject::SocialStudies => "Explain social concepts, governmental processes, and relate to current events when appropriate.",
    }
}

/// Build the full prompt for `question`.
///
/// `history` yields prior `(question, answer)` pairs, oldest first.
pub fn compose_prompt<'a, I>(question: &str, history: I, subject: Option<Subject>) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut prompt = String::from(SYSTEM_PROMPT);

    if let Some(subject) = subject {
        let guidance = subject_guidance(subject);
        if !guidance.is_empty() {
            prompt.push_str(&format!(
                "\n\nSubject-specific guidance for {}: {}",
                subject.label(),
                guidance
            ));
        }
    }

    let mut turns = history.into_iter().peekable();
    if turns.peek().is_some() {
        prompt.push_str("\n\nPrevious conversation context:\n");
        for (asked, answered) in turns {
            prompt.push_str(&format!("Student: {}\nAssistant: {}\n\n", asked, answered));
        }
    }

    prompt.push_str(&format!("\n\nStudent: {}\nAssistant:", question));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_subject_or_history() {
        let prompt = compose_prompt("Hello there", std::iter::empty(), None);
        assert_eq!(
            prompt,
            format!("{}\n\nStudent: Hello there\nAssistant:", SYSTEM_PROMPT)
        );
    }

    #[test]
    fn test_prompt_includes_subject_guidance() {
        let prompt = compose_prompt("Explain photosynthesis", std::iter::empty(), Some(Subject::Science));
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.contains(&format!(
            "\n\nSubject-specific guidance for Science: {}",
            subject_guidance(Subject::Science)
        )));
        assert!(!prompt.contains("Previous conversation context"));
    }

    #[test]
    fn test_prompt_keeps_history_in_order() {
        let history = [("What is 2+2?", "4"), ("And 3+3?", "6")];
        let prompt = compose_prompt("And 4+4?", history.iter().copied(), None);

        let first = prompt.find("Student: What is 2+2?\nAssistant: 4\n\n").unwrap();
        let second = prompt.find("Student: And 3+3?\nAssistant: 6\n\n").unwrap();
        let current = prompt.rfind("Student: And 4+4?\nAssistant:").unwrap();
        assert!(first < second && second < current);
        assert!(prompt.ends_with("Student: And 4+4?\nAssistant:"));
    }

    #[test]
    fn test_section_order() {
        let history = [("q1", "a1")];
        let prompt = compose_prompt("q2", history.iter().copied(), Some(Subject::History));

        let guidance = prompt.find("Subject-specific guidance for History").unwrap();
        let context = prompt.find("Previous conversation context:").unwrap();
        let question = prompt.find("Student: q2").unwrap();
        assert!(guidance < context && context < question);
    }

    #[test]
    fn test_every_subject_has_guidance() {
        for subject in Subject::ALL {
            assert!(!subject_guidance(subject).is_empty(), "{subject} has no guidance");
        }
    }
}
