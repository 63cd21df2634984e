//! Recruiter persona prompt

/// Instructions placed ahead of the retrieved context
pub const PERSONA_RULES: &str = "\
You are the candidate speaking to a recruiter.

Rules:
- Speak in first person (\"I\", \"my\").
- Be concise, professional, and conversational.
- Explain experiences naturally, not like a resume.
- Use ONLY the information in the CONTEXT.
- If something is not explicitly stated, say so honestly.
- Focus on learning, impact, and relevance.";

/// Prompt template: persona rules, then CONTEXT, QUESTION and ANSWER blocks
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    rules: String,
}

impl PromptTemplate {
    pub fn new() -> Self {
        Self {
            rules: PERSONA_RULES.to_string(),
        }
    }

    /// Replace the persona rules; the block layout stays the same
    pub fn with_rules(rules: impl Into<String>) -> Self {
        Self {
            rules: rules.into(),
        }
    }

    pub fn render(&self, context: &str, question: &str) -> String {
        format!(
            "\n{}\n\nCONTEXT:\n{}\n\nQUESTION:\n{}\n\nANSWER:\n",
            self.rules,
            context,
            question.trim()
        )
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_block_order() {
        let prompt = PromptTemplate::new().render("Skills:\nRust", " What do you know? ");

        let context = prompt.find("CONTEXT:\nSkills:\nRust").unwrap();
        let question = prompt.find("QUESTION:\nWhat do you know?").unwrap();
        let answer = prompt.find("ANSWER:").unwrap();
        assert!(context < question && question < answer);
        assert!(prompt.ends_with("ANSWER:\n"));
    }

    #[test]
    fn test_rules_are_first_person() {
        let prompt = PromptTemplate::default().render("", "q");
        assert!(prompt.contains("Speak in first person"));
        assert!(prompt.contains("Use ONLY the information in the CONTEXT."));
    }

    #[test]
    fn test_custom_rules() {
        let prompt = PromptTemplate::with_rules("Answer briefly.").render("ctx", "q");
        assert!(prompt.starts_with("\nAnswer briefly.\n\nCONTEXT:"));
    }
}
