//! Prompt builder for transcript formatting.
//!
//! [`PromptBuilder`] produces the `(system, user)` pair sent to a completion
//! provider.  The system message is the resolved template's instructions; the
//! user message wraps the raw transcript in a fixed frame followed by a
//! cleanup checklist.  Output depends only on the inputs.

use crate::templates::ResolvedTemplate;

// ---------------------------------------------------------------------------
// Cleanup checklist
// ---------------------------------------------------------------------------

const CLEANUP_CHECKLIST: &str = "\
Remember to:
- Clean up filler words (um, uh, like, you know)
- Fix grammar and punctuation
- Add logical section headers
- Extract action items and decisions if applicable
- Maintain the original meaning and important details";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds formatting prompts for one resolved template.
///
/// # Example
/// ```rust
/// use voice_memo::config::TemplateConfig;
/// use voice_memo::llm::PromptBuilder;
/// use voice_memo::templates::resolve_template;
///
/// let template = resolve_template("meeting-notes", &TemplateConfig::default());
/// let (system, user) = PromptBuilder::new(&template).build_chat("um so the plan is");
/// assert!(system.contains("meeting note"));
/// assert!(user.contains("um so the plan is"));
/// ```
pub struct PromptBuilder<'a> {
    template: &'a ResolvedTemplate,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(template: &'a ResolvedTemplate) -> Self {
        Self { template }
    }

    /// Build a **(system_msg, user_msg)** pair.
    pub fn build_chat(&self, transcript: &str) -> (String, String) {
        (self.template.system_prompt.clone(), self.user_message(transcript))
    }

    fn user_message(&self, transcript: &str) -> String {
        let mut msg = String::with_capacity(transcript.len() + 512);
        msg.push_str(&format!(
            "Please format the following voice transcript into a well-structured {}:\n\n",
            self.template.name
        ));
        msg.push_str("---\nTRANSCRIPT:\n");
        msg.push_str(transcript);
        msg.push_str("\n---\n\n");
        msg.push_str(CLEANUP_CHECKLIST);
        msg
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CustomTemplate, TemplateConfig};
    use crate::templates::resolve_template;

    #[test]
    fn system_message_is_template_prompt() {
        let template = resolve_template("lecture-notes", &TemplateConfig::default());
        let (system, _) = PromptBuilder::new(&template).build_chat("hello");
        assert_eq!(system, template.system_prompt);
    }

    #[test]
    fn user_message_frames_transcript() {
        let template = resolve_template("interview", &TemplateConfig::default());
        let (_, user) = PromptBuilder::new(&template).build_chat("uh tell me about yourself");

        assert!(user.starts_with(
            "Please format the following voice transcript into a well-structured Interview Notes:"
        ));
        assert!(user.contains("---\nTRANSCRIPT:\nuh tell me about yourself\n---"));
    }

    #[test]
    fn user_message_ends_with_checklist() {
        let template = resolve_template("raw", &TemplateConfig::default());
        let (_, user) = PromptBuilder::new(&template).build_chat("text");

        assert!(user.contains("Remember to:"));
        assert!(user.contains("filler words"));
        assert!(user.ends_with("Maintain the original meaning and important details"));
    }

    #[test]
    fn custom_template_name_is_used() {
        let mut config = TemplateConfig::default();
        config.custom.insert(
            "retro".into(),
            CustomTemplate {
                name: "Sprint Retro".into(),
                description: String::new(),
                content: "{{content}}".into(),
                system_prompt: Some("Summarise the retro.".into()),
            },
        );
        let template = resolve_template("retro", &config);
        let (system, user) = PromptBuilder::new(&template).build_chat("went well");

        assert_eq!(system, "Summarise the retro.");
        assert!(user.contains("well-structured Sprint Retro:"));
    }

    #[test]
    fn same_input_same_prompt() {
        let template = resolve_template("journal", &TemplateConfig::default());
        let builder = PromptBuilder::new(&template);
        assert_eq!(builder.build_chat("today"), builder.build_chat("today"));
    }
}
