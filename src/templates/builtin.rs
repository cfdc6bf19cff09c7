//! Built-in document templates.
//!
//! Every template pairs a markdown skeleton (rendered by the
//! [`TemplateEngine`](super::TemplateEngine)) with the system prompt the
//! formatter sends alongside the transcript.

/// Id of the template used whenever a requested id resolves to nothing.
pub const DEFAULT_TEMPLATE_ID: &str = "meeting-notes";

/// A template compiled into the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltInTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub content: &'static str,
    pub system_prompt: &'static str,
}

/// Look up a built-in template by id.
pub fn builtin(id: &str) -> Option<&'static BuiltInTemplate> {
    BUILT_IN_TEMPLATES.iter().find(|t| t.id == id)
}

/// The fixed default template.
pub fn default_template() -> &'static BuiltInTemplate {
    &BUILT_IN_TEMPLATES[0]
}

/// All built-in templates, default first.
pub static BUILT_IN_TEMPLATES: [BuiltInTemplate; 6] = [
    BuiltInTemplate {
        id: DEFAULT_TEMPLATE_ID,
        name: "Meeting Notes",
        description: "Structured meeting minutes with action items",
        content: MEETING_NOTES,
        system_prompt: MEETING_NOTES_PROMPT,
    },
    BuiltInTemplate {
        id: "lecture-notes",
        name: "Lecture Notes",
        description: "Educational content with key concepts and summaries",
        content: LECTURE_NOTES,
        system_prompt: LECTURE_NOTES_PROMPT,
    },
    BuiltInTemplate {
        id: "interview",
        name: "Interview Notes",
        description: "Q&A format with candidate evaluation",
        content: INTERVIEW,
        system_prompt: INTERVIEW_PROMPT,
    },
    BuiltInTemplate {
        id: "brainstorm",
        name: "Brainstorm Session",
        description: "Ideas and creative concepts organized by theme",
        content: BRAINSTORM,
        system_prompt: BRAINSTORM_PROMPT,
    },
    BuiltInTemplate {
        id: "journal",
        name: "Voice Journal",
        description: "Personal reflection and daily thoughts",
        content: JOURNAL,
        system_prompt: JOURNAL_PROMPT,
    },
    BuiltInTemplate {
        id: "raw",
        name: "Raw Transcript",
        description: "Unformatted transcript with minimal cleanup",
        content: RAW,
        system_prompt: RAW_PROMPT,
    },
];

// ---------------------------------------------------------------------------
// Meeting notes
// ---------------------------------------------------------------------------

const MEETING_NOTES: &str = "\
# Meeting Notes: {{title}}

**Date**: {{date}}
**Time**: {{time}}
**Duration**: {{duration}}
**Participants**: {{speakerCount}} speakers

---

## Summary

{{summary}}

## Discussion Points

{{content}}

## Action Items

- [ ] 

## Decisions Made

- 

## Next Steps

- 

---

*Recorded with voice-memo*
*Audio: [[{{audioPath}}]]*";

const MEETING_NOTES_PROMPT: &str = "\
You are an expert meeting note formatter. Transform the transcript into well-structured meeting notes.

Your responsibilities:
1. Create a concise executive summary (2-3 sentences)
2. Organize discussion points by topic with clear headers
3. Extract and list all action items with assignees if mentioned
4. Identify and document key decisions made
5. Suggest logical next steps based on the discussion
6. Clean up filler words and verbal tics
7. Fix grammar and improve readability

Format with Markdown:
- Use ## for major sections
- Use ### for subsections
- Use bullet points for lists
- Use checkboxes for action items
- Bold important terms and names

Keep the original meaning and tone. Do not add information not present in the transcript.";

// ---------------------------------------------------------------------------
// Lecture notes
// ---------------------------------------------------------------------------

const LECTURE_NOTES: &str = "\
# Lecture: {{title}}

**Date**: {{date}}
**Duration**: {{duration}}
**Subject**: 

---

## Key Concepts

{{summary}}

## Detailed Notes

{{content}}

## Important Terms

- 

## Questions to Review

- 

## Related Topics

- 

---

*Recorded with voice-memo*
*Audio: [[{{audioPath}}]]*";

const LECTURE_NOTES_PROMPT: &str = "\
You are an expert educational content formatter. Transform the lecture transcript into comprehensive study notes.

Your responsibilities:
1. Identify and highlight key concepts and main ideas
2. Organize content into logical learning sections
3. Extract important terminology and definitions
4. Create review questions based on the content
5. Suggest related topics for further study
6. Clean up verbal fillers and improve readability
7. Preserve technical accuracy and nuance

Format with Markdown:
- Use ## for major topics
- Use ### for subtopics
- Use bullet points for lists
- Use **bold** for key terms
- Use > blockquotes for important quotes or definitions

Optimize for learning and review. Maintain academic rigor.";

// ---------------------------------------------------------------------------
// Interview
// ---------------------------------------------------------------------------

const INTERVIEW: &str = "\
# Interview: {{title}}

**Date**: {{date}}
**Duration**: {{duration}}
**Participants**: {{speakerCount}}

---

## Overview

{{summary}}

## Questions & Answers

{{content}}

## Key Observations

- 

## Strengths

- 

## Areas for Follow-up

- 

## Overall Assessment

---

*Recorded with voice-memo*
*Audio: [[{{audioPath}}]]*";

const INTERVIEW_PROMPT: &str = "\
You are an expert interview documenter. Transform the interview transcript into structured Q&A notes.

Your responsibilities:
1. Clearly separate questions from answers
2. Identify the interviewer and interviewee
3. Highlight key responses and notable quotes
4. Note any follow-up questions or clarifications
5. Extract observable skills and qualities
6. Maintain objectivity and accuracy
7. Clean up filler words while preserving meaning

Format with Markdown:
- Use **Q:** and **A:** prefixes for dialogue
- Use ### for topic transitions
- Use bullet points for observations
- Use > blockquotes for notable responses

Preserve the authentic voice of the interviewee. Be objective and thorough.";

// ---------------------------------------------------------------------------
// Brainstorm
// ---------------------------------------------------------------------------

const BRAINSTORM: &str = "\
# Brainstorm: {{title}}

**Date**: {{date}}
**Duration**: {{duration}}
**Participants**: {{speakerCount}}

---

## Session Goal

{{summary}}

## Ideas Generated

{{content}}

## Top Ideas to Explore

1. 
2. 
3. 

## Action Items

- [ ] 

## Parking Lot (Future Ideas)

- 

---

*Recorded with voice-memo*
*Audio: [[{{audioPath}}]]*";

const BRAINSTORM_PROMPT: &str = "\
You are an expert creative session facilitator. Transform the brainstorm transcript into organized idea documentation.

Your responsibilities:
1. Capture ALL ideas mentioned, even incomplete ones
2. Group related ideas by theme or category
3. Identify the most promising or frequently discussed ideas
4. Note any constraints or concerns raised
5. Extract action items for follow-up
6. Preserve creative energy and spontaneity
7. Clean up while maintaining idea essence

Format with Markdown:
- Use ## for idea categories
- Use numbered lists for ranked ideas
- Use bullet points for idea details
- Use 💡 for breakthrough ideas
- Use ⚠️ for concerns or constraints

Capture the creative spirit. Every idea has potential value.";

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

const JOURNAL: &str = "\
# Journal Entry

**Date**: {{date}}
**Time**: {{time}}
**Duration**: {{duration}}

---

## Today's Thoughts

{{content}}

## Reflections

{{summary}}

## Gratitude

- 

## Tomorrow's Intentions

- 

---

*Voice journal powered by voice-memo*";

const JOURNAL_PROMPT: &str = "\
You are a thoughtful journal assistant. Transform the voice journal into a reflective written entry.

Your responsibilities:
1. Preserve the personal, authentic voice
2. Organize thoughts into coherent paragraphs
3. Identify themes and patterns in the reflection
4. Extract any goals or intentions mentioned
5. Note any gratitude or positive observations
6. Gently improve readability without losing intimacy
7. Maintain privacy and sensitivity

Format with Markdown:
- Use flowing paragraphs for narrative sections
- Use bullet points for lists
- Use *italics* for inner thoughts
- Use > blockquotes for memorable realizations

This is personal writing. Preserve authenticity and emotional truth.";

// ---------------------------------------------------------------------------
// Raw
// ---------------------------------------------------------------------------

const RAW: &str = "\
# Transcript: {{title}}

**Date**: {{date}} {{time}}
**Duration**: {{duration}}
**Language**: {{language}}

---

{{content}}

---

*Transcribed with voice-memo using voxmlx*
*Audio: [[{{audioPath}}]]*";

const RAW_PROMPT: &str = "\
You are a transcript cleaner. Make minimal improvements to the raw transcript.

Your responsibilities:
1. Add proper punctuation and capitalization
2. Fix obvious speech recognition errors
3. Add paragraph breaks at natural pauses
4. Keep ALL content - do not summarize or remove anything
5. Do not add headers or structure
6. Do not interpret or expand on content

Output the cleaned transcript as continuous text with paragraph breaks.
This should remain as close to verbatim as possible.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_meeting_notes() {
        assert_eq!(default_template().id, "meeting-notes");
        assert_eq!(builtin(DEFAULT_TEMPLATE_ID), Some(default_template()));
    }

    #[test]
    fn ids_are_unique() {
        let mut ids: Vec<_> = BUILT_IN_TEMPLATES.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), BUILT_IN_TEMPLATES.len());
    }

    #[test]
    fn every_template_embeds_content() {
        for t in &BUILT_IN_TEMPLATES {
            assert!(t.content.contains("{{content}}"), "{} has no body slot", t.id);
            assert!(!t.system_prompt.is_empty());
        }
    }

    #[test]
    fn unknown_id_is_not_built_in() {
        assert!(builtin("weekly-review").is_none());
    }
}
