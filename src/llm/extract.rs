//! Structured sections pulled out of a formatted markdown response.
//!
//! Each extractor looks for a heading (any level, case-insensitive) whose
//! text is one of a fixed set of synonyms, then takes everything up to the
//! next heading of the same or a shallower level.  A missing heading, or a
//! section with nothing usable in it, is reported as `None` rather than an
//! empty value.

use std::sync::OnceLock;

use regex::Regex;

/// Longest title kept, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Title used when the response has neither a heading nor a short first
/// sentence.
pub const FALLBACK_TITLE: &str = "Untitled Document";

const SUMMARY_HEADINGS: &[&str] = &["summary", "overview", "executive summary", "요약"];

const ACTION_ITEM_HEADINGS: &[&str] = &[
    "action items",
    "action item",
    "to-do",
    "todo",
    "액션 아이템",
    "할 일",
];

const DECISION_HEADINGS: &[&str] = &["decisions", "decisions made", "결정 사항", "결정"];

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s{0,3}(#{1,6})(?:[ \t]+(.*?))?[ \t#]*$").expect("valid heading regex")
    })
}

fn checkbox_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*[-*+]\s*\[[ xX]\]\s*(.*)$").expect("valid checkbox regex"))
}

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*[-*+]\s+(.*)$").expect("valid bullet regex"))
}

/// `(level, text)` when `line` is an ATX heading.
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let caps = heading_re().captures(line)?;
    let level = caps.get(1)?.as_str().len();
    let text = caps.get(2).map_or("", |m| m.as_str());
    Some((level, text))
}

fn heading_matches(text: &str, synonyms: &[&str]) -> bool {
    let normalized = text.trim().trim_end_matches(':').trim().to_lowercase();
    synonyms.iter().any(|s| *s == normalized)
}

/// Body lines of the first section whose heading is one of `synonyms`.
fn section<'a>(content: &'a str, synonyms: &[&str]) -> Option<Vec<&'a str>> {
    let mut lines = content.lines();

    let level = loop {
        let line = lines.next()?;
        if let Some((level, text)) = parse_heading(line) {
            if heading_matches(text, synonyms) {
                break level;
            }
        }
    };

    let body = lines
        .take_while(|line| !matches!(parse_heading(line), Some((l, _)) if l <= level))
        .collect();
    Some(body)
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Text under a Summary / Overview heading, trimmed.
pub fn extract_summary(content: &str) -> Option<String> {
    let body = section(content, SUMMARY_HEADINGS)?.join("\n");
    let body = body.trim();
    if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}

/// Items under an Action Items heading.
///
/// Both checkbox entries (`- [ ] x`, `- [x] x`) and plain bullets count;
/// markers are stripped and blank entries dropped.
pub fn extract_action_items(content: &str) -> Option<Vec<String>> {
    let items = section(content, ACTION_ITEM_HEADINGS)?
        .into_iter()
        .filter_map(|line| {
            checkbox_re()
                .captures(line)
                .or_else(|| bullet_re().captures(line))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .filter(|item| !item.is_empty())
        .collect();
    non_empty(items)
}

/// Plain bullet items under a Decisions heading.
pub fn extract_decisions(content: &str) -> Option<Vec<String>> {
    let items = section(content, DECISION_HEADINGS)?
        .into_iter()
        .filter_map(|line| {
            bullet_re()
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .filter(|item| !item.is_empty())
        .collect();
    non_empty(items)
}

/// Document title.
///
/// First markdown heading (marker stripped, cut to 100 chars), else the first
/// sentence when it is at most 100 chars, else [`FALLBACK_TITLE`].
pub fn derive_title(content: &str) -> String {
    let heading = content
        .lines()
        .find(|line| line.trim_start().starts_with('#'))
        .map(|line| line.trim().trim_start_matches('#').trim());

    if let Some(text) = heading.filter(|t| !t.is_empty()) {
        return text.chars().take(MAX_TITLE_CHARS).collect();
    }

    let first_sentence = content
        .split(|c: char| matches!(c, '.' | '!' | '?'))
        .next()
        .unwrap_or("")
        .trim();

    if !first_sentence.is_empty() && first_sentence.chars().count() <= MAX_TITLE_CHARS {
        return first_sentence.to_string();
    }

    FALLBACK_TITLE.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const NOTES: &str = "\
# Q1 Planning Notes

## Summary
We agreed on the roadmap.
Budget is approved.

### Details
Nested details stay in the summary.

## Action Items
- [ ] call Bob
- [x] send notes
- [ ]

## Decisions Made
- Ship in March
* Hire two engineers
not a bullet

## Next Steps
- later
";

    #[test]
    fn action_items_strip_checkbox_markers() {
        let md = "## Action Items\n- [ ] call Bob\n- [x] send notes\n";
        assert_eq!(
            extract_action_items(md),
            Some(vec!["call Bob".to_string(), "send notes".to_string()])
        );
    }

    #[test]
    fn action_items_accept_plain_bullets_and_drop_blanks() {
        assert_eq!(
            extract_action_items(NOTES),
            Some(vec!["call Bob".to_string(), "send notes".to_string()])
        );
        let md = "## to-do\n- water plants\n-   \n";
        assert_eq!(
            extract_action_items(md),
            Some(vec!["water plants".to_string()])
        );
    }

    #[test]
    fn missing_heading_is_not_present() {
        let md = "# Notes\nJust some text.\n- a bullet\n";
        assert_eq!(extract_summary(md), None);
        assert_eq!(extract_action_items(md), None);
        assert_eq!(extract_decisions(md), None);
    }

    #[test]
    fn heading_without_items_is_not_present() {
        let md = "## Action Items\n\n## Decisions\nnothing here\n";
        assert_eq!(extract_action_items(md), None);
        assert_eq!(extract_decisions(md), None);
    }

    #[test]
    fn decisions_take_plain_bullets_only() {
        assert_eq!(
            extract_decisions(NOTES),
            Some(vec![
                "Ship in March".to_string(),
                "Hire two engineers".to_string()
            ])
        );
    }

    #[test]
    fn summary_runs_until_equal_or_shallower_heading() {
        let summary = extract_summary(NOTES).expect("summary present");
        assert!(summary.starts_with("We agreed on the roadmap."));
        assert!(summary.contains("Nested details stay in the summary."));
        assert!(!summary.contains("call Bob"));
    }

    #[test]
    fn summary_runs_to_end_of_text() {
        assert_eq!(
            extract_summary("## Overview\nLast section.\n"),
            Some("Last section.".to_string())
        );
    }

    #[test]
    fn headings_match_case_insensitively_and_in_korean() {
        assert_eq!(
            extract_summary("### SUMMARY:\nshort\n"),
            Some("short".to_string())
        );
        assert_eq!(
            extract_action_items("## 할 일\n- [ ] 보고서 작성\n"),
            Some(vec!["보고서 작성".to_string()])
        );
        assert_eq!(
            extract_decisions("## 결정 사항\n- 출시 연기\n"),
            Some(vec!["출시 연기".to_string()])
        );
    }

    #[test]
    fn hash_without_space_is_body_text() {
        let md = "## Summary\nWe agreed on the plan.\n#1 priority is the launch.\nBudget approved.\n\n## Next\nx\n";
        assert_eq!(
            extract_summary(md),
            Some("We agreed on the plan.\n#1 priority is the launch.\nBudget approved.".to_string())
        );
        let md = "## Action Items\n- [ ] tag the post\n#hashtag\n- [ ] publish\n";
        assert_eq!(
            extract_action_items(md),
            Some(vec!["tag the post".to_string(), "publish".to_string()])
        );
    }

    #[test]
    fn similar_but_different_heading_does_not_match() {
        assert_eq!(extract_summary("## Summary of risks\ntext\n"), None);
    }

    #[test]
    fn title_from_leading_heading() {
        assert_eq!(derive_title("# Q1 Planning Notes\n\nBody."), "Q1 Planning Notes");
        assert_eq!(derive_title("intro line\n## Deep Title\n"), "Deep Title");
    }

    #[test]
    fn title_from_first_sentence() {
        assert_eq!(derive_title("Let's begin. Then more."), "Let's begin");
        assert_eq!(derive_title("Ready? Go!"), "Ready");
    }

    #[test]
    fn heading_title_is_truncated_to_100_chars() {
        let long = format!("# {}", "a".repeat(150));
        assert_eq!(derive_title(&long).chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn long_first_sentence_falls_back() {
        let long = "word ".repeat(40);
        assert_eq!(derive_title(&long), FALLBACK_TITLE);
        assert_eq!(derive_title(""), FALLBACK_TITLE);
        assert_eq!(derive_title("   "), FALLBACK_TITLE);
    }
}
