//! Placeholder substitution over markdown templates.
//!
//! Rendering is deterministic and never fails: known `{{name}}` tokens are
//! replaced, `{{customFields.<key>}}` tokens are replaced from the custom map,
//! and a final pass deletes every `{{...}}` token that is still left.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::config::TemplateConfig;

use super::builtin::{builtin, default_template, BUILT_IN_TEMPLATES};

// ---------------------------------------------------------------------------
// TemplateVariables
// ---------------------------------------------------------------------------

/// Values substituted into a template, assembled fresh for every run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateVariables {
    pub date: String,
    pub time: String,
    pub datetime: String,
    pub title: String,
    pub duration: String,
    pub audio_path: String,
    pub transcript_path: String,
    pub speaker_count: usize,
    pub language: String,
    pub content: String,
    /// Substituted only when present; otherwise `{{summary}}` is dropped.
    pub summary: Option<String>,
    pub custom_fields: BTreeMap<String, String>,
}

impl TemplateVariables {
    fn fixed_fields(&self) -> [(&'static str, String); 10] {
        [
            ("{{date}}", self.date.clone()),
            ("{{time}}", self.time.clone()),
            ("{{datetime}}", self.datetime.clone()),
            ("{{title}}", self.title.clone()),
            ("{{duration}}", self.duration.clone()),
            ("{{audioPath}}", self.audio_path.clone()),
            ("{{transcriptPath}}", self.transcript_path.clone()),
            ("{{speakerCount}}", self.speaker_count.to_string()),
            ("{{language}}", self.language.clone()),
            ("{{content}}", self.content.clone()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Template resolution
// ---------------------------------------------------------------------------

/// A template after id resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub id: String,
    pub name: String,
    pub content: String,
    pub system_prompt: String,
}

/// Resolve `id` to a template: built-in by id, then custom by id, then the
/// fixed default.  Never fails.
///
/// A custom template without its own system prompt uses the default's.
pub fn resolve_template(id: &str, config: &TemplateConfig) -> ResolvedTemplate {
    if let Some(t) = builtin(id) {
        return ResolvedTemplate {
            id: t.id.to_string(),
            name: t.name.to_string(),
            content: t.content.to_string(),
            system_prompt: t.system_prompt.to_string(),
        };
    }

    let fallback = default_template();

    if let Some(custom) = config.custom.get(id) {
        let system_prompt = custom
            .system_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(fallback.system_prompt);
        return ResolvedTemplate {
            id: id.to_string(),
            name: custom.name.clone(),
            content: custom.content.clone(),
            system_prompt: system_prompt.to_string(),
        };
    }

    log::debug!(
        "templates: unknown template '{id}', using '{}'",
        fallback.id
    );
    ResolvedTemplate {
        id: fallback.id.to_string(),
        name: fallback.name.to_string(),
        content: fallback.content.to_string(),
        system_prompt: fallback.system_prompt.to_string(),
    }
}

/// Listing entry for one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub built_in: bool,
}

/// Built-in templates first, then custom ones in id order.
pub fn available_templates(config: &TemplateConfig) -> Vec<TemplateInfo> {
    let builtins = BUILT_IN_TEMPLATES.iter().map(|t| TemplateInfo {
        id: t.id.to_string(),
        name: t.name.to_string(),
        description: t.description.to_string(),
        built_in: true,
    });
    let custom = config.custom.iter().map(|(id, t)| TemplateInfo {
        id: id.clone(),
        name: t.name.clone(),
        description: t.description.clone(),
        built_in: false,
    });
    builtins.chain(custom).collect()
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

fn leftover_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{[^}]+\}\}").expect("valid placeholder regex"))
}

/// Renders templates from one configuration snapshot.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    config: TemplateConfig,
}

impl TemplateEngine {
    pub fn new(config: TemplateConfig) -> Self {
        Self { config }
    }

    /// Render with the configured default template.
    pub fn render(&self, vars: &TemplateVariables) -> String {
        self.render_with_template(&self.config.default_template, vars)
    }

    /// Render with the template `id` resolves to.
    pub fn render_with_template(&self, id: &str, vars: &TemplateVariables) -> String {
        let template = resolve_template(id, &self.config);
        substitute(&template.content, vars)
    }

    pub fn templates(&self) -> Vec<TemplateInfo> {
        available_templates(&self.config)
    }
}

/// Substitute `vars` into `template`, then delete any leftover `{{...}}`.
pub fn substitute(template: &str, vars: &TemplateVariables) -> String {
    let mut out = template.to_string();

    for (token, value) in vars.fixed_fields() {
        out = out.replace(token, &value);
    }

    if let Some(summary) = &vars.summary {
        out = out.replace("{{summary}}", summary);
    }

    for (key, value) in &vars.custom_fields {
        out = out.replace(&format!("{{{{customFields.{key}}}}}"), value);
    }

    leftover_re().replace_all(&out, "").into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
