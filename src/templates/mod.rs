//! Document templates.
//!
//! * [`BuiltInTemplate`] / [`BUILT_IN_TEMPLATES`]: the compiled-in catalogue.
//! * [`resolve_template`]: built-in → custom → default lookup that never fails.
//! * [`TemplateEngine`]: `{{placeholder}}` substitution.

pub mod builtin;
pub mod engine;

pub use builtin::{builtin, default_template, BuiltInTemplate, BUILT_IN_TEMPLATES, DEFAULT_TEMPLATE_ID};
pub use engine::{
    available_templates, resolve_template, substitute, ResolvedTemplate, TemplateEngine,
    TemplateInfo, TemplateVariables,
};
