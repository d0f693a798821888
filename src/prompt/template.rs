//! Handlebars-based `{{PLACEHOLDER}}` / `{{#SECTION}}…{{/SECTION}}` rendering (§4.3),
//! grounded on the teacher's `PromptLoader::render` (`handlebars::Handlebars::render_template`).
//! Mustache-style truthy sections are stripped entirely when their value is
//! absent or empty; present sections render against the same context, so a
//! placeholder can appear both as a section name and inside its own body.

use handlebars::Handlebars;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

use super::embedded::EMBEDDED_TEMPLATE;

#[derive(Debug, Default, Clone)]
pub struct PromptContext {
    values: Map<String, Value>,
}

impl PromptContext {
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), Value::String(value.into()));
    }

    pub fn set_section(&mut self, key: &str, value: impl Into<String>) {
        self.set(key, value);
    }
}

/// Load the on-disk template at `path` if present, else fall back to the
/// compiled-in default.
pub fn load_template(path: Option<&Path>) -> String {
    if let Some(path) = path {
        if let Ok(content) = std::fs::read_to_string(path) {
            debug!(?path, "load_template: using on-disk template");
            return content;
        }
        debug!(?path, "load_template: on-disk template missing, falling back to embedded");
    }
    EMBEDDED_TEMPLATE.to_string()
}

pub fn render(template: &str, ctx: &PromptContext) -> String {
    let mut hbs = Handlebars::new();
    hbs.set_strict_mode(false);
    // Prompts are plain text, not HTML; the default escape fn would mangle
    // code/JSON placed into PREVIOUS_CODE and EXPLORATION_RESULTS.
    hbs.register_escape_fn(handlebars::no_escape);

    match hbs.render_template(template, &Value::Object(ctx.values.clone())) {
        Ok(rendered) => rendered,
        Err(e) => {
            warn!(error = %e, "render: template render failed, using raw template");
            template.to_string()
        }
    }
}
