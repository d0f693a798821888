//! Prompt construction (§4.3).

mod embedded;
mod site_guidance;
mod template;

pub use embedded::EMBEDDED_TEMPLATE;
pub use site_guidance::site_guidance;
pub use template::{load_template, render, PromptContext};

use std::path::Path;

use crate::domain::{DevelopmentRequest, SiteExploration};

/// Build the final prompt text for a development request.
pub fn build_prompt(
    request: &DevelopmentRequest,
    exploration: Option<&SiteExploration>,
    output_file: &Path,
    template_path: Option<&Path>,
) -> String {
    let mut ctx = PromptContext::default();
    ctx.set("SOURCE_NAME", &request.source_name);
    ctx.set("SOURCE_URL", &request.source_url);
    ctx.set("OUTPUT_FILE", output_file.display().to_string());
    ctx.set("SITE_GUIDANCE", site_guidance(&request.source_url));

    if let Some(notes) = &request.notes {
        ctx.set_section("NOTES", notes.clone());
    }

    if let Some(feedback) = request.latest_feedback() {
        ctx.set("FEEDBACK_VERSION", (feedback.scraper_version_before + 1).to_string());
        ctx.set_section("FEEDBACK_TEXT", feedback.feedback.clone());
    }

    if let Some(code) = &request.generated_scraper_code {
        ctx.set_section("PREVIOUS_CODE", code.clone());
    }

    if let Some(exploration) = exploration {
        ctx.set_section("EXPLORATION_RESULTS", exploration_results_prose(exploration));
    }

    let template = load_template(template_path);
    render(&template, &ctx)
}

/// `EXPLORATION_RESULTS` prose: a summary plus fenced blocks for any
/// discovered locations and discovered APIs (1.5 KB sample data slice).
fn exploration_results_prose(exploration: &SiteExploration) -> String {
    let mut sections = Vec::new();

    sections.push(format!("Site type: {}", exploration.site_type));

    if exploration.has_multiple_locations && !exploration.locations.is_empty() {
        let mut block = String::from("Discovered locations:\n```json\n");
        block.push_str(&serde_json::to_string_pretty(&exploration.locations).unwrap_or_default());
        block.push_str("\n```");
        sections.push(block);
    }

    let apis = exploration.apis_by_match_count();
    if !apis.is_empty() {
        sections.push(
            "One or more JSON APIs were discovered during exploration. Strongly prefer calling these \
APIs with `fetch()` over HTML scraping."
                .to_string(),
        );
        for api in apis {
            let mut sample = api.sample_data.clone().unwrap_or_default();
            if sample.len() > 1536 {
                sample.truncate(1536);
                sample.push_str("...[truncated]");
            }
            sections.push(format!(
                "```\n{} {} (matches={})\n{}\n```",
                api.method, api.url, api.match_count, sample
            ));
        }
        sections.push(format!(
            "Skeleton:\n```typescript\nconst res = await fetch(\"{}\");\nconst data = await res.json();\n```",
            apis.first().map(|a| a.url.as_str()).unwrap_or_default()
        ));
    }

    sections.join("\n\n")
}
