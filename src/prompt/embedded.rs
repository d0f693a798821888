//! Minimal embedded prompt template, used when no on-disk template is
//! found (§4.3).

pub const EMBEDDED_TEMPLATE: &str = r#"You are generating a TypeScript scraper for a summer camp website.

Source: {{SOURCE_NAME}}
URL: {{SOURCE_URL}}
Write the scraper to: {{OUTPUT_FILE}}

{{#NOTES}}
Notes from the operator:
{{NOTES}}
{{/NOTES}}
{{#FEEDBACK_TEXT}}
Feedback from a previous attempt (version {{FEEDBACK_VERSION}}):
{{FEEDBACK_TEXT}}
{{/FEEDBACK_TEXT}}
{{#PREVIOUS_CODE}}
Previous code to improve on:
```typescript
{{PREVIOUS_CODE}}
```
{{/PREVIOUS_CODE}}
{{SITE_GUIDANCE}}
{{#EXPLORATION_RESULTS}}
Exploration results:
{{EXPLORATION_RESULTS}}
{{/EXPLORATION_RESULTS}}

Write a function `scrape(page) -> ExtractedSession[]` that extracts camp
sessions (dates, price, age range, location) from this source.
"#;
