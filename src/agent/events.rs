//! The agent's newline-delimited JSON event stream, modeled as a pull-style
//! parser (Design Notes §9) rather than a push-callback mesh: the caller
//! folds state (last assistant text, tool-use trace, final result) by
//! calling `next_event` in a loop.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    SystemInit { model: String },
    AssistantText { text: String },
    ToolUse { name: String, input_preview: String },
    ToolResult { preview: String },
    Result { duration_ms: Option<u64>, cost_usd: Option<f64> },
    /// A line that didn't parse as one of the known event shapes. Per
    /// spec §4.4, lines that fail to parse as JSON are appended verbatim
    /// to the log and never treated as code.
    Unparsed(String),
}

const ARG_PREVIEW_LEN: usize = 200;
const RESULT_PREVIEW_LEN: usize = 200;

/// Parse one line of the agent's stdout into an [`AgentEvent`].
pub fn parse_event_line(line: &str) -> AgentEvent {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return AgentEvent::Unparsed(line.to_string());
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => return AgentEvent::Unparsed(line.to_string()),
    };

    match value.get("type").and_then(Value::as_str) {
        Some("system") if value.get("subtype").and_then(Value::as_str) == Some("init") => {
            let model = value
                .get("model")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            AgentEvent::SystemInit { model }
        }
        Some("assistant") => parse_assistant(&value, line),
        Some("tool_result") => {
            let preview = value
                .get("content")
                .map(|c| truncate(&c.to_string(), RESULT_PREVIEW_LEN))
                .unwrap_or_default();
            AgentEvent::ToolResult { preview }
        }
        Some("result") => {
            let duration_ms = value.get("duration_ms").and_then(Value::as_u64);
            let cost_usd = value.get("total_cost_usd").and_then(Value::as_f64);
            AgentEvent::Result { duration_ms, cost_usd }
        }
        _ => AgentEvent::Unparsed(line.to_string()),
    }
}

fn parse_assistant(value: &Value, raw_line: &str) -> AgentEvent {
    let Some(content) = value.pointer("/message/content").and_then(Value::as_array) else {
        return AgentEvent::Unparsed(raw_line.to_string());
    };

    for block in content {
        match block.get("type").and_then(Value::as_str) {
            Some("text") => {
                let text = block.get("text").and_then(Value::as_str).unwrap_or_default();
                return AgentEvent::AssistantText { text: text.to_string() };
            }
            Some("tool_use") => {
                let name = block.get("name").and_then(Value::as_str).unwrap_or("unknown").to_string();
                let input = block
                    .get("input")
                    .map(|i| truncate(&i.to_string(), ARG_PREVIEW_LEN))
                    .unwrap_or_default();
                return AgentEvent::ToolUse {
                    name,
                    input_preview: input,
                };
            }
            _ => continue,
        }
    }

    AgentEvent::Unparsed(raw_line.to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max])
    }
}
