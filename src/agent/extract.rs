//! Three-tier code extraction (§4.4): the output file the agent wrote to
//! wins if present and non-trivial; otherwise scan the raw stdout stream
//! for a fenced TypeScript block, first as a JSON-escaped string (the
//! common shape inside a `stream-json` "text" field), then as a literal
//! fenced block.

use std::path::Path;

use regex::Regex;
use tracing::debug;

const MIN_NON_WHITESPACE_BYTES: usize = 50;

/// Extract generated code, trying each tier in order and returning the
/// first hit.
pub fn extract_code(output_file: &Path, stdout: &str) -> Option<String> {
    if let Some(code) = read_output_file(output_file) {
        debug!(?output_file, "extract_code: using the agent's written output file");
        return Some(code);
    }

    if let Some(code) = extract_json_escaped_fence(stdout) {
        debug!("extract_code: using JSON-escaped fenced block from stdout");
        return Some(code);
    }

    extract_raw_fence(stdout).inspect(|_| debug!("extract_code: using raw fenced block from stdout"))
}

fn read_output_file(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    if non_whitespace_len(&content) > MIN_NON_WHITESPACE_BYTES {
        Some(content)
    } else {
        None
    }
}

fn non_whitespace_len(s: &str) -> usize {
    s.chars().filter(|c| !c.is_whitespace()).count()
}

/// Find every JSON-string-literal `"text": "..."` field in stdout, unescape
/// it, and look for a fenced TypeScript block inside the unescaped text.
/// Grounded on the agent's stream-json `assistant` events, whose text
/// content is embedded as a normal JSON string and therefore carries
/// literal `\n`/`\"` escapes around any fenced block it quotes.
fn extract_json_escaped_fence(stdout: &str) -> Option<String> {
    let field_re = Regex::new(r#""text"\s*:\s*"((?:[^"\\]|\\.)*)""#).ok()?;
    for caps in field_re.captures_iter(stdout) {
        let escaped_field = &caps[1];
        if !escaped_field.contains("```") {
            continue;
        }
        let unescaped = unescape_json_string(escaped_field);
        if let Some(code) = extract_raw_fence(&unescaped) {
            return Some(code);
        }
    }
    None
}

fn unescape_json_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn extract_raw_fence(text: &str) -> Option<String> {
    let re = Regex::new(r"(?s)```(?:typescript|ts)\n(.*?)```").ok()?;
    re.captures(text).map(|caps| caps[1].to_string())
}
