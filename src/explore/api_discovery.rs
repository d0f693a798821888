//! JSON-API sniffing (§4.2): score a captured response against the
//! search-term set plus a generic camp-indicator regex, and build a
//! [`DiscoveredApi`] when the score clears the threshold.

use regex::Regex;

use crate::browser::CapturedResponse;
use crate::domain::DiscoveredApi;

const SAMPLE_DATA_CAP: usize = 2048;
const TRUNCATION_MARKER: &str = "...[truncated]";
const MIN_INDICATOR_HITS: u32 = 5;

/// Count total occurrences of each search term plus the generic indicator
/// regex in `body`. Returns `(search_term_hits, indicator_hits)`.
pub fn count_hits(body: &str, search_terms: &[String]) -> (u32, u32) {
    let lower = body.to_lowercase();
    let search_term_hits: u32 = search_terms.iter().map(|t| lower.matches(t.as_str()).count() as u32).sum();
    let indicator_re = Regex::new(r"(?i)camp|session|program|registration|enroll|price|cost|age|grade").unwrap();
    let indicator_hits = indicator_re.find_iter(body).count() as u32;
    (search_term_hits, indicator_hits)
}

/// `structureHint`: `Array[N]` for a top-level JSON array, or `Object with
/// keys: k1, k2...` for a top-level object.
pub fn structure_hint(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match &value {
        serde_json::Value::Array(items) => Some(format!("Array[{}]", items.len())),
        serde_json::Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            Some(format!("Object with keys: {}", keys.join(", ")))
        }
        _ => None,
    }
}

/// Replace numeric ids, UUIDs, and 24-hex Mongo-style object ids in a URL
/// with placeholder segments, yielding a stable pattern for grouping.
pub fn url_pattern(url: &str) -> String {
    let numeric_id = Regex::new(r"/\d+(?:/|$|\?|&)").unwrap();
    let uuid = Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap();
    let object_id = Regex::new(r"(?i)\b[0-9a-f]{24}\b").unwrap();

    let mut result = uuid.replace_all(url, "{uuid}").to_string();
    result = object_id.replace_all(&result, "{objectId}").to_string();
    result = numeric_id
        .replace_all(&result, |caps: &regex::Captures| {
            let tail = &caps[0][caps[0].find(|c: char| !c.is_ascii_digit() && c != '/').unwrap_or(caps[0].len())..];
            format!("/{{id}}{tail}")
        })
        .to_string();
    result
}

fn truncate_sample(body: &str) -> String {
    let pretty = serde_json::from_str::<serde_json::Value>(body)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|_| body.to_string());

    if pretty.len() <= SAMPLE_DATA_CAP {
        pretty
    } else {
        let mut truncated = pretty.as_bytes()[..SAMPLE_DATA_CAP].to_vec();
        // Avoid splitting a multi-byte UTF-8 sequence.
        while std::str::from_utf8(&truncated).is_err() {
            truncated.pop();
        }
        format!("{}{}", String::from_utf8(truncated).unwrap(), TRUNCATION_MARKER)
    }
}

/// Build a [`DiscoveredApi`] from a captured response if it clears the
/// relevance threshold (§4.2: `searchTermHits > 0 || indicatorHits >= 5`).
pub fn discovered_api(response: &CapturedResponse, search_terms: &[String]) -> Option<DiscoveredApi> {
    if !response.is_json_ok() {
        return None;
    }

    let (search_term_hits, indicator_hits) = count_hits(&response.body, search_terms);
    if search_term_hits == 0 && indicator_hits < MIN_INDICATOR_HITS {
        return None;
    }

    Some(DiscoveredApi {
        url: response.url.clone(),
        method: response.method.clone(),
        content_type: response.content_type.clone(),
        response_size: response.body.len(),
        match_count: search_term_hits + indicator_hits,
        structure_hint: structure_hint(&response.body),
        url_pattern: Some(url_pattern(&response.url)),
        sample_data: Some(truncate_sample(&response.body)),
    })
}
