use concierge_models::Route;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::analyst::QueryPlan;
use crate::error::AgentError;

/// Extract the first JSON object from a string that may contain surrounding text.
///
/// Handles common model response formats:
/// - Clean JSON: `{"key": "value"}`
/// - Markdown-wrapped: ```json\n{"key": "value"}\n```
/// - Prefix text: `Here is the analysis:\n{"key": "value"}`
pub fn extract_json(text: &str) -> Result<String, AgentError> {
    let trimmed = text.trim();

    // Try parsing the whole thing as JSON first
    if trimmed.starts_with('{') && serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return Ok(trimmed.to_string());
    }

    // Try extracting from markdown code block
    if let Some(json_str) = extract_from_markdown_block(trimmed) {
        if serde_json::from_str::<serde_json::Value>(&json_str).is_ok() {
            return Ok(json_str);
        }
    }

    // Try finding the first { ... } pair using brace matching
    if let Some(json_str) = extract_first_object(trimmed) {
        if serde_json::from_str::<serde_json::Value>(&json_str).is_ok() {
            return Ok(json_str);
        }
    }

    Err(AgentError::Parse(format!(
        "No valid JSON object found in response (length={})",
        text.len()
    )))
}

/// Extract JSON from a markdown code block (```json ... ``` or ``` ... ```)
fn extract_from_markdown_block(text: &str) -> Option<String> {
    // Look for ```json or just ```
    let start_markers = ["```json\n", "```json\r\n", "```\n", "```\r\n"];

    for marker in &start_markers {
        if let Some(start) = text.find(marker) {
            let json_start = start + marker.len();
            if let Some(end) = text[json_start..].find("```") {
                let extracted = text[json_start..json_start + end].trim();
                return Some(extracted.to_string());
            }
        }
    }

    None
}

/// Find the first balanced { ... } in the text.
fn extract_first_object(text: &str) -> Option<String> {
    let mut depth = 0;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        return Some(text[s..=i].to_string());
                    }
                }
            }
            _ => {}
        }
    }

    None
}

/// Map classifier output to a route.
///
/// A JSON object with a string `route` field is preferred; otherwise the raw
/// text is searched. Labels are matched as case-sensitive substrings in
/// [`Route::PRIORITY`] order, so the first label found wins.
pub fn parse_route(raw: &str) -> Route {
    let from_json = extract_json(raw)
        .ok()
        .and_then(|json| serde_json::from_str::<serde_json::Value>(&json).ok())
        .and_then(|value| value.get("route").and_then(|r| r.as_str()).map(str::to_string));
    let haystack = from_json.as_deref().unwrap_or(raw);

    Route::PRIORITY
        .into_iter()
        .find(|route| route.label().is_some_and(|label| haystack.contains(label)))
        .unwrap_or(Route::Unknown)
}

static THINK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?think>").expect("static regex"));

/// Remove every `<think>...</think>` span and trim the result.
///
/// Spans may cross lines and nest; a nested span is removed together with its
/// outermost enclosing span. When an opening tag is never closed, everything
/// from it to the last closing tag seen is removed. Stray closing tags and a
/// lone unclosed opening tag are left in place.
pub fn strip_reasoning(text: &str) -> String {
    let mut open: Vec<usize> = Vec::new();
    let mut spans: Vec<(usize, usize)> = Vec::new();
    // Outermost open start up to the latest closing tag while still nested.
    let mut pending: Option<(usize, usize)> = None;

    for tag in THINK_TAG.find_iter(text) {
        if tag.as_str().starts_with("</") {
            let Some(&outer) = open.first() else {
                continue;
            };
            open.pop();
            if open.is_empty() {
                spans.push((outer, tag.end()));
                pending = None;
            } else {
                pending = Some((outer, tag.end()));
            }
        } else {
            open.push(tag.start());
        }
    }
    if !open.is_empty() {
        spans.extend(pending);
    }

    if spans.is_empty() {
        return text.trim().to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end) in spans {
        out.push_str(&text[cursor..start]);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out.trim().to_string()
}

/// Parse an analyst query plan, or `None` if the reply is not one.
pub fn parse_query_plan(raw: &str) -> Option<QueryPlan> {
    let json = extract_json(raw).ok()?;
    serde_json::from_str(&json).ok()
}
