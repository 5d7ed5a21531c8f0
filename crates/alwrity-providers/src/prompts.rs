//! Prompt construction and response parsing for content generation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use alwrity_core::{Error, Result, SectionType};

use crate::types::{OutlineRequest, PlannedSection, SectionRequest};

/// Neighbor text beyond this many characters is cut from section prompts.
pub const NEIGHBOR_EXCERPT_CHARS: usize = 1500;

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("valid regex"));

pub const OUTLINE_SYSTEM_PROMPT: &str = "You are an SEO content strategist. \
Respond with a JSON array only. Each element has: title (string), keywords (array of strings), \
wordCount (integer), keyPoints (array of strings), sectionType (one of introduction, body, \
conclusion, faq, case_study) and optimizationScore (integer 0-100).";

pub const SECTION_SYSTEM_PROMPT: &str = "You are an expert blog writer. Write only the body \
text of the requested section in plain prose. Do not repeat the section title. Connect \
naturally with the surrounding sections you are given.";

/// User prompt asking for an outline.
pub fn outline_prompt(request: &OutlineRequest) -> Result<String> {
    let subject = request
        .subject()
        .ok_or_else(|| Error::InvalidInput("outline needs a title or query".into()))?;

    let mut prompt = format!(
        "Create a {} blog outline for: \"{}\".\n",
        request.outline_structure, subject
    );
    if let (Some(title), Some(query)) = (&request.title, &request.query) {
        if title != query {
            prompt.push_str(&format!("Target search query: \"{}\".\n", query));
        }
    }
    if let Some(insights) = &request.gsc_insights {
        prompt.push_str("Search Console insights to address:\n");
        prompt.push_str(&serde_json::to_string_pretty(insights)?);
        prompt.push('\n');
    }
    prompt.push_str("Start with an introduction and end with a conclusion.");
    Ok(prompt)
}

/// User prompt asking for one section, with neighbor excerpts for continuity.
pub fn section_prompt(request: &SectionRequest) -> String {
    let mut prompt = format!(
        "Write the {} section titled \"{}\".\n",
        request.section_type, request.title
    );
    if !request.keywords.is_empty() {
        prompt.push_str(&format!("Work in these keywords: {}.\n", request.keywords.join(", ")));
    }
    if !request.global_context.trim().is_empty() {
        prompt.push_str(&format!("Article context: {}\n", request.global_context.trim()));
    }
    if let Some(prev) = &request.previous_content {
        prompt.push_str(&format!(
            "\nThe previous section ends the reader here:\n{}\n",
            tail_excerpt(prev, NEIGHBOR_EXCERPT_CHARS)
        ));
    }
    if let Some(next) = &request.next_content {
        prompt.push_str(&format!(
            "\nThe next section begins like this:\n{}\n",
            head_excerpt(next, NEIGHBOR_EXCERPT_CHARS)
        ));
    }
    prompt
}

fn head_excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn tail_excerpt(text: &str, max_chars: usize) -> &str {
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    match text.char_indices().nth(total - max_chars) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

/// Parse a provider reply into planned sections.
///
/// Accepts a bare JSON array, an object with a `sections` array, and either
/// wrapped in a markdown code fence. Unknown section types become `body`.
pub fn parse_outline(raw: &str) -> Result<Vec<PlannedSection>> {
    let body = CODE_FENCE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or_else(|| raw.trim());

    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::Provider(format!("outline is not valid JSON: {}", e)))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("sections") {
            Some(Value::Array(items)) => items,
            _ => return Err(Error::Provider("outline JSON has no sections array".into())),
        },
        _ => return Err(Error::Provider("outline JSON is not an array".into())),
    };

    items
        .into_iter()
        .map(|mut item| {
            normalize_section_type(&mut item);
            serde_json::from_value::<PlannedSection>(item)
                .map_err(|e| Error::Provider(format!("malformed outline section: {}", e)))
        })
        .collect()
}

fn normalize_section_type(item: &mut Value) {
    let Some(obj) = item.as_object_mut() else {
        return;
    };
    let raw = obj
        .remove("sectionType")
        .or_else(|| obj.remove("section_type"))
        .and_then(|v| v.as_str().map(str::to_string));
    let section_type = raw
        .and_then(|s| s.parse::<SectionType>().ok())
        .unwrap_or_default();
    obj.insert("sectionType".into(), Value::String(section_type.to_string()));
}

/// Trim a generated section and drop a leading markdown heading.
pub fn clean_section_text(raw: &str) -> String {
    let trimmed = raw.trim();
    let body = match trimmed.split_once('\n') {
        Some((first, rest)) if first.trim_start().starts_with('#') => rest,
        None if trimmed.starts_with('#') => "",
        _ => trimmed,
    };
    body.trim().to_string()
}
