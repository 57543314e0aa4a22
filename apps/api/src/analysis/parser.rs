//! Response Parser: scrapes a match percentage and keyword lists out of the
//! model's free text.
//!
//! Nothing here can fail. Every rule is a heuristic over formatting the model
//! is asked for but not bound to produce; whatever cannot be read is left
//! empty and the raw narrative is always kept.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::ai_client::strip_json_fences;
use crate::analysis::models::{AnalysisResult, KeywordSet};

/// A number directly followed by `%`, never the tail of a longer number.
static PERCENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^0-9])([0-9]+(?:\.[0-9]+)?)\s*%").expect("percent pattern is valid")
});

static LIST_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*•+▪◦]|[0-9]{1,2}[.)])\s+").expect("list marker pattern is valid")
});

const MATCHED_HEADER_WORDS: &[&str] = &["matched", "matching", "present"];
const MISSING_HEADER_WORDS: &[&str] = &["missing", "gap", "lacking", "absent"];

/// Bullet prefixes that name a category rather than a keyword,
/// e.g. `Tools: Terraform, Helm`.
const CATEGORY_WORDS: &[&str] = &[
    "skill",
    "tool",
    "technolog",
    "certification",
    "language",
    "framework",
    "platform",
    "term",
    "keyword",
    "technical",
    "soft",
    "domain",
    "industry",
];

const MAX_HEADER_CHARS: usize = 60;
const MAX_HEADER_WORDS: usize = 6;
const MAX_ITEM_CHARS: usize = 80;
/// Longest item accepted from a line without a list marker; anything wordier
/// is prose.
const MAX_INLINE_ITEM_WORDS: usize = 4;
const EMPTY_ITEMS: &[&str] = &["none", "n/a", "na", "nothing", "-"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Matched,
    Missing,
}

/// Parses a raw AI response into an `AnalysisResult`.
pub fn parse_response(raw: &str) -> AnalysisResult {
    if let Some(result) = parse_json_response(raw) {
        return result;
    }

    let (matched, missing) = extract_keyword_sections(raw);
    AnalysisResult {
        match_percentage: extract_percentage(raw),
        matched_keywords: matched,
        missing_keywords: missing,
        raw_narrative: raw.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Percentage
// ────────────────────────────────────────────────────────────────────────────

/// Prefers a percentage on a line that talks about the match, then falls back
/// to the first percentage anywhere. Rounds decimals and clamps to 0–100.
pub fn extract_percentage(text: &str) -> Option<u8> {
    text.lines()
        .filter(|line| line.to_lowercase().contains("match"))
        .find_map(first_percentage)
        .or_else(|| first_percentage(text))
}

fn first_percentage(text: &str) -> Option<u8> {
    PERCENT
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .find_map(|m| m.as_str().parse::<f64>().ok())
        .map(clamp_percentage)
}

fn clamp_percentage(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

// ────────────────────────────────────────────────────────────────────────────
// Keyword sections
// ────────────────────────────────────────────────────────────────────────────

fn extract_keyword_sections(text: &str) -> (Vec<String>, Vec<String>) {
    let mut matched = KeywordSet::default();
    let mut missing = KeywordSet::default();

    let mut current: Option<Section> = None;
    let mut items_in_section = 0usize;
    // Indentation of the section's first bullet; a shallower bullet is the
    // next outline entry, not an item.
    let mut item_indent: Option<usize> = None;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if let Some((section, inline)) = keyword_header(line) {
            items_in_section = 0;
            item_indent = None;
            if is_placeholder(inline) {
                current = None;
                continue;
            }
            current = Some(section);
            let target = match section {
                Section::Matched => &mut matched,
                Section::Missing => &mut missing,
            };
            for item in split_list(inline) {
                target.insert(&item);
                items_in_section += 1;
            }
            continue;
        }

        let Some(section) = current else {
            continue;
        };

        let is_bullet = LIST_MARKER.is_match(line);
        if !is_bullet && (looks_like_heading(line) || items_in_section > 0) {
            current = None;
            continue;
        }
        if is_bullet {
            let indent = line.len() - line.trim_start().len();
            match item_indent {
                Some(expected) if indent < expected => {
                    current = None;
                    continue;
                }
                None => item_indent = Some(indent),
                Some(_) => {}
            }
        }

        let content = LIST_MARKER.replace(line, "");
        // "None." ends the section; so does a sentence where items were expected.
        if is_placeholder(&content) || (!is_bullet && !looks_like_inline_list(&content)) {
            current = None;
            continue;
        }

        let target = match section {
            Section::Matched => &mut matched,
            Section::Missing => &mut missing,
        };
        let items = if is_bullet {
            bullet_items(&content)
        } else {
            split_list(&content)
        };
        for item in items {
            target.insert(&item);
            items_in_section += 1;
        }
    }

    (matched.into_vec(), missing.into_vec())
}

/// Recognises a short label line naming a keyword section. Returns the
/// section and whatever follows the label's colon on the same line.
fn keyword_header(line: &str) -> Option<(Section, &str)> {
    let stripped = LIST_MARKER.replace(line, "");
    let offset = line.len() - stripped.len();
    let body = &line[offset..];

    let (label, inline) = match body.find(':') {
        Some(idx) => (&body[..idx], &body[idx + 1..]),
        None if looks_like_heading(line) || is_numbered(line) => (body, ""),
        None => return None,
    };

    let label = clean_markup(label).to_lowercase();
    let label = label.trim_start_matches('#').trim();
    if label.is_empty()
        || label.chars().count() > MAX_HEADER_CHARS
        || label.split_whitespace().count() > MAX_HEADER_WORDS
    {
        return None;
    }

    let section = if MISSING_HEADER_WORDS.iter().any(|w| label.contains(w)) {
        Section::Missing
    } else if MATCHED_HEADER_WORDS.iter().any(|w| label.contains(w)) {
        Section::Matched
    } else {
        return None;
    };
    Some((section, inline))
}

/// Markdown heading, fully bold line, or a line ending in a colon.
fn looks_like_heading(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('#')
        || trimmed.ends_with(':')
        || (trimmed.len() > 4
            && ((trimmed.starts_with("**") && trimmed.trim_end_matches(':').ends_with("**"))
                || (trimmed.starts_with("__") && trimmed.trim_end_matches(':').ends_with("__"))))
}

/// `2. Missing keywords` style section titles from numbered outlines.
fn is_numbered(line: &str) -> bool {
    line.trim_start().starts_with(|c: char| c.is_ascii_digit())
}

/// Items carried by one bullet line.
fn bullet_items(content: &str) -> Vec<String> {
    let content = clean_markup(content);

    if let Some((left, right)) = content.split_once(':') {
        let left_lower = left.to_lowercase();
        let right_is_list = right.contains(',') || right.contains(';');
        if right_is_list || CATEGORY_WORDS.iter().any(|w| left_lower.contains(w)) {
            return split_list(right);
        }
        return clean_item(left).into_iter().collect();
    }

    for separator in [" - ", " – ", " — "] {
        if let Some((left, _)) = content.split_once(separator) {
            return clean_item(left).into_iter().collect();
        }
    }

    split_list(&content)
}

/// Splits a comma/semicolon separated run of items.
fn split_list(text: &str) -> Vec<String> {
    clean_markup(text)
        .split([',', ';'])
        .filter_map(clean_item)
        .collect()
}

/// Short comma separated chunks, not a sentence.
fn looks_like_inline_list(text: &str) -> bool {
    let text = clean_markup(text);
    let text = text.trim();
    if text.ends_with(['!', '?']) {
        return false;
    }
    let chunks: Vec<&str> = text.split([',', ';']).map(str::trim).collect();
    let last = chunks.len() - 1;
    chunks.iter().enumerate().all(|(i, chunk)| {
        let words = chunk.split_whitespace().count();
        let ends_sentence = chunk.ends_with(['.', '!', '?']);
        words <= MAX_INLINE_ITEM_WORDS && (!ends_sentence || (i == last && words <= 2))
    })
}

/// `None`, `N/A`, `None identified.` and the like.
fn is_placeholder(text: &str) -> bool {
    let text = clean_markup(text).to_lowercase();
    let text = text.trim().trim_end_matches(['.', '!']).trim();
    EMPTY_ITEMS.contains(&text) || text.starts_with("none ")
}

fn clean_item(raw: &str) -> Option<String> {
    let item = raw
        .trim()
        .trim_end_matches(['.', ','])
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim();

    if item.is_empty()
        || item.chars().count() > MAX_ITEM_CHARS
        || !item.chars().any(char::is_alphabetic)
        || EMPTY_ITEMS.contains(&item.to_lowercase().as_str())
    {
        return None;
    }
    Some(item.to_string())
}

fn clean_markup(text: &str) -> String {
    text.replace("**", "").replace("__", "").replace('`', "")
}

// ────────────────────────────────────────────────────────────────────────────
// JSON responses
// ────────────────────────────────────────────────────────────────────────────

/// Some models answer with a JSON object even when asked for prose, in the
/// shape of `{"match_percentage": 85, "strengths": [...], "gaps": [...]}`,
/// possibly wrapped in `{"rankings": [...]}`.
fn parse_json_response(raw: &str) -> Option<AnalysisResult> {
    let text = strip_json_fences(raw);
    if !text.starts_with('{') {
        return None;
    }
    let value: Value = serde_json::from_str(text).ok()?;

    let object = match value.get("rankings").and_then(Value::as_array) {
        Some(rankings) => rankings.first()?.clone(),
        None => value,
    };

    let match_percentage = ["match_percentage", "matchPercentage", "match_score"]
        .iter()
        .find_map(|key| object.get(*key))
        .and_then(json_percentage);
    let matched = json_list(&object, &["matched_keywords", "present_keywords", "strengths"]);
    let missing = json_list(&object, &["missing_keywords", "gaps"]);

    if match_percentage.is_none() && matched.is_none() && missing.is_none() {
        return None;
    }

    Some(AnalysisResult {
        match_percentage,
        matched_keywords: matched.unwrap_or_default(),
        missing_keywords: missing.unwrap_or_default(),
        raw_narrative: raw.to_string(),
    })
}

fn json_percentage(value: &Value) -> Option<u8> {
    match value {
        Value::Number(n) => n.as_f64().map(clamp_percentage),
        Value::String(s) => first_percentage(s).or_else(|| {
            s.trim()
                .trim_end_matches('%')
                .parse::<f64>()
                .ok()
                .map(clamp_percentage)
        }),
        _ => None,
    }
}

fn json_list(object: &Value, keys: &[&str]) -> Option<Vec<String>> {
    let array = keys
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_array))?;
    let set: KeywordSet = array.iter().filter_map(Value::as_str).collect();
    Some(set.into_vec())
}
