//! Tolerant JSON extraction from model output.
//!
//! Models asked for JSON frequently wrap it in prose or code fences. The
//! chain here tries a direct parse, then the first fenced block, then the
//! widest bracket span, before the caller falls back to a default.

use serde_json::Value;

/// Pull a JSON value out of raw model text.
#[must_use]
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if let Some(block) = fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(block.trim()) {
            return Some(value);
        }
    }

    bracket_span(trimmed, '{', '}')
        .or_else(|| bracket_span(trimmed, '[', ']'))
}

/// Like [`extract_json`], but returns `default` when nothing parses.
#[must_use]
pub fn extract_json_or(text: &str, default: Value) -> Value {
    extract_json(text).unwrap_or(default)
}

/// Contents of the first ``` fence, skipping an optional language tag.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let body_start = after_fence.find('\n').map_or(0, |pos| pos + 1);
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

/// Widest span between the first opening and last closing bracket that
/// parses as JSON.
fn bracket_span(text: &str, open: char, close: char) -> Option<Value> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Coerce a field into a list of trimmed strings. Accepts a JSON array or
/// a newline-separated string with optional bullet markers.
#[must_use]
pub fn string_list(value: &Value, key: &str) -> Vec<String> {
    let Some(field) = value.get(key) else {
        return Vec::new();
    };
    match field {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.trim().to_string()),
                Value::Number(num) => Some(num.to_string()),
                _ => None,
            })
            .filter(|text| !text.is_empty())
            .collect(),
        Value::String(text) => text
            .lines()
            .map(strip_bullet)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn strip_bullet(line: &str) -> &str {
    line.trim()
        .trim_start_matches(['-', '*', '•'])
        .trim_start()
}

/// A string field, trimmed, or `None` when absent or empty.
#[must_use]
pub fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
}

/// Canonical sentiment labels.
pub const LABEL_POSITIVE: &str = "positive";
pub const LABEL_NEUTRAL: &str = "neutral";
pub const LABEL_NEGATIVE: &str = "negative";

/// Map a free-form sentiment label onto the canonical three.
#[must_use]
pub fn normalize_label(raw: &str) -> Option<&'static str> {
    match raw.trim().to_lowercase().as_str() {
        "positive" | "positivo" | "positiva" | "pos" | "+" => Some(LABEL_POSITIVE),
        "negative" | "negativo" | "negativa" | "neg" | "-" => Some(LABEL_NEGATIVE),
        "neutral" | "neutro" | "neutra" | "neu" | "0" => Some(LABEL_NEUTRAL),
        _ => None,
    }
}

/// Sentiment shares, guaranteed non-negative and summing to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentRatio {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

impl Default for SentimentRatio {
    /// Even split used when the model output is unusable.
    fn default() -> Self {
        Self {
            positive: 0.33,
            neutral: 0.34,
            negative: 0.33,
        }
    }
}

impl SentimentRatio {
    /// Normalize raw shares. Negative or non-finite inputs are treated as
    /// zero; a zero sum falls back to the even split.
    #[must_use]
    pub fn normalize(positive: f64, neutral: f64, negative: f64) -> Self {
        let clean = |value: f64| if value.is_finite() && value > 0.0 { value } else { 0.0 };
        let positive = clean(positive);
        let neutral = clean(neutral);
        let negative = clean(negative);
        let sum = positive + neutral + negative;
        if sum <= 0.0 {
            return Self::default();
        }
        Self {
            positive: positive / sum,
            neutral: neutral / sum,
            negative: negative / sum,
        }
    }

    /// Read a ratio out of extracted JSON, accepting synonym keys.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let mut positive = 0.0;
        let mut neutral = 0.0;
        let mut negative = 0.0;
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        for (key, entry) in map {
            let Some(share) = number_like(entry) else {
                continue;
            };
            match normalize_label(key) {
                Some(LABEL_POSITIVE) => positive += share,
                Some(LABEL_NEGATIVE) => negative += share,
                Some(LABEL_NEUTRAL) => neutral += share,
                _ => {}
            }
        }
        Self::normalize(positive, neutral, negative)
    }
}

fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(num) => num.as_f64(),
        Value::String(text) => text.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    }
}

/// Clip text to `max_chars` characters on a character boundary.
#[must_use]
pub fn clip(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
