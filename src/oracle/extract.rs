//! JSON extraction from free-text LLM output.
//!
//! Models wrap JSON in code fences, tags or prose. Each [`ParseStrategy`]
//! isolates one candidate; strategies run in a fixed order and the first
//! candidate that parses as JSON wins.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

use super::Judgment;

static FENCED_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```json\s*(.*?)```").expect("valid regex"));
static FENCED_PLAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[a-zA-Z]*\s*(.*?)```").expect("valid regex"));
static XML_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<json>\s*(.*?)\s*</json>").expect("valid regex"));
/// Quoted JSON keys such as `"mentioned":`, which say nothing about the answer.
static JSON_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[A-Za-z_]+"\s*:"#).expect("valid regex"));

/// Confidence assigned when only keywords indicate a mention.
const HEURISTIC_CONFIDENCE: u8 = 60;

/// One way of locating JSON inside model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// ```` ```json ... ``` ````
    FencedJson,
    /// ```` ``` ... ``` ````
    FencedPlain,
    /// `<json>...</json>`
    XmlTagged,
    /// First `{` through last `}`.
    RawObject,
    /// First `[` through last `]`.
    RawArray,
}

impl ParseStrategy {
    /// Strategies in the order they are tried.
    pub const ORDER: [ParseStrategy; 5] = [
        ParseStrategy::FencedJson,
        ParseStrategy::FencedPlain,
        ParseStrategy::XmlTagged,
        ParseStrategy::RawObject,
        ParseStrategy::RawArray,
    ];

    /// Returns the text this strategy would hand to the JSON parser.
    pub fn candidate<'a>(&self, text: &'a str) -> Option<&'a str> {
        match self {
            ParseStrategy::FencedJson => capture(&FENCED_JSON_RE, text),
            ParseStrategy::FencedPlain => capture(&FENCED_PLAIN_RE, text),
            ParseStrategy::XmlTagged => capture(&XML_TAG_RE, text),
            ParseStrategy::RawObject => delimited(text, '{', '}'),
            ParseStrategy::RawArray => delimited(text, '[', ']'),
        }
    }
}

fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

fn delimited(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Extracts the first parseable JSON value from `text`.
pub fn extract_json(text: &str) -> Option<(ParseStrategy, Value)> {
    for strategy in ParseStrategy::ORDER {
        let Some(candidate) = strategy.candidate(text) else {
            continue;
        };
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => {
                debug!("Extracted JSON using {:?}", strategy);
                return Some((strategy, value));
            }
            Err(e) => debug!("{:?} candidate is not valid JSON: {}", strategy, e),
        }
    }
    None
}

/// Turns model output into a judgment, falling back to keyword matching.
pub fn parse_judgment(text: &str) -> Judgment {
    if let Some(judgment) = extract_json(text).and_then(|(_, value)| judgment_from_value(&value))
    {
        return judgment;
    }

    let lower = JSON_KEY_RE.replace_all(text, " ").to_lowercase();
    if lower.contains("not mentioned") {
        return Judgment::not_mentioned();
    }
    if lower.contains("yes") || lower.contains("mentioned") {
        debug!("No JSON in judgment response, keyword fallback matched");
        return Judgment {
            mentioned: true,
            confidence: HEURISTIC_CONFIDENCE,
            competitors_mentioned: Vec::new(),
        };
    }

    Judgment::not_mentioned()
}

fn judgment_from_value(value: &Value) -> Option<Judgment> {
    let object = match value {
        Value::Array(items) => items.iter().find(|v| v.is_object())?,
        other => other,
    };

    let mentioned = match object.get("mentioned")? {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "yes" | "true"),
        Value::Number(n) => n.as_f64().is_some_and(|n| n > 0.0),
        _ => false,
    };

    let confidence = match object.get("confidence") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };

    let competitors_mentioned = object
        .get("competitors_mentioned")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Some(Judgment {
        mentioned,
        confidence: confidence.round().clamp(0.0, 100.0) as u8,
        competitors_mentioned,
    })
}
