//! Response sanitization and tolerant JSON extraction.
//!
//! Model output is free text that usually, but not always, contains a JSON
//! object with a `questions` array. The extractor recovers that array or
//! reports why it could not.

use serde_json::{Map, Value};
use thiserror::Error;

/// Maximum allowed response length (100KB).
pub const MAX_RESPONSE_LENGTH: usize = 100_000;

/// Maximum length for individual string fields in extracted data (10KB).
pub const MAX_FIELD_LENGTH: usize = 10_000;

/// Key of the array every generation and reconciliation payload carries.
pub const QUESTIONS_KEY: &str = "questions";

/// Errors that can occur during sanitization.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SanitizationError {
    #[error("Response too long: {actual} bytes exceeds maximum of {max} bytes")]
    TooLong { max: usize, actual: usize },

    #[error("Invalid UTF-8 encoding at byte position {position}")]
    InvalidUtf8 { position: usize },
}

/// Errors that can occur during data extraction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Sanitization failed: {0}")]
    Sanitization(#[from] SanitizationError),

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Sanitizes model responses before parsing.
#[derive(Debug, Clone, Default)]
pub struct ResponseSanitizer {
    /// Additional prompt injection patterns to strip.
    additional_patterns: Vec<String>,
}

impl ResponseSanitizer {
    /// Creates a new sanitizer with default patterns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds additional patterns to strip from responses.
    pub fn with_additional_patterns(mut self, patterns: Vec<String>) -> Self {
        self.additional_patterns = patterns;
        self
    }

    /// Sanitizes a model response.
    ///
    /// # Steps
    /// 1. Validate length
    /// 2. Remove control characters (except newlines/tabs)
    /// 3. Strip chat-template markers
    /// 4. Reject replacement characters left by lossy decoding
    pub fn sanitize(&self, response: &str) -> Result<String, SanitizationError> {
        if response.len() > MAX_RESPONSE_LENGTH {
            return Err(SanitizationError::TooLong {
                max: MAX_RESPONSE_LENGTH,
                actual: response.len(),
            });
        }

        let cleaned: String = response
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
            .collect();

        let stripped = self.strip_injection_markers(&cleaned);

        if let Some(position) = stripped.find('\u{FFFD}') {
            return Err(SanitizationError::InvalidUtf8 { position });
        }

        Ok(stripped)
    }

    fn strip_injection_markers(&self, s: &str) -> String {
        let patterns = [
            "```system",
            "```assistant",
            "[INST]",
            "[/INST]",
            "<|system|>",
            "<|assistant|>",
            "<|user|>",
            "<|im_start|>",
            "<|im_end|>",
            "<<SYS>>",
            "<</SYS>>",
        ];

        let mut result = s.to_string();
        for pattern in patterns {
            result = result.replace(pattern, "");
        }
        for pattern in &self.additional_patterns {
            result = result.replace(pattern, "");
        }
        result
    }
}

/// Recovers the `questions` payload from model output.
#[derive(Debug, Clone, Default)]
pub struct DataExtractor {
    sanitizer: ResponseSanitizer,
}

impl DataExtractor {
    /// Creates a new extractor with default sanitizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an extractor with a custom sanitizer.
    pub fn with_sanitizer(sanitizer: ResponseSanitizer) -> Self {
        Self { sanitizer }
    }

    /// Extracts the JSON object that carries a `questions` array.
    ///
    /// # Steps
    /// 1. Sanitize the raw response
    /// 2. Collect candidates: a fenced ```json block, then the span from the
    ///    first `{` to the last `}`
    /// 3. Parse each candidate; on failure unescape one string level and
    ///    parse again
    /// 4. Require a `questions` array on the parsed object
    /// 5. Sanitize every string value
    ///
    /// # Errors
    ///
    /// - `ParseError` if no candidate parses as a JSON object
    /// - `MissingField("questions")` if JSON was found but has no such array
    pub fn extract_payload(&self, response: &str) -> Result<Map<String, Value>, ExtractionError> {
        let sanitized = self.sanitizer.sanitize(response)?;

        let mut parsed_any = false;
        let mut last_error = String::from("no JSON object found");

        for candidate in json_candidates(&sanitized) {
            match parse_lenient(&candidate) {
                Ok(Value::Object(map)) => {
                    parsed_any = true;
                    if matches!(map.get(QUESTIONS_KEY), Some(Value::Array(_))) {
                        return match sanitize_json_strings(Value::Object(map)) {
                            Value::Object(clean) => Ok(clean),
                            _ => Err(ExtractionError::ParseError(
                                "payload is not an object".to_string(),
                            )),
                        };
                    }
                }
                Ok(_) => {
                    parsed_any = true;
                }
                Err(e) => last_error = e,
            }
        }

        if parsed_any {
            Err(ExtractionError::MissingField(QUESTIONS_KEY.to_string()))
        } else {
            Err(ExtractionError::ParseError(last_error))
        }
    }

    /// Extracts only the `questions` array, order preserved.
    pub fn extract_questions(&self, response: &str) -> Result<Vec<Value>, ExtractionError> {
        let mut payload = self.extract_payload(response)?;
        match payload.remove(QUESTIONS_KEY) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ExtractionError::MissingField(QUESTIONS_KEY.to_string())),
        }
    }
}

/// Candidate substrings in the order they are tried.
fn json_candidates(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    let mut candidates = Vec::with_capacity(3);

    if let Some(block) = extract_from_code_block(trimmed) {
        candidates.push(block);
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            candidates.push(trimmed[start..=end].to_string());
        }
    }

    // A response that is one JSON string literal wrapping the whole payload.
    if trimmed.starts_with('"') {
        candidates.push(trimmed.to_string());
    }

    candidates.dedup();
    candidates
}

fn extract_from_code_block(s: &str) -> Option<String> {
    let lower = s.to_ascii_lowercase();
    let start = lower.find("```json")?;
    let body_start = start + "```json".len();
    let end = s[body_start..].find("```")?;
    Some(s[body_start..body_start + end].trim().to_string())
}

/// Parses JSON, falling back to one level of string unescaping.
fn parse_lenient(candidate: &str) -> Result<Value, String> {
    let first_error = match serde_json::from_str::<Value>(candidate) {
        Ok(Value::String(inner)) => return serde_json::from_str(&inner).map_err(|e| e.to_string()),
        Ok(value) => return Ok(value),
        Err(e) => e.to_string(),
    };

    let unescaped: String = serde_json::from_str(&format!("\"{}\"", candidate))
        .map_err(|_| first_error.clone())?;
    serde_json::from_str(&unescaped).map_err(|_| first_error)
}

/// Key of the user's answer inside a field record. Its text is kept verbatim.
const ANSWER_KEY: &str = "answer";

/// Recursively sanitizes all string values in JSON.
///
/// Answers are only length-capped; every other string also loses
/// well-formed markup tags.
fn sanitize_json_strings(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(truncate_field(strip_html_tags(&s))),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_json_strings).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let clean = match v {
                        Value::String(text) if k == ANSWER_KEY => Value::String(truncate_field(text)),
                        other => sanitize_json_strings(other),
                    };
                    (k, clean)
                })
                .collect(),
        ),
        other => other,
    }
}

fn truncate_field(s: String) -> String {
    if s.len() <= MAX_FIELD_LENGTH {
        return s;
    }
    let mut cut = MAX_FIELD_LENGTH;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...[truncated]", &s[..cut])
}

/// Removes well-formed markup tags: `<name>`, `</name>`, `<name/>` and
/// `<name attr="...">`. Anything else containing `<` is left alone.
fn strip_html_tags(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(open) = rest.find('<') {
        result.push_str(&rest[..open]);
        let tail = &rest[open..];
        match tag_len(tail) {
            Some(len) => rest = &tail[len..],
            None => {
                result.push('<');
                rest = &tail[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// Byte length of the tag at the start of `s`, if it is one.
fn tag_len(s: &str) -> Option<usize> {
    let close = s.find('>')?;
    let inner = &s[1..close];
    if inner.contains('<') {
        return None;
    }

    let body = inner.strip_prefix('/').unwrap_or(inner);
    let body = body.strip_suffix('/').unwrap_or(body);
    let name_end = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(body.len());
    let (name, attrs) = body.split_at(name_end);

    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let attrs_ok = attrs.is_empty()
        || (attrs.starts_with(char::is_whitespace) && (attrs.trim().is_empty() || attrs.contains('=')));
    attrs_ok.then_some(close + 1)
}
