use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{ClassificationResult, Flagged, LabelVector};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in response")]
    NoObject,
    #[error("malformed JSON object: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Turns raw model replies into canonical [`ClassificationResult`]s.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    with_confidence: bool,
}

impl Normalizer {
    pub fn new(with_confidence: bool) -> Self {
        Self { with_confidence }
    }

    pub fn safe_default(&self, uid: &str, content: &str) -> ClassificationResult {
        ClassificationResult::safe_default(uid, content, self.with_confidence)
    }

    pub fn normalize(
        &self,
        raw: &str,
        uid: &str,
        content: &str,
    ) -> Result<ClassificationResult, ParseError> {
        let object = extract_object(raw)?;

        let empty = Map::new();
        let vector = object
            .get("labels_spam_vector")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let flag = |key: &str| vector.get(key).map(coerce_flag).unwrap_or(false);
        let conditional = |key: &str| flag(key).then_some(Flagged);

        let labels_spam_vector = LabelVector {
            keyword_spam: flag("keyword_spam"),
            malicious_links: flag("malicious_links"),
            ads: flag("ads"),
            wrong_language: conditional("wrong_language"),
            unreadable: conditional("unreadable"),
        };

        let confidence_score = if self.with_confidence {
            object.get("confidence_score").map(coerce_confidence)
        } else {
            None
        };

        let mut result = ClassificationResult {
            uid: uid.to_string(),
            content: content.to_string(),
            labels_spam: object.get("labels_spam").map(coerce_flag).unwrap_or(false),
            labels_spam_vector,
            confidence_score,
        };
        apply_hierarchy(&mut result);
        Ok(result)
    }
}

/// Parses the span between the first `{` and the last `}` of `raw`.
pub fn extract_object(raw: &str) -> Result<Map<String, Value>, ParseError> {
    let start = raw.find('{').ok_or(ParseError::NoObject)?;
    let end = raw.rfind('}').ok_or(ParseError::NoObject)?;
    if end < start {
        return Err(ParseError::NoObject);
    }
    Ok(serde_json::from_str(&raw[start..=end])?)
}

/// Total coercion of a loosely typed flag: true exactly when the value denotes one.
///
/// Non-integral floats are never one: `1.5` coerces to false rather than
/// truncating to 1.
pub fn coerce_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => match n.as_i64() {
            Some(i) => i == 1,
            None => n.as_f64() == Some(1.0),
        },
        Value::String(s) => s.trim().parse::<i64>().map(|i| i == 1).unwrap_or(false),
        _ => false,
    }
}

/// Coerces a confidence value to an integer clamped into `1..=5`.
pub fn coerce_confidence(value: &Value) -> u8 {
    let raw: i64 = match value {
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(5),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or(5),
        _ => 5,
    };
    raw.clamp(1, 5) as u8
}

/// Language mismatch, then unreadability, supersede the content flags;
/// otherwise the overall verdict is the OR of the content flags.
pub fn apply_hierarchy(result: &mut ClassificationResult) {
    let labels = &mut result.labels_spam_vector;
    if labels.has_override() {
        if labels.is_wrong_language() {
            labels.unreadable = None;
        }
        labels.clear_content_flags();
        result.labels_spam = false;
    } else {
        result.labels_spam = labels.any_content_flag();
    }
}
