use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::ClassificationResult;

const REQUIRED_FIELDS: [&str; 4] = ["uid", "content", "labels_spam", "labels_spam_vector"];
const CONTENT_FLAGS: [&str; 3] = ["keyword_spam", "malicious_links", "ads"];
const CONDITIONAL_FLAGS: [&str; 2] = ["wrong_language", "unreadable"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    pub index: usize,
    pub uid: String,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    pub total_results: usize,
    pub valid_results: usize,
    pub schema_issues: Vec<SchemaIssue>,
    pub schema_valid: bool,
}

/// Audits typed results in their persisted JSON form.
pub fn validate_results(results: &[ClassificationResult]) -> SchemaReport {
    let records: Vec<Value> = results
        .iter()
        .map(|result| serde_json::to_value(result).unwrap_or(Value::Null))
        .collect();
    validate_records(&records)
}

/// Read-only audit of output records; nothing is repaired or dropped.
pub fn validate_records(records: &[Value]) -> SchemaReport {
    let schema_issues: Vec<SchemaIssue> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let issues = check_record(record);
            if issues.is_empty() {
                return None;
            }
            let uid = record
                .get("uid")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            Some(SchemaIssue { index, uid, issues })
        })
        .collect();

    let total_results = records.len();
    SchemaReport {
        total_results,
        valid_results: total_results - schema_issues.len(),
        schema_valid: schema_issues.is_empty(),
        schema_issues,
    }
}

fn check_record(record: &Value) -> Vec<String> {
    let Some(object) = record.as_object() else {
        return vec!["Record is not a JSON object".to_string()];
    };

    let mut issues = Vec::new();
    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            issues.push(format!("Missing required field: {field}"));
        }
    }

    let labels_spam = object.get("labels_spam").map(|value| {
        let bit = as_bit(value);
        if bit.is_none() {
            issues.push(format!("Invalid labels_spam value: {value} (must be 0 or 1)"));
        }
        bit
    });

    if let Some(vector) = object.get("labels_spam_vector") {
        match vector.as_object() {
            Some(labels) => check_vector(labels, labels_spam.flatten(), &mut issues),
            None => issues.push("labels_spam_vector must be an object".to_string()),
        }
    }

    if let Some(confidence) = object.get("confidence_score") {
        let in_range = confidence
            .as_i64()
            .is_some_and(|score| (1..=5).contains(&score));
        if !in_range {
            issues.push(format!("Invalid confidence_score: {confidence} (must be 1-5)"));
        }
    }

    issues
}

fn check_vector(labels: &Map<String, Value>, labels_spam: Option<bool>, issues: &mut Vec<String>) {
    let mut content = Vec::with_capacity(CONTENT_FLAGS.len());
    for cat in CONTENT_FLAGS {
        match labels.get(cat) {
            None => issues.push(format!("Missing required spam category: {cat}")),
            Some(value) => match as_bit(value) {
                Some(bit) => content.push(bit),
                None => issues.push(format!("Invalid value for {cat}: {value} (must be 0 or 1)")),
            },
        }
    }

    let mut overrides = Vec::with_capacity(CONDITIONAL_FLAGS.len());
    for cat in CONDITIONAL_FLAGS {
        match labels.get(cat).map(|value| (value, as_bit(value))) {
            None => overrides.push(false),
            Some((_, Some(true))) => overrides.push(true),
            Some((_, Some(false))) => {
                issues.push(format!("{cat} should not be present when value is 0"));
                overrides.push(false);
            }
            Some((value, None)) => {
                issues.push(format!("Invalid value for {cat}: {value} (must be 1 when present)"));
                overrides.push(false);
            }
        }
    }

    if overrides.iter().all(|set| *set) {
        issues.push("Both wrong_language and unreadable cannot be 1 simultaneously".to_string());
    }

    let any_override = overrides.iter().any(|set| *set);
    let any_content = content.iter().any(|set| *set);
    if any_override && any_content {
        issues.push("Content flags must be 0 when wrong_language or unreadable is 1".to_string());
    }
    if let Some(labels_spam) = labels_spam {
        let complete = content.len() == CONTENT_FLAGS.len();
        let expected = !any_override && any_content;
        if complete && labels_spam != expected {
            issues.push(format!(
                "labels_spam is {} but label vector implies {}",
                u8::from(labels_spam),
                u8::from(expected)
            ));
        }
    }
}

/// Strict 0/1 integer check; booleans and strings are not accepted.
fn as_bit(value: &Value) -> Option<bool> {
    match value.as_u64() {
        Some(0) => Some(false),
        Some(1) => Some(true),
        _ => None,
    }
}
