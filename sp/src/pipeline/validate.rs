//! Schema matching for candidate payloads
//!
//! The candidate is parsed into a generic `serde_json::Value` first and then
//! matched against the two accepted shapes by hand, so every failure can say
//! exactly which element and field was wrong.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::error::{DEFAULT_SAMPLE_CHARS, ValidationError, sample};
use super::extract::CandidatePayload;

/// Key names of a structured plan record
pub const FIELD_DATE_OR_WEEK: &str = "dateOrWeek";
pub const FIELD_FOCUS: &str = "focus";
pub const FIELD_DETAILS: &str = "details";

/// One structured record as emitted by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRecord {
    pub date_or_week: String,
    pub focus: String,
    pub details: String,
}

/// A payload that matched one of the accepted shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPayload {
    /// Flat list of task strings
    TaskList(Vec<String>),
    /// List of `{dateOrWeek, focus, details}` records
    Records(Vec<PlanRecord>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    Text,
    Record,
}

/// Describe a JSON value's type for error messages
fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn element_kind(value: &Value) -> Option<ElementKind> {
    match value {
        Value::String(_) => Some(ElementKind::Text),
        Value::Object(_) => Some(ElementKind::Record),
        _ => None,
    }
}

/// Matches candidate payloads against the accepted shapes
#[derive(Debug, Clone)]
pub struct ScheduleValidator {
    sample_chars: usize,
}

impl Default for ScheduleValidator {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_CHARS)
    }
}

impl ScheduleValidator {
    pub fn new(sample_chars: usize) -> Self {
        Self { sample_chars }
    }

    /// Parse and schema-match a candidate payload
    ///
    /// Task strings are trimmed and blank ones dropped. Records are strict:
    /// one bad record fails the whole sequence.
    pub fn validate(&self, candidate: &CandidatePayload) -> Result<ParsedPayload, ValidationError> {
        let text = candidate.as_str();
        debug!(len = text.len(), "validate: called");
        let raw_sample = || sample(text, self.sample_chars);

        let value: Value = serde_json::from_str(text).map_err(|e| {
            debug!(error = %e, "validate: parse failed");
            ValidationError::MalformedStructure {
                detail: e.to_string(),
                raw_sample: raw_sample(),
            }
        })?;

        let elements = match value {
            Value::Array(elements) => elements,
            other => {
                debug!("validate: not an array");
                return Err(ValidationError::NotASequence {
                    found: describe(&other),
                    raw_sample: raw_sample(),
                });
            }
        };

        let Some(first) = elements.first() else {
            debug!("validate: empty array");
            return Ok(ParsedPayload::TaskList(Vec::new()));
        };

        let Some(kind) = element_kind(first) else {
            return Err(ValidationError::InconsistentShape {
                index: 0,
                found: describe(first),
                expected: "a string or an object",
                raw_sample: raw_sample(),
            });
        };

        let expected = describe(first);
        if let Some((index, odd)) = elements
            .iter()
            .enumerate()
            .find(|(_, v)| element_kind(v) != Some(kind))
        {
            debug!(index, "validate: mixed element kinds");
            return Err(ValidationError::InconsistentShape {
                index,
                found: describe(odd),
                expected,
                raw_sample: raw_sample(),
            });
        }

        match kind {
            ElementKind::Text => {
                let tasks: Vec<String> = elements
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect();
                debug!(count = tasks.len(), dropped = elements.len() - tasks.len(), "validate: task list");
                Ok(ParsedPayload::TaskList(tasks))
            }
            ElementKind::Record => {
                let records = elements
                    .iter()
                    .enumerate()
                    .map(|(index, value)| {
                        to_record(value).map_err(|field| {
                            debug!(index, field, "validate: incomplete record");
                            ValidationError::IncompleteRecord {
                                index,
                                field,
                                raw_sample: raw_sample(),
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                debug!(count = records.len(), "validate: records");
                Ok(ParsedPayload::Records(records))
            }
        }
    }
}

/// Non-empty trimmed text field, or the field name on failure
fn text_field(value: &Value, field: &'static str) -> Result<String, &'static str> {
    match value.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(field),
    }
}

fn to_record(value: &Value) -> Result<PlanRecord, &'static str> {
    let focus = text_field(value, FIELD_FOCUS)?;
    let details = text_field(value, FIELD_DETAILS)?;
    let date_or_week = match value.get(FIELD_DATE_OR_WEEK) {
        // Models sometimes emit bare week numbers
        Some(Value::Number(n)) => n.to_string(),
        _ => text_field(value, FIELD_DATE_OR_WEEK)?,
    };
    Ok(PlanRecord {
        date_or_week,
        focus,
        details,
    })
}
