//! Pipeline error types
//!
//! Each stage has its own error enum; [`PlanError`] wraps them so callers
//! can tell which stage failed and why.

use serde::Serialize;
use thiserror::Error;

use crate::domain::RequestError;
use crate::prompts::PromptError;
use crate::transport::TransportError;

/// Default bound on raw response text carried in diagnostics
pub const DEFAULT_SAMPLE_CHARS: usize = 240;

/// Bounded prefix of `text`, at most `limit` chars, with "..." when cut
pub fn sample(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Failure to locate a structured payload in a model response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("no JSON array found in model response: {raw_sample:?}")]
    NoStructuredPayload { raw_sample: String },
}

/// Failure to match a candidate payload against an accepted shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("response is not valid JSON ({detail}): {raw_sample:?}")]
    MalformedStructure { detail: String, raw_sample: String },

    #[error("expected a JSON array, found {found}: {raw_sample:?}")]
    NotASequence { found: &'static str, raw_sample: String },

    #[error("record {index} has a missing or empty '{field}': {raw_sample:?}")]
    IncompleteRecord {
        index: usize,
        field: &'static str,
        raw_sample: String,
    },

    #[error("element {index} is {found}, expected {expected}: {raw_sample:?}")]
    InconsistentShape {
        index: usize,
        found: &'static str,
        expected: &'static str,
        raw_sample: String,
    },
}

impl ValidationError {
    pub fn raw_sample(&self) -> &str {
        match self {
            Self::MalformedStructure { raw_sample, .. }
            | Self::NotASequence { raw_sample, .. }
            | Self::IncompleteRecord { raw_sample, .. }
            | Self::InconsistentShape { raw_sample, .. } => raw_sample,
        }
    }
}

/// Flat failure category for presentation and machine output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidRequest,
    Prompt,
    Transport,
    NoStructuredPayload,
    MalformedStructure,
    NotASequence,
    IncompleteRecord,
    InconsistentShape,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InvalidRequest => "invalid_request",
            Self::Prompt => "prompt",
            Self::Transport => "transport",
            Self::NoStructuredPayload => "no_structured_payload",
            Self::MalformedStructure => "malformed_structure",
            Self::NotASequence => "not_a_sequence",
            Self::IncompleteRecord => "incomplete_record",
            Self::InconsistentShape => "inconsistent_shape",
        };
        write!(f, "{name}")
    }
}

/// A failed plan request, tagged with the stage that failed
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("request rejected: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("prompt stage failed: {0}")]
    Prompt(#[from] PromptError),

    #[error("transport stage failed: {0}")]
    Transport(#[from] TransportError),

    #[error("extraction stage failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("validation stage failed: {0}")]
    Validation(#[from] ValidationError),
}

impl PlanError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidRequest(_) => FailureKind::InvalidRequest,
            Self::Prompt(_) => FailureKind::Prompt,
            Self::Transport(_) => FailureKind::Transport,
            Self::Extraction(ExtractionError::NoStructuredPayload { .. }) => FailureKind::NoStructuredPayload,
            Self::Validation(err) => match err {
                ValidationError::MalformedStructure { .. } => FailureKind::MalformedStructure,
                ValidationError::NotASequence { .. } => FailureKind::NotASequence,
                ValidationError::IncompleteRecord { .. } => FailureKind::IncompleteRecord,
                ValidationError::InconsistentShape { .. } => FailureKind::InconsistentShape,
            },
        }
    }

    /// Name of the pipeline stage that failed
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "request",
            Self::Prompt(_) => "prompt",
            Self::Transport(_) => "transport",
            Self::Extraction(_) => "extraction",
            Self::Validation(_) => "validation",
        }
    }

    /// Raw response sample, for the stages that saw a response
    pub fn raw_sample(&self) -> Option<&str> {
        match self {
            Self::Extraction(ExtractionError::NoStructuredPayload { raw_sample }) => Some(raw_sample),
            Self::Validation(err) => Some(err.raw_sample()),
            _ => None,
        }
    }
}
