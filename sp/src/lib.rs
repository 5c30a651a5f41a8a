//! studyplan - study schedules from a language model
//!
//! A student asks for a study schedule (or a quick task list); a model answers
//! in loosely formatted text; studyplan turns that text into one canonical
//! [`Schedule`] or a precise error saying what was wrong with it.
//!
//! # Modules
//!
//! - [`domain`] - Requests and the canonical schedule
//! - [`prompts`] - Prompt templates and the prompt builder
//! - [`transport`] - Model transport trait and vendor implementations
//! - [`pipeline`] - Extraction, validation and normalization of responses
//! - [`controller`] - Request lifecycle and state publication
//! - [`config`] - Configuration types and loading
//! - [`render`] - Text and JSON output
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod controller;
pub mod domain;
pub mod pipeline;
pub mod prompts;
pub mod render;
pub mod transport;

// Re-export commonly used types
pub use config::{Config, ExtractionConfig, LlmConfig, PromptsConfig};
pub use controller::{PlanController, PlanState, StateReport};
pub use domain::{
    LabelKind, PlanStep, RequestError, Schedule, SchedulingRequest, StepLabel, TaskItem, TaskListRequest,
};
pub use pipeline::{
    CandidatePayload, ExtractionError, FailureKind, ParsedPayload, Pipeline, PlanError, PlanRecord, ScheduleNormalizer,
    ScheduleValidator, TextExtractor, ValidationError,
};
pub use prompts::{PromptBuilder, PromptError};
pub use transport::{ModelTransport, TransportError, create_transport};
