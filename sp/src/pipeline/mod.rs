//! Plan extraction and normalization pipeline
//!
//! Raw model text goes through three stages, short-circuiting on the first
//! failure:
//!
//! 1. [`TextExtractor`] isolates the bracketed payload
//! 2. [`ScheduleValidator`] parses it and matches an accepted shape
//! 3. [`ScheduleNormalizer`] maps the shape onto a [`Schedule`]

mod error;
mod extract;
mod normalize;
mod validate;

pub use error::{DEFAULT_SAMPLE_CHARS, ExtractionError, FailureKind, PlanError, ValidationError, sample};
pub use extract::{CandidatePayload, TextExtractor, extract_lines};
pub use normalize::ScheduleNormalizer;
pub use validate::{FIELD_DATE_OR_WEEK, FIELD_DETAILS, FIELD_FOCUS, ParsedPayload, PlanRecord, ScheduleValidator};

use tracing::{debug, info};

use crate::config::ExtractionConfig;
use crate::domain::Schedule;

/// The three post-transport stages wired together
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    extractor: TextExtractor,
    validator: ScheduleValidator,
    normalizer: ScheduleNormalizer,
    line_fallback: bool,
}

impl Pipeline {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        debug!(sample_chars = config.sample_chars, line_fallback = config.line_fallback, "from_config: called");
        Self {
            extractor: TextExtractor::new(config.sample_chars),
            validator: ScheduleValidator::new(config.sample_chars),
            normalizer: ScheduleNormalizer::new(),
            line_fallback: config.line_fallback,
        }
    }

    /// Turn a raw model response into a schedule
    pub fn run(&self, raw: &str) -> Result<Schedule, PlanError> {
        debug!(raw_len = raw.len(), "run: called");
        let candidate = self.extractor.extract(raw)?;
        let parsed = self.validator.validate(&candidate)?;
        let schedule = self.normalizer.normalize(parsed);
        info!(steps = schedule.len(), "run: normalized schedule");
        Ok(schedule)
    }

    /// Like [`Pipeline::run`], for responses to a task list prompt
    ///
    /// When line fallback is enabled and the response holds no array at all,
    /// up to `limit` plain lines are taken as tasks instead.
    pub fn run_task_list(&self, raw: &str, limit: usize) -> Result<Schedule, PlanError> {
        debug!(raw_len = raw.len(), %limit, line_fallback = self.line_fallback, "run_task_list: called");
        match self.run(raw) {
            Err(PlanError::Extraction(ExtractionError::NoStructuredPayload { .. })) if self.line_fallback => {
                let lines = extract_lines(raw, limit);
                info!(count = lines.len(), "run_task_list: fell back to line splitting");
                Ok(self.normalizer.normalize(ParsedPayload::TaskList(lines)))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LabelKind, StepLabel};

    #[test]
    fn test_fenced_records() {
        let raw = "```json\n[{\"dateOrWeek\":\"2024-07-01\",\"focus\":\"Cells\",\"details\":\"Read ch.1\"}]\n```";
        let schedule = Pipeline::default().run(raw).unwrap();

        assert_eq!(schedule.len(), 1);
        let step = &schedule.steps()[0];
        assert_eq!(step.label, StepLabel::date("2024-07-01"));
        assert_eq!(step.focus, "Cells");
        assert_eq!(step.details, "Read ch.1");
    }

    #[test]
    fn test_stage_of_first_failure() {
        let pipeline = Pipeline::default();
        assert_eq!(
            pipeline.run("not json at all").unwrap_err().kind(),
            FailureKind::NoStructuredPayload
        );
        assert_eq!(
            pipeline.run(r#"[{"focus":"x"}]"#).unwrap_err().kind(),
            FailureKind::IncompleteRecord
        );
        assert_eq!(
            pipeline.run(r#"["a", {"b": 1}]"#).unwrap_err().kind(),
            FailureKind::InconsistentShape
        );
    }

    #[test]
    fn test_line_fallback_disabled_by_default() {
        let err = Pipeline::default()
            .run_task_list("Read chapter one\nMake flashcards", 5)
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::NoStructuredPayload);
    }

    #[test]
    fn test_line_fallback_enabled() {
        let pipeline = Pipeline::from_config(&ExtractionConfig {
            line_fallback: true,
            ..ExtractionConfig::default()
        });
        let schedule = pipeline
            .run_task_list("Read chapter one\nok\nMake flashcards\nQuiz yourself", 2)
            .unwrap();

        let focus: Vec<&str> = schedule.iter().map(|s| s.focus.as_str()).collect();
        assert_eq!(focus, vec!["Read chapter one", "Make flashcards"]);
        assert!(schedule.iter().all(|s| s.label.kind == LabelKind::Index));
    }

    #[test]
    fn test_line_fallback_does_not_mask_validation_errors() {
        let pipeline = Pipeline::from_config(&ExtractionConfig {
            line_fallback: true,
            ..ExtractionConfig::default()
        });
        let err = pipeline.run_task_list("[1, 2, 3]", 5).unwrap_err();
        assert_eq!(err.kind(), FailureKind::InconsistentShape);
    }
}
