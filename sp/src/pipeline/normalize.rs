//! Normalization of accepted payloads into the canonical [`Schedule`]

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::validate::{ParsedPayload, PlanRecord};
use crate::domain::{PlanStep, Schedule, StepLabel};

/// `YYYY-MM-DD`, ASCII digits only
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date regex"));

/// Maps any accepted payload shape onto a [`Schedule`]
#[derive(Debug, Clone, Default)]
pub struct ScheduleNormalizer;

impl ScheduleNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a validated payload; total over every accepted shape
    pub fn normalize(&self, payload: ParsedPayload) -> Schedule {
        match payload {
            ParsedPayload::TaskList(tasks) => {
                debug!(count = tasks.len(), "normalize: task list");
                let steps = tasks
                    .into_iter()
                    .enumerate()
                    .map(|(i, text)| PlanStep {
                        label: StepLabel::index(i + 1),
                        focus: text,
                        details: String::new(),
                    })
                    .collect();
                Schedule::new(steps)
            }
            ParsedPayload::Records(records) => {
                debug!(count = records.len(), "normalize: records");
                Schedule::new(records.into_iter().map(record_to_step).collect())
            }
        }
    }
}

fn label_for(date_or_week: String) -> StepLabel {
    if ISO_DATE.is_match(&date_or_week) {
        StepLabel::date(date_or_week)
    } else {
        StepLabel::week(date_or_week)
    }
}

fn record_to_step(record: PlanRecord) -> PlanStep {
    PlanStep {
        label: label_for(record.date_or_week),
        focus: record.focus,
        details: record.details,
    }
}

impl From<&PlanStep> for PlanRecord {
    fn from(step: &PlanStep) -> Self {
        Self {
            date_or_week: step.label.value.clone(),
            focus: step.focus.clone(),
            details: step.details.clone(),
        }
    }
}
