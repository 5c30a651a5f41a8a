//! Canonical schedule types
//!
//! Every accepted response shape normalizes into a [`Schedule`] of
//! [`PlanStep`]s. Steps keep the order the model emitted them in.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What a step label denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    /// Calendar date in `YYYY-MM-DD` form
    Date,
    /// Free-form week label such as "Week 3"
    Week,
    /// Synthetic 1-based position for flat task lists
    Index,
}

impl std::fmt::Display for LabelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date => write!(f, "date"),
            Self::Week => write!(f, "week"),
            Self::Index => write!(f, "index"),
        }
    }
}

/// A step label tagged with its kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepLabel {
    pub kind: LabelKind,
    pub value: String,
}

impl StepLabel {
    pub fn date(value: impl Into<String>) -> Self {
        Self {
            kind: LabelKind::Date,
            value: value.into(),
        }
    }

    pub fn week(value: impl Into<String>) -> Self {
        Self {
            kind: LabelKind::Week,
            value: value.into(),
        }
    }

    /// Label for the `position`-th task (1-based)
    pub fn index(position: usize) -> Self {
        Self {
            kind: LabelKind::Index,
            value: position.to_string(),
        }
    }

    /// Parse the value as a calendar date
    ///
    /// Returns `None` for non-date labels and for date-shaped values that are
    /// not real calendar days (e.g. `2024-02-30`).
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self.kind {
            LabelKind::Date => NaiveDate::parse_from_str(&self.value, "%Y-%m-%d").ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for StepLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            LabelKind::Date => write!(f, "{}", self.value),
            // Bare numbers read better with the unit attached
            LabelKind::Week if self.value.parse::<u32>().is_ok() => write!(f, "Week {}", self.value),
            LabelKind::Week => write!(f, "{}", self.value),
            LabelKind::Index => write!(f, "Step {}", self.value),
        }
    }
}

/// One normalized unit of schedule output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub label: StepLabel,
    /// Short topic text, never empty
    pub focus: String,
    /// Actionable text; empty for flat task lists
    pub details: String,
}

/// Ordered sequence of plan steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    steps: Vec<PlanStep>,
}

impl Schedule {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlanStep> {
        self.steps.iter()
    }

    pub fn into_steps(self) -> Vec<PlanStep> {
        self.steps
    }

    /// Convert each step into an unfinished to-do item
    ///
    /// Steps with details produce "focus: details"; flat tasks keep just the focus.
    pub fn to_task_items(&self) -> Vec<TaskItem> {
        self.steps
            .iter()
            .map(|step| {
                if step.details.is_empty() {
                    TaskItem::new(step.focus.clone())
                } else {
                    TaskItem::new(format!("{}: {}", step.focus, step.details))
                }
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a PlanStep;
    type IntoIter = std::slice::Iter<'a, PlanStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// A to-do entry in the shape the task list UI stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub text: String,
    pub done: bool,
}

impl TaskItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }
}
