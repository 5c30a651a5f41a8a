//! Request types accepted by the prompt builder
//!
//! Both request kinds enforce their numeric ranges at construction so an
//! out-of-range value never reaches a prompt.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

/// Fewest study days a plan may budget per week
pub const MIN_DAYS_PER_WEEK: u8 = 1;

/// Most study days a plan may budget per week
pub const MAX_DAYS_PER_WEEK: u8 = 7;

/// Number of tasks requested when the caller does not say
pub const DEFAULT_TASK_COUNT: u8 = 5;

/// Upper bound on tasks per request
pub const MAX_TASK_COUNT: u8 = 20;

/// Audience used in task list prompts when none is given
pub const DEFAULT_AUDIENCE: &str = "a high school student";

/// Errors raised while constructing a request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("days per week must be between 1 and 7, got {0}")]
    DaysPerWeekOutOfRange(u8),

    #[error("task count must be between 1 and 20, got {0}")]
    TaskCountOutOfRange(u8),
}

/// A study plan request: what to study, until when, and how often
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingRequest {
    subject: Option<String>,
    target_date: Option<NaiveDate>,
    days_per_week: u8,
    goal: Option<String>,
}

impl SchedulingRequest {
    /// Create a request with the given weekly budget and no optional fields
    pub fn new(days_per_week: u8) -> Result<Self, RequestError> {
        debug!(%days_per_week, "SchedulingRequest::new: called");
        if !(MIN_DAYS_PER_WEEK..=MAX_DAYS_PER_WEEK).contains(&days_per_week) {
            debug!(%days_per_week, "SchedulingRequest::new: out of range");
            return Err(RequestError::DaysPerWeekOutOfRange(days_per_week));
        }
        Ok(Self {
            subject: None,
            target_date: None,
            days_per_week,
            goal: None,
        })
    }

    /// Set the subject; blank text leaves it unspecified
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = non_blank(subject.into());
        self
    }

    /// Set the exam or target date
    pub fn with_target_date(mut self, date: NaiveDate) -> Self {
        self.target_date = Some(date);
        self
    }

    /// Set the goal; blank text leaves it unspecified
    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = non_blank(goal.into());
        self
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn target_date(&self) -> Option<NaiveDate> {
        self.target_date
    }

    pub fn days_per_week(&self) -> u8 {
        self.days_per_week
    }

    pub fn goal(&self) -> Option<&str> {
        self.goal.as_deref()
    }
}

/// A request for a flat list of study tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListRequest {
    count: u8,
    audience: String,
}

impl TaskListRequest {
    /// Create a request for `count` tasks aimed at the default audience
    pub fn new(count: u8) -> Result<Self, RequestError> {
        debug!(%count, "TaskListRequest::new: called");
        if count == 0 || count > MAX_TASK_COUNT {
            return Err(RequestError::TaskCountOutOfRange(count));
        }
        Ok(Self {
            count,
            audience: DEFAULT_AUDIENCE.to_string(),
        })
    }

    /// Override the audience; blank text keeps the current one
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        if let Some(audience) = non_blank(audience.into()) {
            self.audience = audience;
        }
        self
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }
}

impl Default for TaskListRequest {
    fn default() -> Self {
        Self {
            count: DEFAULT_TASK_COUNT,
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() { None } else { Some(text) }
}
