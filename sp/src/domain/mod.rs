//! Domain types for studyplan
//!
//! Requests going into the prompt builder and the canonical schedule coming
//! out of the normalizer.

mod request;
mod schedule;

pub use request::{
    DEFAULT_AUDIENCE, DEFAULT_TASK_COUNT, MAX_DAYS_PER_WEEK, MAX_TASK_COUNT, MIN_DAYS_PER_WEEK, RequestError,
    SchedulingRequest, TaskListRequest,
};
pub use schedule::{LabelKind, PlanStep, Schedule, StepLabel, TaskItem};
