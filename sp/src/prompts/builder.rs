//! Prompt Builder
//!
//! Renders request fields into the plan and task list templates.

use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::embedded;
use crate::domain::{SchedulingRequest, TaskListRequest};

/// Rendered in place of request fields that were left empty
pub const NOT_SPECIFIED: &str = "(not specified)";

/// Template names, also the override file stems
pub const PLAN_TEMPLATE: &str = "plan";
pub const TASKS_TEMPLATE: &str = "tasks";

/// Errors from loading or rendering prompt templates
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("failed to read prompt template {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render template '{name}': {source}")]
    Render {
        name: &'static str,
        #[source]
        source: handlebars::RenderError,
    },
}

/// Context for the plan template
#[derive(Debug, Clone, Serialize)]
pub struct PlanPromptContext {
    pub subject: String,
    pub exam_date: String,
    pub days_per_week: u8,
    pub goal: String,
}

impl From<&SchedulingRequest> for PlanPromptContext {
    fn from(request: &SchedulingRequest) -> Self {
        Self {
            subject: request.subject().unwrap_or(NOT_SPECIFIED).to_string(),
            exam_date: request
                .target_date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            days_per_week: request.days_per_week(),
            goal: request.goal().unwrap_or(NOT_SPECIFIED).to_string(),
        }
    }
}

/// Context for the task list template
#[derive(Debug, Clone, Serialize)]
pub struct TaskPromptContext {
    pub count: u8,
    pub audience: String,
}

impl From<&TaskListRequest> for TaskPromptContext {
    fn from(request: &TaskListRequest) -> Self {
        Self {
            count: request.count(),
            audience: request.audience().to_string(),
        }
    }
}

/// Builds model instructions from validated requests
///
/// Override templates are read once, in [`PromptBuilder::new`]; building a
/// prompt never touches the filesystem.
#[derive(Debug)]
pub struct PromptBuilder {
    hbs: Handlebars<'static>,
    plan_template: String,
    tasks_template: String,
}

impl PromptBuilder {
    /// Create a builder, preferring `{dir}/plan.pmt` and `{dir}/tasks.pmt`
    /// over the embedded templates when they exist
    pub fn new(dir: Option<&Path>) -> Result<Self, PromptError> {
        debug!(?dir, "PromptBuilder::new: called");
        Ok(Self {
            hbs: Self::engine(),
            plan_template: Self::load_template(dir, PLAN_TEMPLATE, embedded::PLAN)?,
            tasks_template: Self::load_template(dir, TASKS_TEMPLATE, embedded::TASKS)?,
        })
    }

    /// Create a builder that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptBuilder::embedded_only: called");
        Self {
            hbs: Self::engine(),
            plan_template: embedded::PLAN.to_string(),
            tasks_template: embedded::TASKS.to_string(),
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text; field values go in verbatim
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    fn load_template(dir: Option<&Path>, name: &str, fallback: &str) -> Result<String, PromptError> {
        debug!(?dir, %name, "PromptBuilder::load_template: called");
        if let Some(dir) = dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptBuilder::load_template: found override");
                return std::fs::read_to_string(&path).map_err(|source| PromptError::Read { path, source });
            }
            debug!(?path, "PromptBuilder::load_template: no override");
        }
        debug!(%name, "PromptBuilder::load_template: using embedded");
        Ok(fallback.to_string())
    }

    /// Render the study schedule prompt for `request`
    pub fn build(&self, request: &SchedulingRequest) -> Result<String, PromptError> {
        debug!(?request, "PromptBuilder::build: called");
        let context = PlanPromptContext::from(request);
        let prompt = self
            .hbs
            .render_template(&self.plan_template, &context)
            .map_err(|source| PromptError::Render {
                name: PLAN_TEMPLATE,
                source,
            })?;
        info!(len = prompt.len(), "Rendered plan prompt");
        Ok(prompt)
    }

    /// Render the flat task list prompt for `request`
    pub fn build_task_list(&self, request: &TaskListRequest) -> Result<String, PromptError> {
        debug!(?request, "PromptBuilder::build_task_list: called");
        let context = TaskPromptContext::from(request);
        let prompt = self
            .hbs
            .render_template(&self.tasks_template, &context)
            .map_err(|source| PromptError::Render {
                name: TASKS_TEMPLATE,
                source,
            })?;
        info!(len = prompt.len(), "Rendered task list prompt");
        Ok(prompt)
    }
}
