//! Prompt Template System
//!
//! Renders `.pmt` (prompt template) files into model instructions.
//!
//! Template loading chain:
//! 1. `{prompts.dir}/{name}.pmt` (configured override)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

mod builder;
pub mod embedded;

pub use builder::{
    NOT_SPECIFIED, PLAN_TEMPLATE, PlanPromptContext, PromptBuilder, PromptError, TASKS_TEMPLATE, TaskPromptContext,
};
