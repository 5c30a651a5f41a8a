//! Terminal and JSON rendering of plan state

use colored::*;
use tracing::debug;

use crate::controller::PlanState;
use crate::domain::{LabelKind, Schedule};
use crate::pipeline::PlanError;
use crate::transport::TransportError;

/// Render a state for humans
pub fn render_text(state: &PlanState) -> String {
    debug!("render_text: called");
    match state {
        PlanState::Idle => "No plan requested.\n".to_string(),
        PlanState::Requesting => "Waiting for the model...\n".to_string(),
        PlanState::Success(schedule) => render_schedule(schedule),
        PlanState::Failed(err) => {
            let mut out = format!("{} {}\n", "✗".red(), err);
            if let Some(raw) = err.raw_sample() {
                out.push_str(&format!("  {} {}\n", "response:".dimmed(), raw));
            }
            if let PlanError::Transport(transport) = err.as_ref()
                && let Some(hint) = retry_hint(transport)
            {
                out.push_str(&format!("  {}\n", hint.yellow()));
            }
            out
        }
    }
}

/// What to tell the user about trying again, if anything
fn retry_hint(err: &TransportError) -> Option<String> {
    match err.retry_after() {
        Some(wait) => Some(format!("Rate limited; retry in {}s.", wait.as_secs())),
        None if err.is_retryable() => Some("The service may recover; retry may help.".to_string()),
        None => None,
    }
}

/// One block per step: label and focus, then indented details
pub fn render_schedule(schedule: &Schedule) -> String {
    debug!(steps = schedule.len(), "render_schedule: called");
    if schedule.is_empty() {
        return "The model returned an empty schedule.\n".to_string();
    }

    let width = schedule
        .iter()
        .map(|s| s.label.to_string().chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for step in schedule {
        let label = format!("{:<width$}", step.label.to_string());
        let label = match step.label.kind {
            LabelKind::Date => label.cyan(),
            LabelKind::Week => label.yellow(),
            LabelKind::Index => label.dimmed(),
        };
        out.push_str(&format!("{}  {}\n", label, step.focus.bold()));
        if !step.details.is_empty() {
            out.push_str(&format!("{:width$}  {}\n", "", step.details));
        }
    }
    out
}

/// Render a schedule as an unchecked to-do list
pub fn render_checklist(schedule: &Schedule) -> String {
    debug!(steps = schedule.len(), "render_checklist: called");
    schedule
        .to_task_items()
        .iter()
        .map(|item| format!("{} {}\n", if item.done { "[x]" } else { "[ ]" }, item.text))
        .collect()
}

/// Render a state as pretty JSON
pub fn render_json(state: &PlanState) -> Result<String, serde_json::Error> {
    debug!("render_json: called");
    serde_json::to_string_pretty(&state.report())
}
