//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

/// Study schedule prompt
pub const PLAN: &str = include_str!("../../prompts/plan.pmt");

/// Flat task list prompt
pub const TASKS: &str = include_str!("../../prompts/tasks.pmt");
