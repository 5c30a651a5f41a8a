//! CLI command definitions and subcommands

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::domain::{DEFAULT_AUDIENCE, DEFAULT_TASK_COUNT, RequestError, SchedulingRequest, TaskListRequest};

/// studyplan - AI study schedules with tolerant response parsing
#[derive(Parser)]
#[command(
    name = "sp",
    about = "Generate study schedules and task lists from a language model",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a study schedule
    Plan {
        #[command(flatten)]
        request: PlanArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate a flat list of study tasks
    Tasks {
        /// Number of tasks
        #[arg(short = 'n', long, default_value_t = DEFAULT_TASK_COUNT)]
        count: u8,

        /// Who the tasks are for
        #[arg(short, long, default_value = DEFAULT_AUDIENCE)]
        audience: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the rendered plan prompt without calling the model
    Prompt {
        #[command(flatten)]
        request: PlanArgs,
    },

    /// Parse a saved model response (file or stdin)
    Parse {
        /// Response file; `-` or omitted reads stdin
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Treat a response without a JSON array as one task per line
        #[arg(long)]
        lines: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Fields of a study schedule request
#[derive(Debug, Clone, Args)]
pub struct PlanArgs {
    /// Subject to study
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Exam date (YYYY-MM-DD)
    #[arg(short, long = "exam-date", value_name = "YYYY-MM-DD")]
    pub exam_date: Option<NaiveDate>,

    /// Study days per week (1-7)
    #[arg(short, long = "days-per-week")]
    pub days_per_week: u8,

    /// What the student wants to achieve
    #[arg(short, long)]
    pub goal: Option<String>,
}

impl PlanArgs {
    pub fn to_request(&self) -> Result<SchedulingRequest, RequestError> {
        debug!(?self, "PlanArgs::to_request: called");
        let mut request = SchedulingRequest::new(self.days_per_week)?;
        if let Some(subject) = &self.subject {
            request = request.with_subject(subject.as_str());
        }
        if let Some(date) = self.exam_date {
            request = request.with_target_date(date);
        }
        if let Some(goal) = &self.goal {
            request = request.with_goal(goal.as_str());
        }
        Ok(request)
    }
}

/// Build a task list request from CLI values
pub fn task_request(count: u8, audience: &str) -> Result<TaskListRequest, RequestError> {
    debug!(%count, %audience, "task_request: called");
    Ok(TaskListRequest::new(count)?.with_audience(audience))
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studyplan")
        .join("logs")
        .join("studyplan.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Output format for results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => {
                debug!("OutputFormat::from_str: matched Text");
                Ok(Self::Text)
            }
            "json" => {
                debug!("OutputFormat::from_str: matched Json");
                Ok(Self::Json)
            }
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
