//! studyplan - study schedule generation
//!
//! CLI entry point: builds requests, drives the plan controller and renders
//! the outcome.

use std::fs;
use std::io::Read;
use std::path::Path;

use clap::Parser;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use studyplan::cli::{Cli, Command, OutputFormat, PlanArgs, get_log_path, task_request};
use studyplan::config::Config;
use studyplan::controller::{PlanController, PlanState};
use studyplan::pipeline::{Pipeline, PlanError};
use studyplan::prompts::PromptBuilder;
use studyplan::render::{render_checklist, render_json, render_schedule, render_text};
use studyplan::transport::create_transport;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    let log_dir = log_path.parent().unwrap_or_else(|| Path::new("."));

    fs::create_dir_all(log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level_str = cli_log_level.or(config_log_level);
    let level = match level_str.map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "studyplan loaded config: provider={} model={}",
        config.llm.provider, config.llm.model
    );

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Plan { request, format } => {
            debug!(?request, %format, "main: matched Plan command");
            cmd_plan(&config, &request, format).await
        }
        Command::Tasks {
            count,
            audience,
            format,
        } => {
            debug!(%count, %audience, %format, "main: matched Tasks command");
            cmd_tasks(&config, count, &audience, format).await
        }
        Command::Prompt { request } => {
            debug!(?request, "main: matched Prompt command");
            cmd_prompt(&config, &request)
        }
        Command::Parse { input, lines, format } => {
            debug!(?input, lines, %format, "main: matched Parse command");
            cmd_parse(&config, input.as_deref(), lines, format)
        }
    }
}

fn prompt_builder(config: &Config) -> Result<PromptBuilder> {
    PromptBuilder::new(config.prompts.dir.as_deref()).context("Failed to load prompt templates")
}

fn controller(config: &Config) -> Result<PlanController> {
    let transport = create_transport(&config.llm).context("Failed to create model transport")?;
    Ok(PlanController::new(
        transport,
        prompt_builder(config)?,
        Pipeline::from_config(&config.extraction),
        config.llm.timeout(),
    ))
}

/// Generate a study schedule
async fn cmd_plan(config: &Config, args: &PlanArgs, format: OutputFormat) -> Result<()> {
    debug!(?args, "cmd_plan: called");
    let request = match args.to_request() {
        Ok(request) => request,
        Err(err) => return emit(&PlanState::from(Err(PlanError::from(err))), format, false),
    };
    let state = controller(config)?.request_plan(request).await;
    emit(&state, format, false)
}

/// Generate a flat task list
async fn cmd_tasks(config: &Config, count: u8, audience: &str, format: OutputFormat) -> Result<()> {
    debug!(%count, %audience, "cmd_tasks: called");
    let request = match task_request(count, audience) {
        Ok(request) => request,
        Err(err) => return emit(&PlanState::from(Err(PlanError::from(err))), format, true),
    };
    let state = controller(config)?.request_tasks(request).await;
    emit(&state, format, true)
}

/// Print the rendered plan prompt
fn cmd_prompt(config: &Config, args: &PlanArgs) -> Result<()> {
    debug!(?args, "cmd_prompt: called");
    let request = args.to_request().map_err(PlanError::from)?;
    let prompt = prompt_builder(config)?.build(&request)?;
    print!("{}", prompt);
    Ok(())
}

/// Run the pipeline over a saved response
fn cmd_parse(config: &Config, input: Option<&Path>, lines: bool, format: OutputFormat) -> Result<()> {
    debug!(?input, lines, "cmd_parse: called");
    let raw = read_input(input)?;

    let mut extraction = config.extraction.clone();
    extraction.line_fallback |= lines;
    let pipeline = Pipeline::from_config(&extraction);

    let result = if extraction.line_fallback {
        pipeline.run_task_list(&raw, usize::MAX)
    } else {
        pipeline.run(&raw)
    };
    emit(&PlanState::from(result), format, false)
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => {
            debug!(?path, "read_input: reading file");
            fs::read_to_string(path).context(format!("Failed to read {}", path.display()))
        }
        _ => {
            debug!("read_input: reading stdin");
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read stdin")?;
            Ok(raw)
        }
    }
}

/// Print a final state; failures also produce a non-zero exit
fn emit(state: &PlanState, format: OutputFormat, checklist: bool) -> Result<()> {
    debug!(%format, checklist, "emit: called");
    match (format, state) {
        (OutputFormat::Json, _) => println!("{}", render_json(state)?),
        (OutputFormat::Text, PlanState::Success(schedule)) if checklist => print!("{}", render_checklist(schedule)),
        (OutputFormat::Text, PlanState::Success(schedule)) => print!("{}", render_schedule(schedule)),
        (OutputFormat::Text, _) => eprint!("{}", render_text(state)),
    }

    match state.error() {
        Some(err) => Err(eyre!("{} stage failed ({})", err.stage(), err.kind())),
        None => Ok(()),
    }
}
