//! TaktCouncil - multi-agent TAKT planning advisor
//!
//! CLI entry point for running advisory sessions and inspecting projects.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use taktcouncil::agent::build_agents;
use taktcouncil::cli::{Cli, Command, OutputFormat, config_path_from_args, generate_after_help, get_log_path};
use taktcouncil::config::Config;
use taktcouncil::domain::{AgentRole, ProjectContext, parse_roles};
use taktcouncil::orchestrator::{ExecutionMode, FailurePolicy, Orchestrator};
use taktcouncil::prompts::PromptLoader;
use taktcouncil::report::{self, View};
use taktcouncil::takt::TaktMetrics;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
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
    // Build command with dynamic after_help that shows the chosen config's provider credentials
    let args: Vec<String> = std::env::args().collect();
    let help_config = Config::load(config_path_from_args(&args).as_ref()).unwrap_or_default();
    let cmd = Cli::command().after_help(generate_after_help(&help_config));
    let cli = Cli::from_arg_matches(&cmd.get_matches_from(args))?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!("TaktCouncil loaded config: default={}", config.llm.default);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Plan {
            project,
            roles,
            abort_on_failure,
            waves,
            tolerance,
            view,
            format,
        } => {
            debug!(?project, "main: matched Plan command");
            let options = PlanOptions {
                roles,
                abort_on_failure,
                waves,
                tolerance,
                view,
                format,
            };
            cmd_plan(config, &project, options).await
        }
        Command::Check { project, roles } => {
            debug!(?project, "main: matched Check command");
            cmd_check(&config, &project, roles.as_deref())
        }
        Command::Takt { project, format } => {
            debug!(?project, %format, "main: matched Takt command");
            cmd_takt(&project, format)
        }
        Command::Roles => {
            debug!("main: matched Roles command");
            cmd_roles(&config)
        }
    }
}

/// Command-line overrides for a planning session
struct PlanOptions {
    roles: Option<String>,
    abort_on_failure: bool,
    waves: bool,
    tolerance: Option<f64>,
    view: Option<String>,
    format: OutputFormat,
}

/// Role order: `--roles` if given, else the configured order
fn resolve_order(config: &Config, roles: Option<&str>) -> Result<Vec<AgentRole>> {
    match roles {
        Some(list) => parse_roles(list),
        None => Ok(config.orchestrator.order.clone()),
    }
}

async fn cmd_plan(mut config: Config, project_path: &Path, options: PlanOptions) -> Result<()> {
    debug!(?project_path, "cmd_plan: called");
    let project = ProjectContext::load(project_path)?;

    config.orchestrator.order = resolve_order(&config, options.roles.as_deref())?;
    if options.abort_on_failure {
        config.orchestrator.failure_policy = FailurePolicy::Abort;
    }
    if options.waves {
        config.orchestrator.mode = ExecutionMode::Waves;
    }
    if let Some(tolerance) = options.tolerance {
        if !(tolerance.is_finite() && tolerance >= 0.0) {
            return Err(eyre!("Tolerance must be a finite, non-negative percentage: {}", tolerance));
        }
        config.orchestrator.duration_tolerance_pct = tolerance;
    }

    let view = options
        .view
        .as_deref()
        .map(str::parse::<View>)
        .transpose()
        .map_err(|e| eyre!(e))?;

    // Fail on bad input before building clients or spending tokens
    project.validate_for(&config.orchestrator.order)?;
    config.validate(&config.orchestrator.order)?;

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let prompts = Arc::new(PromptLoader::new(&cwd, config.prompts.dir.clone()));
    let agents = build_agents(&config, &config.orchestrator.order, prompts)?;
    let orchestrator = Orchestrator::new(agents.into_values(), config.orchestrator.clone());

    eprintln!(
        "{} Convening {} advisors for {}...",
        "→".cyan(),
        config.orchestrator.order.len(),
        project.name.bold()
    );
    let session = orchestrator.run(&project).await?;

    match options.format {
        OutputFormat::Json => {
            let value = match view {
                Some(view) => report::view_json(&session, view)?,
                None => serde_json::to_value(&session)?,
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            let views = match view {
                Some(view) => vec![view],
                None => View::ALL.to_vec(),
            };
            for (i, view) in views.into_iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print!("{}", report::render_text(&session, view));
            }
        }
    }

    if !session.is_complete() {
        let missing: Vec<String> = session.missing_roles().iter().map(|r| r.to_string()).collect();
        eprintln!("{} Missing advisors: {}", "⚠".yellow(), missing.join(", "));
    }
    Ok(())
}

fn cmd_check(config: &Config, project_path: &Path, roles: Option<&str>) -> Result<()> {
    debug!(?project_path, "cmd_check: called");
    let project = ProjectContext::load(project_path)?;
    let order = resolve_order(config, roles)?;

    project.validate_for(&order)?;
    println!("{} Project '{}' is valid", "✅".green(), project.name);

    for role in &order {
        for note in project.advisories(*role) {
            println!("  {} {}: {}", "⚠".yellow(), role, note);
        }
    }

    config.validate(&order)?;
    println!("{} Credentials found for {} roles", "✅".green(), order.len());
    Ok(())
}

fn cmd_takt(project_path: &Path, format: OutputFormat) -> Result<()> {
    debug!(?project_path, "cmd_takt: called");
    let project = ProjectContext::load(project_path)?;
    project.validate()?;

    let metrics = TaktMetrics::compute(&project);
    match format {
        OutputFormat::Json => {
            let value = serde_json::to_value(report::takt_planning(&project, &metrics))?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => print!("{}", report::render_takt_text(&project, &metrics)),
    }
    Ok(())
}

fn cmd_roles(config: &Config) -> Result<()> {
    debug!("cmd_roles: called");
    for role in AgentRole::ALL {
        let model = match config.resolve_role(role) {
            Ok(resolved) => format!("{}/{}", resolved.provider, resolved.model),
            Err(e) => format!("{}", e).red().to_string(),
        };
        println!("{:<16} {}", role.id().bold(), role.title());
        println!("{:<16} {}", "", role.expertise().dimmed());
        println!("{:<16} model: {}", "", model);
        if !role.upstream().is_empty() {
            let upstream: Vec<&str> = role.upstream().iter().map(|r| r.id()).collect();
            println!("{:<16} reads: {}", "", upstream.join(", "));
        }
        println!();
    }
    Ok(())
}
