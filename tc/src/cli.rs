//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::Config;

/// TaktCouncil - multi-agent TAKT planning advisor
#[derive(Parser)]
#[command(
    name = "tc",
    about = "Multi-agent TAKT planning advisor",
    version = env!("GIT_DESCRIBE"),
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
    /// Run the advisory council against a project file
    Plan {
        /// Project file (YAML or JSON)
        project: PathBuf,

        /// Comma-separated role order (default: all six)
        #[arg(short, long)]
        roles: Option<String>,

        /// Stop at the first failed role instead of marking it missing
        #[arg(long)]
        abort_on_failure: bool,

        /// Run independent roles concurrently
        #[arg(long)]
        waves: bool,

        /// Cross-check tolerance in percent
        #[arg(long)]
        tolerance: Option<f64>,

        /// View to show (dashboard, project-analysis, takt-planning, reports, training)
        #[arg(short, long)]
        view: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Validate a project file and provider credentials without calling any model
    Check {
        /// Project file (YAML or JSON)
        project: PathBuf,

        /// Comma-separated role order (default: all six)
        #[arg(short, long)]
        roles: Option<String>,
    },

    /// Compute the TAKT plan for a project (no model calls)
    Takt {
        /// Project file (YAML or JSON)
        project: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List advisory roles and the model each resolves to
    Roles,
}

pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taktcouncil")
        .join("logs")
        .join("taktcouncil.log")
}

/// Config path given on the raw command line, before clap parses it
///
/// Lets the help text describe the providers of the config the user chose.
pub fn config_path_from_args<I, S>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let arg = arg.as_ref();
        if arg == "--" {
            break;
        }
        if arg == "-c" || arg == "--config" {
            return args.next().map(|path| PathBuf::from(path.as_ref()));
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

/// Generate the after_help text with credential status and log location
pub fn generate_after_help(config: &Config) -> String {
    debug!("generate_after_help: called");
    let mut help = String::from("Providers:\n");

    for (name, provider) in &config.llm.providers {
        let icon = if std::env::var(&provider.api_key_env).is_ok() {
            "\u{2705}"
        } else {
            "\u{274C}"
        };
        help.push_str(&format!("  {} {:<10} {}\n", icon, name, provider.api_key_env));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

/// Output format for command results
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
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
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
