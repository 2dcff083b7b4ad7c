use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "stack-starter",
    about = "Detect a project's application stack and generate a Dockerfile for it",
    version
)]
pub struct Cli {
    /// Project path to inspect
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Deployment environment [default: from config, else production]
    #[arg(short, long, value_name = "ENV")]
    pub environment: Option<String>,

    /// Overwrite an existing Dockerfile
    #[arg(short, long)]
    pub overwrite: bool,

    /// Config file [default: ./.stack-starter/config.toml, fallback ~/.config/stack-starter/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory with <stack>.dockerfile.template overrides
    #[arg(long, value_name = "DIR")]
    pub templates: Option<PathBuf>,

    /// Use this stack instead of auto-detecting (e.g. ruby, node)
    #[arg(long, value_name = "NAME")]
    pub stack: Option<String>,

    /// Output format for the detected facts
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Print the Dockerfile instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Print the declared version of a dependency and exit; aliases follow the name (e.g. mongodb,mongoose)
    #[arg(long, value_name = "NAME[,ALIAS...]", value_delimiter = ',')]
    pub dependency: Vec<String>,

    /// Never ask for missing values; use defaults
    #[arg(long)]
    pub no_prompt: bool,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print errors and the final result
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Reject flag combinations clap cannot express: a JSON report and a
    /// dry-run Dockerfile would both go to stdout.
    pub fn validate(&self) -> Result<(), clap::Error> {
        if self.dry_run && self.report == ReportFormat::Json {
            return Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                "--dry-run prints the Dockerfile to stdout and cannot be combined with --report json",
            ));
        }
        Ok(())
    }

    /// Dependency name and its aliases from `--dependency`.
    pub fn dependency_query(&self) -> Option<(&str, Vec<&str>)> {
        let (name, aliases) = self.dependency.split_first()?;
        Some((name.as_str(), aliases.iter().map(String::as_str).collect()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}
