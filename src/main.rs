//! `stack-starter` — detect a project's stack and generate a Dockerfile for it.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and set up logging.
//! 2. Load config.
//! 3. Pick the stack: the first registered pack that detects, or `--stack`.
//!    With `--dependency`, print that dependency's declared version and stop.
//! 4. Compile the project's manifest into a deployment description.
//! 5. Render the report, with all advisories at the end.
//! 6. Render the stack's Dockerfile template and write it.
//! 7. Exit `1` when no stack is recognized or the Dockerfile already exists.

mod cli;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::warn;

use cli::{Cli, ReportFormat};
use stack_starter::config::load_config;
use stack_starter::error::{PackError, WriteError};
use stack_starter::manifest::probe;
use stack_starter::pack::registry::Match;
use stack_starter::pack::{CompileOptions, PackRegistry};
use stack_starter::prompt::{NoPrompt, TerminalPrompt, VersionPrompt};
use stack_starter::writer::ArtifactWriter;
use stack_starter::{logging, report};

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = cli.validate() {
        e.exit();
    }
    logging::init(logging::level_for(cli.verbose, cli.quiet));

    // Resolve project path
    let path = cli
        .path
        .canonicalize()
        .unwrap_or_else(|_| cli.path.clone());

    let config = load_config(&path, cli.config.as_deref())?;
    let registry = PackRegistry::with_defaults();

    let found = match select_pack(&registry, &path, cli.stack.as_deref()) {
        Ok(found) => found,
        Err(PackError::NoStackRecognized(p)) => {
            eprintln!(
                "No supported stack found in {}. Looked for: {}. Use --stack to pick one explicitly.",
                p.display(),
                registry.names().join(", ")
            );
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    if let Some((name, aliases)) = cli.dependency_query() {
        match probe(found.detection.manifest(), name, &aliases) {
            Some(version) if version.is_empty() => println!("{} (no version constraint)", name),
            Some(version) => println!("{} {}", name, version),
            None => {
                eprintln!("{} is not declared in {}", name, found.detection.manifest().display());
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let prompt: &dyn VersionPrompt = if cli.no_prompt || !config.prompt {
        &NoPrompt
    } else {
        &TerminalPrompt
    };
    let options = CompileOptions {
        environment: cli
            .environment
            .clone()
            .unwrap_or_else(|| config.environment.clone()),
        fallback_version: config.fallback_version(found.pack.name()),
        prompt,
    };

    let compiled = found.pack.compile(&found.detection, &options)?;

    match cli.report {
        ReportFormat::Terminal => report::terminal::render(&compiled, &path, cli.quiet),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&compiled)?),
    }

    let template_dir = cli
        .templates
        .clone()
        .or_else(|| config.template_dir_for(&path));
    let writer = ArtifactWriter::new(template_dir, cli.overwrite);

    if cli.dry_run {
        print!("{}", writer.render(&compiled)?);
        return Ok(());
    }

    match writer.write(&compiled, &found.pack.output_folder(&found.detection)) {
        Ok(dest) => {
            if !cli.quiet {
                eprintln!("  {} Wrote {}", "→".cyan(), dest.display());
            }
        }
        Err(e @ WriteError::Conflict(_)) => {
            eprintln!("  {} {}", "✗".red(), e);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Forced stack when `--stack` is given, otherwise the first pack that detects.
/// Other packs that also match are reported but do not change the choice.
fn select_pack<'a>(
    registry: &'a PackRegistry,
    path: &Path,
    forced: Option<&str>,
) -> Result<Match<'a>, PackError> {
    if let Some(name) = forced {
        return registry.find_named(name, path);
    }

    let found = registry.find_match(path)?;

    let others: Vec<&str> = registry
        .find_all(path)?
        .iter()
        .map(|m| m.pack.name())
        .filter(|name| *name != found.pack.name())
        .collect();
    if !others.is_empty() {
        warn!(
            chosen = found.pack.name(),
            also_matched = %others.join(", "),
            "several stacks match this project; using the first registered one"
        );
    }

    Ok(found)
}
