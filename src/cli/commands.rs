//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::application::services::{tree_digest, ReplayOptions, ReplayReport, StepOutcome};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let config_dir = cli.config_dir.as_deref();
    match &cli.command {
        Some(Commands::Run {
            script,
            keep_going,
            atomic,
            verify,
            no_tree,
            digest,
        }) => {
            let container = container_for(config_dir, Some(script.as_path()))?;
            let options = ReplayOptions {
                stop_on_error: container.settings.stop_on_error && !keep_going,
                atomic: *atomic,
                verify: container.settings.verify_invariants || *verify,
            };
            let show_tree = container.settings.show_tree && !no_tree;
            cmd_run(&container, script, options, show_tree, *digest)
        }
        Some(Commands::Check { scripts }) => {
            let container = container_for(config_dir, None)?;
            cmd_check(&container, scripts)
        }
        Some(Commands::Path { script, node }) => {
            let container = container_for(config_dir, Some(script.as_path()))?;
            cmd_path(&container, script, node)
        }
        Some(Commands::Config { command }) => cmd_config(config_dir, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `fstree --help`".to_string(),
        )),
    }
}

/// Settings come from the explicit config dir, else the script's directory,
/// else the current directory.
fn container_for(config_dir: Option<&Path>, script: Option<&Path>) -> CliResult<ServiceContainer> {
    let local_dir = match (config_dir, script) {
        (Some(dir), _) => dir.to_path_buf(),
        (None, Some(script)) => script
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        (None, None) => current_dir()?,
    };
    let settings = Settings::load(Some(&local_dir))?;
    debug!(?settings, "effective settings");
    Ok(ServiceContainer::new(settings))
}

fn current_dir() -> CliResult<PathBuf> {
    std::env::current_dir().map_err(|e| InfraError::io("resolve current directory", e).into())
}

#[instrument(level = "debug", skip(container))]
fn cmd_run(
    container: &ServiceContainer,
    script: &Path,
    options: ReplayOptions,
    show_tree: bool,
    digest: bool,
) -> CliResult<()> {
    let report = container
        .replay
        .replay_file(script, &container.settings.default_root, options)?;

    print_steps(&report);
    if show_tree {
        output::info(&report.tree);
    }
    if digest {
        output::action("digest", &tree_digest(&report.tree));
    }
    print_summary(&report);

    match report.rejected() {
        0 => Ok(()),
        count => Err(CliError::Rejected { count }),
    }
}

#[instrument(level = "debug", skip(container))]
fn cmd_check(container: &ServiceContainer, scripts: &[PathBuf]) -> CliResult<()> {
    let default_root = container.settings.default_root.as_str();
    let options = ReplayOptions::from(container.settings.as_ref());

    // Each script replays into its own tree.
    let results: Vec<_> = scripts
        .par_iter()
        .map(|script| {
            let result = container.replay.replay_file(script, default_root, options);
            (script, result)
        })
        .collect();

    let total = results.len();
    let mut failed = 0;
    let mut cause = None;
    for (script, result) in results {
        match result {
            Ok(report) if report.is_clean() => output::success(&format!(
                "{}: {} mutation(s), {} node(s)",
                script.display(),
                report.applied(),
                report.tree.node_count()
            )),
            Ok(report) => {
                failed += 1;
                output::failure(&format!("{}: {}", script.display(), summary(&report)));
                for step in &report.steps {
                    if let StepOutcome::Rejected(e) = &step.outcome {
                        output::failure(&format!("  line {}: {}: {}", step.line, step.mutation, e));
                    }
                }
            }
            Err(e) => {
                failed += 1;
                output::failure(&format!("{}: {}", script.display(), e));
                cause.get_or_insert(e);
            }
        }
    }

    match failed {
        0 => Ok(()),
        count => Err(CliError::ScriptsFailed {
            count,
            total,
            cause,
        }),
    }
}

#[instrument(level = "debug", skip(container))]
fn cmd_path(container: &ServiceContainer, script: &Path, node: &str) -> CliResult<()> {
    let options = ReplayOptions::from(container.settings.as_ref());
    let report = container
        .replay
        .replay_file(script, &container.settings.default_root, options)?;
    if report.rejected() > 0 {
        output::warning(&format!(
            "{}; tracing the partially replayed tree",
            summary(&report)
        ));
    }

    let path = report.tree.path_to_root(&node.to_string());
    if path.is_empty() {
        return Err(CliError::InvalidArgs(format!(
            "node not in the replayed tree: {node}"
        )));
    }
    output::info(&path.iter().join(" -> "));
    Ok(())
}

fn cmd_config(config_dir: Option<&Path>, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let dir = match config_dir {
                Some(dir) => dir.to_path_buf(),
                None => current_dir()?,
            };
            let settings = Settings::load(Some(&dir))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no config directory available on this platform"),
            }
            let dir = match config_dir {
                Some(dir) => dir.to_path_buf(),
                None => current_dir()?,
            };
            output::action("local", &local_config_path(&dir).display());
        }
    }
    Ok(())
}

fn print_steps(report: &ReplayReport) {
    for step in &report.steps {
        match &step.outcome {
            StepOutcome::Applied => debug!(line = step.line, mutation = %step.mutation, "ok"),
            StepOutcome::Rejected(e) => {
                output::failure(&format!("line {}: {}: {}", step.line, step.mutation, e))
            }
            StepOutcome::Skipped => {
                output::skipped(&format!("line {}: {}", step.line, step.mutation))
            }
        }
    }
}

fn print_summary(report: &ReplayReport) {
    if report.is_clean() {
        output::success(&summary(report));
    } else {
        output::header(&summary(report));
    }
}

fn summary(report: &ReplayReport) -> String {
    format!(
        "applied {}, rejected {}, skipped {}",
        report.applied(),
        report.rejected(),
        report.skipped()
    )
}
