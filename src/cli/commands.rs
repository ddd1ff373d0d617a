//! Command execution: load settings, run the operation, render the report

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{InstallReport, OperationReport, StatusReport, UnlinkReport};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{LinkEntry, LinkState, RemoveOutcome};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => execute_config(cli, command),
        command => {
            let op = command
                .operation()
                .ok_or_else(|| CliError::Usage(format!("not an operation: {command:?}")))?;
            let container = ServiceContainer::new(load_settings(cli)?);
            let report = container.lifecycle.run(op)?;
            render(&report);
            Ok(())
        }
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let settings = Settings::load_with_overrides(cli.project_dir.as_deref(), &cli.overrides())?;
    debug!("settings: {:?}", settings);
    Ok(settings)
}

#[instrument(skip(cli))]
fn execute_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::info(&format!("global: {}", path.display())),
                None => output::info("global: (no config directory)"),
            }
            output::info(&format!("local:  {}", local_path(cli)?.display()));
            Ok(())
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path()
                    .ok_or_else(|| CliError::Usage("no global config directory".into()))?
            } else {
                local_path(cli)?
            };
            if path.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("created {}", path.display()));
            Ok(())
        }
    }
}

fn local_path(cli: &Cli) -> CliResult<std::path::PathBuf> {
    let project_dir = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()
            .map_err(|e| InfraError::io("determine current directory", e))?,
    };
    Ok(local_config_path(&project_dir))
}

fn render(report: &OperationReport) {
    match report {
        OperationReport::Built(built) => output::success(&format!(
            "built {} commands into {}",
            built.commands.len(),
            built.dist_dir.display()
        )),
        OperationReport::Cleaned(outcome) => render_removed(outcome, "nothing to clean"),
        OperationReport::Published(published) => {
            output::success(&format!("published {}", published.installed_dir.display()))
        }
        OperationReport::Linked(entries) => render_linked(entries),
        OperationReport::Uninstalled { links, installed } => render_uninstalled(links, installed),
        OperationReport::Installed(install) => render_installed(install),
        OperationReport::Status(status) => render_status(status),
    }
}

fn render_removed(outcome: &RemoveOutcome, nothing: &str) {
    match outcome {
        RemoveOutcome::Removed(path) => output::success(&format!("removed {}", path.display())),
        RemoveOutcome::NothingToDo => output::info(nothing),
    }
}

fn render_linked(entries: &[LinkEntry]) {
    for entry in entries {
        output::diff_add(&format!(
            "{} -> {}",
            entry.link.display(),
            entry.target.display()
        ));
    }
    output::success(&format!("linked {} commands", entries.len()));
}

fn render_uninstalled(links: &Option<UnlinkReport>, installed: &RemoveOutcome) {
    match links {
        None => output::info("nothing installed"),
        Some(report) => {
            for entry in &report.removed {
                output::diff_remove(&entry.link.display());
            }
            render_removed(installed, "installed directory already gone");
        }
    }
}

fn render_installed(install: &InstallReport) {
    output::success(&format!(
        "built {} commands into {}",
        install.built.commands.len(),
        install.built.dist_dir.display()
    ));
    output::success(&format!(
        "published {}",
        install.published.installed_dir.display()
    ));
    render_linked(&install.linked);
}

fn render_status(status: &StatusReport) {
    output::header("Locations");
    let presence = |present: bool| if present { "present" } else { "absent" };
    output::detail(&format!(
        "dist:      {} ({})",
        status.dist_dir.display(),
        presence(status.dist_present)
    ));
    output::detail(&format!(
        "installed: {} ({})",
        status.installed_dir.display(),
        presence(status.installed_present)
    ));
    output::detail(&format!("path:      {}", status.path_dir.display()));

    output::header("Commands");
    if status.links.is_empty() {
        output::detail("none installed");
    }
    for (entry, state) in &status.links {
        match state {
            LinkState::Linked => output::success(&format!("{} -> {}", entry.name, entry.target.display())),
            LinkState::Missing => output::detail(&format!("{} ({})", entry.name, state)),
            LinkState::Foreign(_) | LinkState::Blocked => {
                output::failure(&format!("{} ({})", entry.name, state))
            }
        }
    }
}
