//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::config::RawSettings;
use crate::domain::Operation;

/// Install a directory of command files as a per-user toolkit linked onto PATH
#[derive(Parser, Debug)]
#[command(name = "cmdkit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Project directory (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Command source set
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub source_dir: Option<PathBuf>,

    /// Distribution build directory
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub dist_dir: Option<PathBuf>,

    /// Installed directory
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub installed_dir: Option<PathBuf>,

    /// Directory on PATH receiving the symlinks
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub path_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Path flags as the highest-precedence config layer.
    pub fn overrides(&self) -> RawSettings {
        RawSettings {
            source_dir: self.source_dir.clone(),
            dist_dir: self.dist_dir.clone(),
            installed_dir: self.installed_dir.clone(),
            path_dir: self.path_dir.clone(),
            command_subdir: None,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy the command source set into a fresh distribution
    Build,

    /// Remove the distribution directory
    Clean,

    /// Copy the distribution into the installed directory (never overwrites)
    #[command(visible_alias = "publish")]
    Copy,

    /// Symlink installed commands into the path directory
    Link,

    /// Remove this toolkit's symlinks and the installed directory
    Unlink,

    /// clean, build, publish and link
    Install,

    /// Remove this toolkit's symlinks and the installed directory
    Uninstall,

    /// Show installed commands and their link state
    Status,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    /// Lifecycle operation for this subcommand, if it is one.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Commands::Build => Some(Operation::Build),
            Commands::Clean => Some(Operation::Clean),
            Commands::Copy => Some(Operation::Copy),
            Commands::Link => Some(Operation::Link),
            Commands::Unlink => Some(Operation::Unlink),
            Commands::Install => Some(Operation::Install),
            Commands::Uninstall => Some(Operation::Uninstall),
            Commands::Status => Some(Operation::Status),
            Commands::Config { .. } | Commands::Completion { .. } => None,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create local config template
    Init {
        /// Create global config instead
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
