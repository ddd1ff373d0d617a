//! Domain entities: core data structures

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::domain::DomainError;

/// A single executable artifact representing one user-facing utility.
///
/// Identified only by its file name and location; never edited.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CommandFile {
    pub path: PathBuf,
}

impl CommandFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File name including extension, e.g. `py-json.py`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Short invocation name: file name with its final extension removed.
    pub fn link_name(&self) -> Result<String, DomainError> {
        link_name(&self.path).ok_or_else(|| DomainError::InvalidCommandName(self.path.clone()))
    }
}

/// Derive the link name for a command path.
///
/// Only the final extension is stripped: `a.tar.gz` becomes `a.tar`,
/// `tool` stays `tool`, a dotfile like `.hidden` keeps its name.
pub fn link_name(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
}

/// Association between a short name in the path directory and the
/// command file it points to inside the installed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// Derived short name
    pub name: String,
    /// Symlink location in the path directory
    pub link: PathBuf,
    /// Absolute path of the command file the symlink points to
    pub target: PathBuf,
}

impl LinkEntry {
    pub fn for_command(command: &CommandFile, path_dir: &Path) -> Result<Self, DomainError> {
        let name = command.link_name()?;
        Ok(Self {
            link: path_dir.join(&name),
            target: command.path.clone(),
            name,
        })
    }
}

/// Derive link entries for all commands.
///
/// Fails with `NameCollision` if two commands derive the same name; no
/// entry is silently dropped. Output is sorted by name.
pub fn plan_links(commands: &[CommandFile], path_dir: &Path) -> Result<Vec<LinkEntry>, DomainError> {
    let mut by_name: BTreeMap<String, LinkEntry> = BTreeMap::new();
    for command in commands {
        let entry = LinkEntry::for_command(command, path_dir)?;
        if let Some(existing) = by_name.get(&entry.name) {
            return Err(DomainError::NameCollision {
                name: entry.name,
                first: existing.target.clone(),
                second: entry.target,
            });
        }
        by_name.insert(entry.name.clone(), entry);
    }
    Ok(by_name.into_values().collect())
}

/// Observed state of a link entry in the path directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// Symlink exists and points at the expected command
    Linked,
    /// Nothing at the destination
    Missing,
    /// Symlink exists but points somewhere else
    Foreign(PathBuf),
    /// A regular file or directory occupies the destination
    Blocked,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Linked => write!(f, "linked"),
            LinkState::Missing => write!(f, "missing"),
            LinkState::Foreign(target) => write!(f, "foreign -> {}", target.display()),
            LinkState::Blocked => write!(f, "blocked (not a symlink)"),
        }
    }
}

/// Outcome of an idempotent removal step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(PathBuf),
    NothingToDo,
}

/// Named lifecycle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Build,
    Clean,
    Copy,
    Link,
    Unlink,
    Install,
    Uninstall,
    Status,
}

impl Operation {
    /// Allow-list of accepted operation names, aliases included.
    pub const ALL: &'static [(&'static str, Operation)] = &[
        ("build", Operation::Build),
        ("clean", Operation::Clean),
        ("copy", Operation::Copy),
        ("publish", Operation::Copy),
        ("link", Operation::Link),
        ("unlink", Operation::Unlink),
        ("install", Operation::Install),
        ("uninstall", Operation::Uninstall),
        ("status", Operation::Status),
    ];

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|(name, _)| *name).collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Build => "build",
            Operation::Clean => "clean",
            Operation::Copy => "copy",
            Operation::Link => "link",
            Operation::Unlink => "unlink",
            Operation::Install => "install",
            Operation::Uninstall => "uninstall",
            Operation::Status => "status",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, op)| *op)
            .ok_or_else(|| DomainError::UnknownOperation(s.to_string()))
    }
}

/// Expand shell variables and tilde in a path string.
///
/// Handles `~`, `$VAR`, and `${VAR}` syntax. Returns original string on error.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
