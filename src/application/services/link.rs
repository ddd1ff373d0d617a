//! Symlink creation and verified removal in the path directory
//!
//! ```text
//! installed_dir/bin/                path_dir/
//!   foo.py                <-------    foo  (symlink, absolute target)
//!   bar.sh                <-------    bar
//! ```
//!
//! Linking treats any existing destination as fatal. Unlinking only removes a
//! symlink that provably points at the installed command; anything else at a
//! derived name is fatal and left untouched.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{plan_links, CommandFile, DomainError, LinkEntry, LinkState};
use crate::infrastructure::traits::FileSystem;

/// List command files directly inside `dir`, sorted by file name.
///
/// Subdirectories are skipped; symlinks are listed as commands.
pub fn list_command_files(dir: &Path) -> ApplicationResult<Vec<CommandFile>> {
    let mut commands = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry
            .map_err(std::io::Error::from)
            .with_path_context("read command directory", dir)?;
        if entry.file_type().is_dir() {
            debug!("list_command_files: skip directory {}", entry.path().display());
            continue;
        }
        commands.push(CommandFile::new(entry.path()));
    }
    Ok(commands)
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

/// Result of a successful unlink pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlinkReport {
    /// Symlinks that were removed
    pub removed: Vec<LinkEntry>,
    /// Entries with nothing at the destination
    pub skipped: Vec<LinkEntry>,
}

/// Read-only view of the installed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub dist_dir: PathBuf,
    pub dist_present: bool,
    pub installed_dir: PathBuf,
    pub installed_present: bool,
    pub path_dir: PathBuf,
    pub links: Vec<(LinkEntry, LinkState)>,
}

/// Linker and unlinker for the path directory.
pub struct LinkService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl LinkService {
    /// Create a new link service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    /// Absolute command files of the installed command directory.
    fn installed_commands(&self, commands_dir: &Path) -> ApplicationResult<Vec<CommandFile>> {
        let commands_dir = self
            .fs
            .canonicalize(commands_dir)
            .with_path_context("canonicalize installed commands", commands_dir)?;
        list_command_files(&commands_dir)
    }

    /// Link entries without collision checking, for verification passes.
    fn derive_entries(&self, commands: &[CommandFile]) -> ApplicationResult<Vec<LinkEntry>> {
        commands
            .iter()
            .map(|c| {
                LinkEntry::for_command(c, &self.settings.path_dir).map_err(ApplicationError::from)
            })
            .collect()
    }

    /// Check whether the symlink at `link` points at `expected`.
    ///
    /// Only the link's own target counts; further symlinks along the way are
    /// not followed. Relative targets are resolved against the link's directory.
    fn points_to(link: &Path, actual: &Path, expected: &Path) -> bool {
        let resolved = if actual.is_relative() {
            link.parent().unwrap_or(Path::new(".")).join(actual)
        } else {
            actual.to_path_buf()
        };
        normalize_lexically(&resolved) == normalize_lexically(expected)
    }

    /// Observe what currently occupies an entry's destination.
    fn classify(&self, entry: &LinkEntry) -> ApplicationResult<LinkState> {
        if !self.fs.entry_exists(&entry.link) {
            return Ok(LinkState::Missing);
        }
        if !self.fs.is_symlink(&entry.link) {
            return Ok(LinkState::Blocked);
        }
        let actual = self
            .fs
            .read_link(&entry.link)
            .with_path_context("read link", &entry.link)?;
        if Self::points_to(&entry.link, &actual, &entry.target) {
            Ok(LinkState::Linked)
        } else {
            Ok(LinkState::Foreign(actual))
        }
    }

    /// Create one symlink per installed command in the path directory.
    ///
    /// Fails with `SourceNotFound` if the installed command directory is
    /// missing, `NameCollision` before any write if two commands derive the
    /// same name, and `DestinationConflict` at the first occupied destination.
    /// Links created before a failing entry are left in place.
    pub fn link(&self) -> ApplicationResult<Vec<LinkEntry>> {
        let commands_dir = self.settings.installed_commands_dir();
        debug!("link: commands_dir={}", commands_dir.display());
        if !self.fs.is_dir(&commands_dir) {
            return Err(DomainError::SourceNotFound(commands_dir).into());
        }

        let commands = self.installed_commands(&commands_dir)?;
        let entries = plan_links(&commands, &self.settings.path_dir)?;

        let mut created = Vec::with_capacity(entries.len());
        for entry in entries {
            if self.fs.entry_exists(&entry.link) {
                return Err(DomainError::DestinationConflict {
                    link: entry.link,
                    target: entry.target,
                }
                .into());
            }
            self.fs
                .symlink(&entry.target, &entry.link)
                .with_path_context("create link", &entry.link)?;
            info!(
                "link: {} -> {}",
                entry.link.display(),
                entry.target.display()
            );
            created.push(entry);
        }
        Ok(created)
    }

    /// Remove the symlinks this system created.
    ///
    /// No installed directory means nothing to do. Every destination is
    /// verified before the first removal: a foreign symlink fails with
    /// `TargetMismatch`, any other entry with `NotASymlink`, and nothing is
    /// removed in either case. The installed directory itself is left for the
    /// caller to remove. Returns `None` when nothing is installed.
    pub fn unlink(&self) -> ApplicationResult<Option<UnlinkReport>> {
        let installed_dir = &self.settings.installed_dir;
        if !self.fs.entry_exists(installed_dir) {
            debug!("unlink: nothing installed at {}", installed_dir.display());
            return Ok(None);
        }

        let commands_dir = self.settings.installed_commands_dir();
        if !self.fs.is_dir(&commands_dir) {
            return Err(DomainError::UnexpectedLayout(commands_dir).into());
        }

        let commands = self.installed_commands(&commands_dir)?;
        let entries = self.derive_entries(&commands)?;

        // Commands sharing a derived name accept a link to either of them
        let mut by_name: BTreeMap<&str, Vec<&LinkEntry>> = BTreeMap::new();
        for entry in &entries {
            by_name.entry(entry.name.as_str()).or_default().push(entry);
        }

        let mut to_remove = Vec::new();
        let mut skipped = Vec::new();
        for candidates in by_name.values() {
            let first = candidates[0];
            let mut matched = None;
            for candidate in candidates {
                match self.classify(candidate)? {
                    LinkState::Missing => break,
                    LinkState::Blocked => {
                        return Err(DomainError::NotASymlink(first.link.clone()).into())
                    }
                    LinkState::Linked => {
                        matched = Some(*candidate);
                        break;
                    }
                    LinkState::Foreign(_) => continue,
                }
            }
            match matched {
                Some(entry) => to_remove.push(entry.clone()),
                None if !self.fs.entry_exists(&first.link) => skipped.push(first.clone()),
                None => {
                    let actual = self
                        .fs
                        .read_link(&first.link)
                        .with_path_context("read link", &first.link)?;
                    return Err(DomainError::TargetMismatch {
                        link: first.link.clone(),
                        actual,
                        expected: first.target.clone(),
                    }
                    .into());
                }
            }
        }

        for entry in &to_remove {
            self.fs
                .remove_file(&entry.link)
                .with_path_context("remove link", &entry.link)?;
            info!("unlink: {}", entry.link.display());
        }

        Ok(Some(UnlinkReport {
            removed: to_remove,
            skipped,
        }))
    }

    /// Report the state of every installed command's link.
    pub fn status(&self) -> ApplicationResult<StatusReport> {
        let commands_dir = self.settings.installed_commands_dir();
        let links = if self.fs.is_dir(&commands_dir) {
            let commands = self.installed_commands(&commands_dir)?;
            self.derive_entries(&commands)?
                .into_iter()
                .map(|entry| {
                    let state = self.classify(&entry)?;
                    Ok((entry, state))
                })
                .collect::<ApplicationResult<Vec<_>>>()?
        } else {
            Vec::new()
        };

        Ok(StatusReport {
            dist_dir: self.settings.dist_dir.clone(),
            dist_present: self.fs.entry_exists(&self.settings.dist_dir),
            installed_dir: self.settings.installed_dir.clone(),
            installed_present: self.fs.entry_exists(&self.settings.installed_dir),
            path_dir: self.settings.path_dir.clone(),
            links,
        })
    }
}
