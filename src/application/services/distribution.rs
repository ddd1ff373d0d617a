//! Distribution build and clean
//!
//! ```text
//! source_dir/          dist_dir/bin/
//!   foo.py      --->     foo.py
//!   bar.sh      --->     bar.sh
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::services::list_command_files;
use crate::application::{ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{CommandFile, DomainError, RemoveOutcome};
use crate::infrastructure::traits::FileSystem;

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub dist_dir: PathBuf,
    /// Command files now present in the distribution
    pub commands: Vec<CommandFile>,
}

/// Builds and cleans the distribution directory.
pub struct DistributionService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl DistributionService {
    /// Create a new distribution service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    /// Copy the command source set into a fresh distribution directory.
    ///
    /// Fails with `SourceMissing` if the source set is absent and with
    /// `DestinationAlreadyExists` if a distribution already exists; neither
    /// case writes anything. A failure mid-copy leaves the partial
    /// distribution in place for `clean`.
    pub fn build(&self) -> ApplicationResult<BuildReport> {
        let source_dir = &self.settings.source_dir;
        let dist_dir = &self.settings.dist_dir;
        debug!(
            "build: source_dir={}, dist_dir={}",
            source_dir.display(),
            dist_dir.display()
        );

        if !self.fs.is_dir(source_dir) {
            return Err(DomainError::SourceMissing(source_dir.clone()).into());
        }
        if self.fs.entry_exists(dist_dir) {
            return Err(DomainError::DestinationAlreadyExists(dist_dir.clone()).into());
        }

        let commands_dir = self.settings.dist_commands_dir();
        self.fs
            .copy_dir(source_dir, &commands_dir)
            .with_path_context("copy command source set", source_dir)?;

        let commands = list_command_files(&commands_dir)?;
        info!(
            "build: {} commands in {}",
            commands.len(),
            commands_dir.display()
        );
        Ok(BuildReport {
            dist_dir: dist_dir.clone(),
            commands,
        })
    }

    /// Remove the distribution directory if present. Idempotent.
    pub fn clean(&self) -> ApplicationResult<RemoveOutcome> {
        let dist_dir = &self.settings.dist_dir;
        if !self.fs.entry_exists(dist_dir) {
            debug!("clean: nothing at {}", dist_dir.display());
            return Ok(RemoveOutcome::NothingToDo);
        }

        if self.fs.is_dir(dist_dir) && !self.fs.is_symlink(dist_dir) {
            self.fs
                .remove_dir_all(dist_dir)
                .with_path_context("remove distribution", dist_dir)?;
        } else {
            self.fs
                .remove_file(dist_dir)
                .with_path_context("remove distribution", dist_dir)?;
        }
        info!("clean: removed {}", dist_dir.display());
        Ok(RemoveOutcome::Removed(dist_dir.clone()))
    }
}
