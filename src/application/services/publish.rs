//! Publish the distribution into the durable per-user installed directory

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::{ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{DomainError, RemoveOutcome};
use crate::infrastructure::traits::FileSystem;

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub installed_dir: PathBuf,
    /// A previous installed directory was removed first
    pub replaced: bool,
}

/// Copies the distribution into the installed directory and removes it again.
pub struct PublishService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl PublishService {
    /// Create a new publish service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    fn remove_tree(&self, path: &Path) -> ApplicationResult<()> {
        if self.fs.is_dir(path) && !self.fs.is_symlink(path) {
            self.fs
                .remove_dir_all(path)
                .with_path_context("remove installed directory", path)
        } else {
            self.fs
                .remove_file(path)
                .with_path_context("remove installed directory", path)
        }
    }

    /// Copy the distribution directory into the installed directory.
    ///
    /// # Arguments
    /// * `overwrite_existing` - `false`: fail with `AlreadyInstalled` if an
    ///   installed directory exists. `true`: remove it first.
    pub fn publish(&self, overwrite_existing: bool) -> ApplicationResult<PublishReport> {
        let dist_dir = &self.settings.dist_dir;
        let installed_dir = &self.settings.installed_dir;
        debug!(
            "publish: dist_dir={}, installed_dir={}, overwrite_existing={}",
            dist_dir.display(),
            installed_dir.display(),
            overwrite_existing
        );

        if !self.fs.is_dir(dist_dir) {
            return Err(DomainError::SourceMissing(dist_dir.clone()).into());
        }

        let replaced = self.fs.entry_exists(installed_dir);
        if replaced {
            if !overwrite_existing {
                return Err(DomainError::AlreadyInstalled(installed_dir.clone()).into());
            }
            debug!("publish: replacing {}", installed_dir.display());
            self.remove_tree(installed_dir)?;
        }

        if let Some(parent) = installed_dir.parent() {
            self.fs
                .create_dir_all(parent)
                .with_path_context("create parent directory", parent)?;
        }
        self.fs
            .copy_dir(dist_dir, installed_dir)
            .with_path_context("copy distribution", dist_dir)?;

        info!("publish: {}", installed_dir.display());
        Ok(PublishReport {
            installed_dir: installed_dir.clone(),
            replaced,
        })
    }

    /// Remove the installed directory if present. Idempotent.
    pub fn remove_installed(&self) -> ApplicationResult<RemoveOutcome> {
        let installed_dir = &self.settings.installed_dir;
        if !self.fs.entry_exists(installed_dir) {
            return Ok(RemoveOutcome::NothingToDo);
        }
        self.remove_tree(installed_dir)?;
        info!("remove_installed: {}", installed_dir.display());
        Ok(RemoveOutcome::Removed(installed_dir.clone()))
    }
}
