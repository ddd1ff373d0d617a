//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/cmdkit/cmdkit.toml`
//! 3. Local config: `<project_dir>/.cmdkit.toml`
//! 4. Environment variables: `CMDKIT_*` prefix
//! 5. Command line flags
//!
//! Relative paths are resolved against the project directory.

use std::path::{Component, Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::expand_env_vars;

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub source_dir: Option<PathBuf>,
    pub dist_dir: Option<PathBuf>,
    pub installed_dir: Option<PathBuf>,
    pub path_dir: Option<PathBuf>,
    pub command_subdir: Option<String>,
}

/// Unified configuration for cmdkit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Command source set (default: ./bin)
    pub source_dir: PathBuf,
    /// Distribution build output (default: ./dist)
    pub dist_dir: PathBuf,
    /// Durable per-user install location (default: $XDG_DATA_HOME/cmdkit)
    pub installed_dir: PathBuf,
    /// Directory on PATH receiving the symlinks (default: ~/.local/bin)
    pub path_dir: PathBuf,
    /// Subdirectory holding command files in dist and installed dirs
    pub command_subdir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src/bin"),
            dist_dir: PathBuf::from("dist"),
            installed_dir: default_installed_dir(),
            path_dir: default_path_dir(),
            command_subdir: "bin".into(),
        }
    }
}

fn default_installed_dir() -> PathBuf {
    ProjectDirs::from("", "", "cmdkit")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.local/share/cmdkit"))
}

fn default_path_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| {
            dirs.executable_dir()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dirs.home_dir().join(".local").join("bin"))
        })
        .unwrap_or_else(|| PathBuf::from("~/.local/bin"))
}

/// Get the XDG config directory for cmdkit.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "cmdkit").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("cmdkit.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".cmdkit.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Distribution subdirectory holding the built command files.
    pub fn dist_commands_dir(&self) -> PathBuf {
        self.dist_dir.join(&self.command_subdir)
    }

    /// Installed subdirectory holding the published command files.
    pub fn installed_commands_dir(&self) -> PathBuf {
        self.installed_dir.join(&self.command_subdir)
    }

    /// Expand shell variables and tilde in path fields.
    ///
    /// Handles `~`, `$VAR`, and `${VAR}` syntax.
    fn expand_paths(&mut self) {
        for path in [
            &mut self.source_dir,
            &mut self.dist_dir,
            &mut self.installed_dir,
            &mut self.path_dir,
        ] {
            let expanded = expand_env_vars(path.to_string_lossy().as_ref());
            *path = PathBuf::from(expanded);
        }
    }

    /// Make relative path fields absolute against `base`.
    fn resolve_relative(&mut self, base: &Path) {
        for path in [
            &mut self.source_dir,
            &mut self.dist_dir,
            &mut self.installed_dir,
            &mut self.path_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Merge overlay config onto self (base); overlay wins if specified.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            source_dir: overlay
                .source_dir
                .clone()
                .unwrap_or_else(|| self.source_dir.clone()),
            dist_dir: overlay
                .dist_dir
                .clone()
                .unwrap_or_else(|| self.dist_dir.clone()),
            installed_dir: overlay
                .installed_dir
                .clone()
                .unwrap_or_else(|| self.installed_dir.clone()),
            path_dir: overlay
                .path_dir
                .clone()
                .unwrap_or_else(|| self.path_dir.clone()),
            command_subdir: overlay
                .command_subdir
                .clone()
                .unwrap_or_else(|| self.command_subdir.clone()),
        }
    }

    /// Load settings with layered precedence and no flag overrides.
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_with_overrides(project_dir, &RawSettings::default())
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Directory for local config and relative path resolution (default: cwd)
    /// * `overrides` - Command line values, highest precedence
    pub fn load_with_overrides(
        project_dir: Option<&Path>,
        overrides: &RawSettings,
    ) -> Result<Self, ApplicationError> {
        let project_dir = match project_dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().map_err(|e| ApplicationError::Config {
                message: format!("determine current directory: {e}"),
            })?,
        };

        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Project-local config
        let local_path = local_config_path(&project_dir);
        if local_path.exists() {
            let raw = load_raw_settings(&local_path)?;
            current = current.merge_with(&raw);
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        // 5. Command line
        current = current.merge_with(overrides);

        current.expand_paths();
        current.resolve_relative(&project_dir);
        current.validate()?;

        Ok(current)
    }

    /// Apply CMDKIT_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("CMDKIT")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("source_dir") {
            settings.source_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("dist_dir") {
            settings.dist_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("installed_dir") {
            settings.installed_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("path_dir") {
            settings.path_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("command_subdir") {
            settings.command_subdir = val;
        }

        Ok(settings)
    }

    /// Reject layouts where one stage would reach into another's directory.
    fn validate(&self) -> Result<(), ApplicationError> {
        let components: Vec<Component> = Path::new(&self.command_subdir).components().collect();
        if !matches!(components.as_slice(), [Component::Normal(_)]) {
            return Err(ApplicationError::Config {
                message: format!(
                    "command_subdir must be a single relative path component: '{}'",
                    self.command_subdir
                ),
            });
        }
        let stages = [
            ("source_dir", &self.source_dir, "dist_dir", &self.dist_dir),
            ("source_dir", &self.source_dir, "installed_dir", &self.installed_dir),
            ("dist_dir", &self.dist_dir, "installed_dir", &self.installed_dir),
        ];
        for (a_name, a, b_name, b) in stages {
            if a.starts_with(b) || b.starts_with(a) {
                return Err(ApplicationError::Config {
                    message: format!(
                        "{a_name} and {b_name} must not overlap: {} / {}",
                        a.display(),
                        b.display()
                    ),
                });
            }
        }
        if self.path_dir.starts_with(&self.installed_dir) {
            return Err(ApplicationError::Config {
                message: format!(
                    "path_dir must not be inside installed_dir: {}",
                    self.path_dir.display()
                ),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# cmdkit configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/cmdkit/cmdkit.toml
#   Local:  <project_dir>/.cmdkit.toml
#   Env:    CMDKIT_* environment variables (e.g. CMDKIT_PATH_DIR)
#   Flags:  --source-dir, --dist-dir, --installed-dir, --path-dir
#
# Relative paths are resolved against the project directory.

# Command source set
# source_dir = "src/bin"

# Distribution build output (removed by `cmdkit clean`)
# dist_dir = "dist"

# Durable per-user install location (removed by `cmdkit uninstall`)
# installed_dir = "~/.local/share/cmdkit"

# Directory on PATH receiving one symlink per command
# path_dir = "~/.local/bin"

# Subdirectory holding command files inside dist_dir and installed_dir
# command_subdir = "bin"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
