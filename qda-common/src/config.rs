//! Configuration loading and project resolution
//!
//! A project is a directory with a `.qda` suffix holding the SQLite database
//! `data.qda`. The project to open is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`QDA_PROJECT`)
//! 3. `project` key of the TOML config file
//! 4. Last project recorded by the desktop application
//!    (`~/.qualcoder/cur_project.txt`)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the project directory
pub const PROJECT_ENV_VAR: &str = "QDA_PROJECT";

/// File name of the project database inside a project directory
pub const PROJECT_DATABASE_FILE: &str = "data.qda";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5730;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Contents of the TOML config file; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub project: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// Load from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load from `path` if one is given and the file exists, otherwise
    /// defaults
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_if_present(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                debug!("No config file at {}", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

/// Default config file path for the platform (`<config_dir>/qda/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("qda").join("config.toml"))
}

/// File in which the desktop application records the last opened project
pub fn last_project_file() -> Option<PathBuf> {
    dirs::home_dir().map(|d| d.join(".qualcoder").join("cur_project.txt"))
}

/// Resolves which project directory to open
#[derive(Debug, Clone)]
pub struct ProjectResolver {
    env_var_name: String,
    config: TomlConfig,
    last_project_file: Option<PathBuf>,
}

impl ProjectResolver {
    pub fn new(config: TomlConfig) -> Self {
        Self {
            env_var_name: PROJECT_ENV_VAR.to_string(),
            config,
            last_project_file: last_project_file(),
        }
    }

    /// Override the environment variable consulted at priority 2
    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var_name = name.into();
        self
    }

    /// Override the last-project file consulted at priority 4
    pub fn with_last_project_file(mut self, path: Option<PathBuf>) -> Self {
        self.last_project_file = path;
        self
    }

    /// Resolve the project directory
    ///
    /// # Errors
    /// [`Error::Config`] if no source names a project
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Result<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return Ok(path.to_path_buf());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(&self.env_var_name) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.config.project {
            return Ok(path.clone());
        }

        // Priority 4: Last project opened by the desktop application
        if let Some(file) = &self.last_project_file {
            if let Ok(content) = std::fs::read_to_string(file) {
                let path = content.trim();
                if !path.is_empty() {
                    return Ok(PathBuf::from(path));
                }
            }
        }

        Err(Error::Config(format!(
            "No project given: pass --project, set {} or add `project` to the config file",
            self.env_var_name
        )))
    }
}

/// Path of the database inside a project directory
///
/// # Errors
/// [`Error::Config`] if `project` does not have a `.qda` suffix
pub fn project_database_path(project: &Path) -> Result<PathBuf> {
    let is_project = project
        .extension()
        .map(|ext| ext == "qda")
        .unwrap_or(false);
    if !is_project {
        return Err(Error::Config(format!(
            "{} is not a .qda project directory",
            project.display()
        )));
    }
    Ok(project.join(PROJECT_DATABASE_FILE))
}

/// Report service listen settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl ServerConfig {
    /// Command-line values override the TOML config, which overrides defaults
    pub fn resolve(
        config: &TomlConfig,
        host: Option<String>,
        port: Option<u16>,
        log_level: Option<String>,
    ) -> Self {
        Self {
            host: host
                .or_else(|| config.host.clone())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: port.or(config.port).unwrap_or(DEFAULT_PORT),
            log_level: log_level
                .or_else(|| config.log_level.clone())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
