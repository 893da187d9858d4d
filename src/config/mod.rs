mod error;

pub use error::{ConfigError, ConfigResult};

use crate::console::{VerbosityLevel, console};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const CONFIG_DIR_NAME: &str = ".agent-repl";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default)]
    pub verbosity: Option<String>,
    /// Commands listed first in the palette shown for a bare `/`.
    #[serde(default = "default_pinned_commands")]
    pub pinned_commands: Vec<String>,
    #[serde(default = "default_max_pinned_display")]
    pub max_pinned_display: usize,
    /// Built-in plugins to enable, by name: `echo` (offline) or `anthropic`
    /// (needs `ANTHROPIC_API_KEY`).
    #[serde(default = "default_plugins")]
    pub plugins: Vec<String>,
    /// Directory for audit logs, relative to the working directory.
    #[serde(default = "default_audit_dir")]
    pub audit_dir: PathBuf,
}

fn default_app_name() -> String {
    "agent-repl".to_string()
}

fn default_pinned_commands() -> Vec<String> {
    vec!["help".to_string(), "quit".to_string()]
}

fn default_max_pinned_display() -> usize {
    6
}

fn default_plugins() -> Vec<String> {
    vec!["echo".to_string()]
}

fn default_audit_dir() -> PathBuf {
    PathBuf::from(CONFIG_DIR_NAME)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            default_model: None,
            verbosity: None,
            pinned_commands: default_pinned_commands(),
            max_pinned_display: default_max_pinned_display(),
            plugins: default_plugins(),
            audit_dir: default_audit_dir(),
        }
    }
}

impl AppConfig {
    /// Load from the user's home directory.
    pub fn load() -> Self {
        match Self::home_dir() {
            Ok(home) => Self::load_from(&home),
            Err(e) => {
                console().warning(&format!("{}; using default configuration", e));
                Self::default()
            }
        }
    }

    /// Load `<dir>/.agent-repl/config.toml`.
    ///
    /// A missing file is created from the defaults. A file that cannot be
    /// read or parsed is reported and the defaults are used.
    pub fn load_from(dir: &Path) -> Self {
        let path = Self::config_path(dir);

        if !path.exists() {
            let config = Self::default();
            if let Err(e) = config.save_to(dir) {
                console().warning(&format!(
                    "Could not write default config to {}: {}",
                    path.display(),
                    e
                ));
            }
            return config;
        }

        match Self::read(&path) {
            Ok(config) => config,
            Err(e) => {
                console().warning(&format!("{}; using default configuration", e));
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| ConfigError::InvalidToml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, dir: &Path) -> ConfigResult<()> {
        let path = Self::config_path(dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Get the configured verbosity level, falling back to Normal if not set
    pub fn get_verbosity(&self) -> VerbosityLevel {
        self.verbosity
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or(VerbosityLevel::Normal)
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = Some(verbosity.to_string());
    }

    pub fn config_path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
    }

    fn home_dir() -> ConfigResult<PathBuf> {
        std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map(PathBuf::from)
            .map_err(|_| ConfigError::NoHomeDirectory)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
