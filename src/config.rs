//! Application configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables. Validation runs once the layers are applied.

use crate::error::{ConsoleError, Result};
use crate::utils::env::EnvUtils;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Verbosity level forced through the environment (-1 quiet to 3 debug)
pub const SHELL_VERBOSITY_VAR: &str = "SHELL_VERBOSITY";
/// Whether errors escaping a command are rendered (`1`) or returned (`0`)
pub const CATCH_EXCEPTIONS_VAR: &str = "CONSOLE_CATCH_EXCEPTIONS";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name shown by `--version` and `list`
    pub name: String,
    /// Application version; may be empty
    pub version: String,
    /// Command run when no command name is given
    pub default_command: String,
    /// Always run the default command; every positional belongs to it
    pub single_command: bool,
    /// Render errors escaping a command instead of returning them
    pub catch_exceptions: bool,
    /// Verbosity used when no verbosity flag is given
    pub shell_verbosity: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "console".to_string(),
            version: String::new(),
            default_command: "list".to_string(),
            single_command: false,
            catch_exceptions: true,
            shell_verbosity: 0,
        }
    }
}

impl Config {
    /// Create a configuration with the given name and version
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConsoleError::config_with_source("Failed to parse TOML", e))
    }

    /// Load a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from: {}", path.display());

        let contents = fs::read_to_string(path).map_err(|e| {
            ConsoleError::config_with_source(format!("Failed to read {}", path.display()), e)
        })?;
        Self::from_toml_str(&contents)
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ConsoleError::config_with_source("Failed to serialize configuration", e))
    }

    /// Apply overrides from the environment
    #[must_use]
    pub fn with_env(mut self) -> Self {
        if let Some(level) = EnvUtils::get_var_parsed::<i32>(SHELL_VERBOSITY_VAR) {
            self.shell_verbosity = level;
        }
        if let Some(catch) = EnvUtils::get_var_bool(CATCH_EXCEPTIONS_VAR) {
            self.catch_exceptions = catch;
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ConsoleError::config("Application name cannot be empty"));
        }
        if self.default_command.trim().is_empty() {
            return Err(ConsoleError::config("Default command cannot be empty"));
        }
        if !(-1..=3).contains(&self.shell_verbosity) {
            return Err(ConsoleError::config(format!(
                "Shell verbosity must be between -1 and 3, got {}",
                self.shell_verbosity
            )));
        }
        Ok(())
    }

    /// `name (version x)`, or just the name when there is no version
    pub fn long_version(&self) -> String {
        if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{} (version {})", self.name, self.version)
        }
    }
}
