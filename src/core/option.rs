//! Named option descriptor (`--name`, `-n`)

use crate::core::value::Value;
use crate::error::{ConsoleError, Result};

/// How an option relates to a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueMode {
    /// Boolean switch, never takes a value
    Flag,
    /// A value must follow the option
    Required,
    /// A value may follow the option
    Optional,
}

/// A `--name` option, optionally reachable through one-letter shortcuts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputOption {
    name: String,
    shortcuts: Vec<String>,
    description: String,
    mode: ValueMode,
    is_list: bool,
    default: Value,
    choices: Vec<String>,
}

impl InputOption {
    fn with_mode(name: &str, mode: ValueMode) -> Self {
        Self {
            name: name.trim_start_matches('-').to_string(),
            shortcuts: Vec::new(),
            description: String::new(),
            mode,
            is_list: false,
            default: Value::Null,
            choices: Vec::new(),
        }
    }

    /// A boolean flag; leading dashes in `name` are ignored
    pub fn flag(name: &str) -> Self {
        Self::with_mode(name, ValueMode::Flag)
    }

    /// An option that must be given a value
    pub fn value(name: &str) -> Self {
        Self::with_mode(name, ValueMode::Required)
    }

    /// An option whose value may be omitted
    pub fn optional_value(name: &str) -> Self {
        Self::with_mode(name, ValueMode::Optional)
    }

    /// Shortcuts separated by `|`, e.g. `"v|vv|vvv"`; leading dashes are ignored
    #[must_use]
    pub fn shortcut(mut self, shortcuts: &str) -> Self {
        self.shortcuts = shortcuts
            .split('|')
            .map(|s| s.trim().trim_start_matches('-'))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    /// Accumulate every occurrence instead of keeping the last
    #[must_use]
    pub fn list(mut self) -> Self {
        self.is_list = true;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    #[must_use]
    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shortcuts(&self) -> &[String] {
        &self.shortcuts
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn is_flag(&self) -> bool {
        self.mode == ValueMode::Flag
    }

    pub fn accepts_value(&self) -> bool {
        self.mode != ValueMode::Flag
    }

    pub fn requires_value(&self) -> bool {
        self.mode == ValueMode::Required
    }

    pub fn is_list(&self) -> bool {
        self.is_list
    }

    pub fn get_choices(&self) -> &[String] {
        &self.choices
    }

    /// The value read when the option is not supplied.
    ///
    /// Flags read as `false` and list options as an empty list.
    pub fn default(&self) -> Value {
        match &self.default {
            Value::Null if self.is_flag() => Value::Bool(false),
            Value::Null if self.is_list => Value::List(Vec::new()),
            other => other.clone(),
        }
    }

    /// Check the descriptor's own invariants
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConsoleError::logic("An option name cannot be empty"));
        }
        if self.is_flag() {
            if !self.default.is_null() {
                return Err(ConsoleError::logic(format!(
                    "A flag option (\"--{}\") cannot have a default value",
                    self.name
                )));
            }
            if !self.choices.is_empty() {
                return Err(ConsoleError::logic(format!(
                    "A flag option (\"--{}\") cannot have choices",
                    self.name
                )));
            }
            if self.is_list {
                return Err(ConsoleError::logic(format!(
                    "A flag option (\"--{}\") cannot be a list",
                    self.name
                )));
            }
        }
        if !self.choices.is_empty() && !self.requires_value() {
            return Err(ConsoleError::logic(format!(
                "An option with choices (\"--{}\") must require a value",
                self.name
            )));
        }
        if self.is_list && !self.requires_value() {
            return Err(ConsoleError::logic(format!(
                "A list option (\"--{}\") must require a value",
                self.name
            )));
        }
        if self.is_list && !self.default.is_null() && !self.default.is_list() {
            return Err(ConsoleError::logic(format!(
                "A default value for the list option \"--{}\" must be a list",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_shortcuts_are_normalized() {
        let opt = InputOption::flag("--verbose").shortcut("-v|vv|vvv");
        assert_eq!(opt.name(), "verbose");
        assert_eq!(opt.shortcuts(), ["v", "vv", "vvv"]);
    }

    #[test]
    fn test_flag_invariants() {
        assert!(InputOption::flag("dry-run").validate().is_ok());
        assert!(InputOption::flag("x").default_value("y").validate().is_err());
        assert!(InputOption::flag("x").choices(["a"]).validate().is_err());
        assert!(InputOption::flag("x").list().validate().is_err());
    }

    #[test]
    fn test_choices_require_a_value() {
        let opt = InputOption::optional_value("env").choices(["dev", "prod"]);
        assert!(matches!(opt.validate(), Err(ConsoleError::Logic { .. })));
        assert!(InputOption::value("env").choices(["dev"]).validate().is_ok());
    }

    #[test]
    fn test_list_requires_a_value() {
        let opt = InputOption::optional_value("tag").list();
        assert!(matches!(opt.validate(), Err(ConsoleError::Logic { .. })));
        assert!(InputOption::value("tag").list().validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(InputOption::flag("x").default(), Value::Bool(false));
        assert_eq!(
            InputOption::value("tag").list().default(),
            Value::List(Vec::new())
        );
        assert_eq!(InputOption::value("x").default(), Value::Null);
    }
}
