//! Positional argument descriptor

use crate::core::value::Value;
use crate::error::{ConsoleError, Result};

/// A named positional value accepted by a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    name: String,
    description: String,
    required: bool,
    is_list: bool,
    default: Value,
    choices: Vec<String>,
}

impl Argument {
    /// Create an optional scalar argument
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            required: false,
            is_list: false,
            default: Value::Null,
            choices: Vec::new(),
        }
    }

    /// Mark the argument as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Make the argument collect every remaining positional token
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

    /// Restrict accepted values to an allow-list
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

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_list(&self) -> bool {
        self.is_list
    }

    pub fn get_choices(&self) -> &[String] {
        &self.choices
    }

    /// The value read when the argument is not supplied.
    ///
    /// An unset list argument reads as an empty list, never null.
    pub fn default(&self) -> Value {
        match &self.default {
            Value::Null if self.is_list => Value::List(Vec::new()),
            other => other.clone(),
        }
    }

    /// Check the descriptor's own invariants
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConsoleError::logic("An argument name cannot be empty"));
        }
        if self.default.is_null() {
            return Ok(());
        }
        if self.required {
            return Err(ConsoleError::logic(format!(
                "Cannot set a default value for the required argument \"{}\"",
                self.name
            )));
        }
        if self.is_list && !self.default.is_list() {
            return Err(ConsoleError::logic(format!(
                "A default value for the list argument \"{}\" must be a list",
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
    fn test_required_argument_rejects_default() {
        let arg = Argument::new("file").required().default_value("a.txt");
        assert!(matches!(arg.validate(), Err(ConsoleError::Logic { .. })));
    }

    #[test]
    fn test_list_argument_default_must_be_list() {
        let arg = Argument::new("files").list().default_value("a.txt");
        assert!(arg.validate().is_err());

        let arg = Argument::new("files").list().default_value(vec!["a.txt"]);
        assert!(arg.validate().is_ok());
    }

    #[test]
    fn test_unset_list_defaults_to_empty() {
        let arg = Argument::new("files").list();
        assert_eq!(arg.default(), Value::List(Vec::new()));
        assert_eq!(Argument::new("x").default(), Value::Null);
    }
}
