//! Schema of the arguments and options a command accepts
//!
//! Insertion order of arguments is their positional order, so both maps are
//! ordered. Every insertion enforces the ordering and uniqueness rules
//! eagerly; a violation is a [`ConsoleError::Logic`].

use crate::core::argument::Argument;
use crate::core::option::InputOption;
use crate::error::{ConsoleError, Result};
use indexmap::IndexMap;

/// Ordered set of arguments and options
#[derive(Debug, Clone, Default)]
pub struct Definition {
    arguments: IndexMap<String, Argument>,
    options: IndexMap<String, InputOption>,
    shortcuts: IndexMap<String, String>,
    required_count: usize,
    has_list_argument: bool,
    has_optional_argument: bool,
}

impl Definition {
    /// Create an empty definition
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a definition from arguments and options in one go
    pub fn with(
        arguments: impl IntoIterator<Item = Argument>,
        options: impl IntoIterator<Item = InputOption>,
    ) -> Result<Self> {
        let mut definition = Self::new();
        definition.add_arguments(arguments)?;
        definition.add_options(options)?;
        Ok(definition)
    }

    // Arguments

    pub fn add_argument(&mut self, argument: Argument) -> Result<()> {
        argument.validate()?;

        if self.arguments.contains_key(argument.name()) {
            return Err(ConsoleError::logic(format!(
                "An argument with name \"{}\" already exists",
                argument.name()
            )));
        }
        if self.has_list_argument {
            return Err(ConsoleError::logic(
                "Cannot add an argument after a list argument",
            ));
        }
        if argument.is_required() && self.has_optional_argument {
            return Err(ConsoleError::logic(
                "Cannot add a required argument after an optional one",
            ));
        }

        if argument.is_list() {
            self.has_list_argument = true;
        }
        if argument.is_required() {
            self.required_count += 1;
        } else {
            self.has_optional_argument = true;
        }
        self.arguments.insert(argument.name().to_string(), argument);
        Ok(())
    }

    pub fn add_arguments(&mut self, arguments: impl IntoIterator<Item = Argument>) -> Result<()> {
        for argument in arguments {
            self.add_argument(argument)?;
        }
        Ok(())
    }

    /// Replace every argument at once.
    ///
    /// On error the previous arguments are left untouched.
    pub fn set_arguments(&mut self, arguments: impl IntoIterator<Item = Argument>) -> Result<()> {
        let mut fresh = Self::new();
        fresh.add_arguments(arguments)?;
        self.arguments = fresh.arguments;
        self.required_count = fresh.required_count;
        self.has_list_argument = fresh.has_list_argument;
        self.has_optional_argument = fresh.has_optional_argument;
        Ok(())
    }

    pub fn argument(&self, name: &str) -> Result<&Argument> {
        self.arguments.get(name).ok_or_else(|| {
            ConsoleError::value(format!("The \"{name}\" argument does not exist"))
        })
    }

    pub fn argument_at(&self, index: usize) -> Result<&Argument> {
        self.arguments
            .get_index(index)
            .map(|(_, argument)| argument)
            .ok_or_else(|| {
                ConsoleError::value(format!("There is no argument at position {index}"))
            })
    }

    pub fn has_argument(&self, name: &str) -> bool {
        self.arguments.contains_key(name)
    }

    pub fn has_argument_at(&self, index: usize) -> bool {
        index < self.arguments.len()
    }

    pub fn arguments(&self) -> impl Iterator<Item = &Argument> {
        self.arguments.values()
    }

    pub fn argument_names(&self) -> impl Iterator<Item = &str> {
        self.arguments.keys().map(String::as_str)
    }

    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    pub fn required_argument_count(&self) -> usize {
        self.required_count
    }

    pub fn has_list_argument(&self) -> bool {
        self.has_list_argument
    }

    pub fn has_optional_argument(&self) -> bool {
        self.has_optional_argument
    }

    // Options

    pub fn add_option(&mut self, option: InputOption) -> Result<()> {
        option.validate()?;

        if self.options.contains_key(option.name()) {
            return Err(ConsoleError::logic(format!(
                "An option named \"{}\" already exists",
                option.name()
            )));
        }
        if let Some(taken) = option
            .shortcuts()
            .iter()
            .find(|s| self.shortcuts.contains_key(s.as_str()))
        {
            return Err(ConsoleError::logic(format!(
                "An option with shortcut \"{taken}\" already exists"
            )));
        }

        for shortcut in option.shortcuts() {
            self.shortcuts
                .insert(shortcut.clone(), option.name().to_string());
        }
        self.options.insert(option.name().to_string(), option);
        Ok(())
    }

    pub fn add_options(&mut self, options: impl IntoIterator<Item = InputOption>) -> Result<()> {
        for option in options {
            self.add_option(option)?;
        }
        Ok(())
    }

    /// Replace every option at once.
    ///
    /// On error the previous options are left untouched.
    pub fn set_options(&mut self, options: impl IntoIterator<Item = InputOption>) -> Result<()> {
        let mut fresh = Self::new();
        fresh.add_options(options)?;
        self.options = fresh.options;
        self.shortcuts = fresh.shortcuts;
        Ok(())
    }

    pub fn option(&self, name: &str) -> Result<&InputOption> {
        self.options
            .get(name)
            .ok_or_else(|| ConsoleError::value(format!("The \"--{name}\" option does not exist")))
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn options(&self) -> impl Iterator<Item = &InputOption> {
        self.options.values()
    }

    pub fn has_shortcut(&self, shortcut: &str) -> bool {
        self.shortcuts.contains_key(shortcut)
    }

    pub fn shortcut_to_name(&self, shortcut: &str) -> Result<&str> {
        self.shortcuts
            .get(shortcut)
            .map(String::as_str)
            .ok_or_else(|| ConsoleError::value(format!("The \"-{shortcut}\" option does not exist")))
    }

    pub fn option_for_shortcut(&self, shortcut: &str) -> Result<&InputOption> {
        self.option(self.shortcut_to_name(shortcut)?)
    }

    /// Render the usage grammar, e.g. `[options] [--] <name> [<extra>...]`
    pub fn synopsis(&self, short: bool) -> String {
        let mut elements: Vec<String> = Vec::new();

        if short && !self.options.is_empty() {
            elements.push("[options]".to_string());
        } else if !short {
            for option in self.options.values() {
                let mut value = String::new();
                if option.accepts_value() {
                    let placeholder = option.name().to_uppercase().replace('-', "_");
                    if option.requires_value() {
                        value = format!(" {placeholder}");
                    } else {
                        value = format!(" [{placeholder}]");
                    }
                }
                let shortcut = if option.shortcuts().is_empty() {
                    String::new()
                } else {
                    format!("-{}|", option.shortcuts().join("|"))
                };
                elements.push(format!("[{shortcut}--{}{value}]", option.name()));
            }
        }

        if !elements.is_empty() && !self.arguments.is_empty() {
            elements.push("[--]".to_string());
        }

        let mut tail = String::new();
        for argument in self.arguments.values() {
            let mut element = format!("<{}>", argument.name());
            if argument.is_list() {
                element.push_str("...");
            }
            if !argument.is_required() {
                element.insert(0, '[');
                tail.push(']');
            }
            elements.push(element);
        }

        elements.join(" ") + &tail
    }
}
