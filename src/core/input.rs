//! Token stream and its binding against a [`Definition`]
//!
//! An [`Input`] owns the raw tokens for one resolution pass. It can be
//! inspected before any definition is known (the raw prescan helpers), bound
//! leniently against an incomplete definition, or fully bound and validated.
//! Every bind starts from the untouched tokens, so binding again against a
//! larger definition is always safe.

use crate::core::definition::Definition;
use crate::core::tokenizer::CommandLineTokenizer;
use crate::core::value::Value;
use crate::error::{ConsoleError, Result};
use indexmap::IndexMap;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Raw tokens plus the values bound from them
#[derive(Debug, Clone)]
pub struct Input {
    tokens: Vec<String>,
    script_name: Option<String>,
    definition: Definition,
    arguments: IndexMap<String, Value>,
    options: IndexMap<String, Value>,
    interactive: bool,
}

impl Input {
    /// Build from a process argument vector; the first element is the script name
    pub fn from_argv<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let script_name = argv.next();
        let mut input = Self::from_tokens(argv);
        input.script_name = script_name;
        input
    }

    /// Build from tokens that do not include a script name
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            script_name: None,
            definition: Definition::new(),
            arguments: IndexMap::new(),
            options: IndexMap::new(),
            interactive: true,
        }
    }

    /// Build from a shell-like command-line string
    pub fn from_command_line(line: &str) -> Result<Self> {
        let tokens = CommandLineTokenizer::new()?.tokenize(line)?;
        Ok(Self::from_tokens(tokens))
    }

    /// A fresh, unbound input over `tokens` keeping the script name and interactivity
    pub fn with_tokens<I, S>(&self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut input = Self::from_tokens(tokens);
        input.script_name = self.script_name.clone();
        input.interactive = self.interactive;
        input
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn script_name(&self) -> Option<&str> {
        self.script_name.as_deref()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    /// The definition of the most recent bind
    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    // Raw prescan

    /// Whether any token is one of `values` or starts with `--value=` / `-v`.
    ///
    /// Works on the raw tokens and never fails. With `only_params` the scan
    /// stops at `--`.
    pub fn has_parameter_option(&self, values: &[&str], only_params: bool) -> bool {
        for token in &self.tokens {
            if only_params && token == "--" {
                return false;
            }
            if values
                .iter()
                .any(|value| token == value || token.starts_with(&Self::leading(value)))
            {
                return true;
            }
        }
        false
    }

    /// The raw value following one of `values`, e.g. `--env=prod` or `--env prod`.
    ///
    /// Returns `default` when none of `values` occurs and `None` when the
    /// option is the last token.
    pub fn parameter_option(
        &self,
        values: &[&str],
        default: Option<&str>,
        only_params: bool,
    ) -> Option<String> {
        let mut tokens = self.tokens.iter();
        while let Some(token) = tokens.next() {
            if only_params && token == "--" {
                break;
            }
            for value in values {
                if token == value {
                    return tokens.next().cloned();
                }
                let leading = Self::leading(value);
                if let Some(rest) = token.strip_prefix(&leading) {
                    return Some(rest.to_string());
                }
            }
        }
        default.map(str::to_string)
    }

    /// Long options carry their value after `=`, short ones right after the letter
    fn leading(value: &str) -> String {
        if value.starts_with("--") {
            format!("{value}=")
        } else {
            value.to_string()
        }
    }

    /// The first token that is neither an option nor an option's value.
    ///
    /// Uses the most recent bind to tell a value-taking option (`--env prod`)
    /// from a flag followed by a positional (`--force prod`).
    pub fn first_argument(&self) -> Option<&str> {
        let mut skip_next = false;
        for (i, token) in self.tokens.iter().enumerate() {
            if skip_next {
                skip_next = false;
                continue;
            }
            if token == "--" {
                return self.tokens.get(i + 1).map(String::as_str);
            }
            if token.starts_with('-') && token != "-" {
                if token.contains('=') || i + 1 >= self.tokens.len() {
                    continue;
                }
                // Only the last letter of a short set can take a spaced value.
                let name = match token.strip_prefix("--") {
                    Some(long) => Some(long.to_string()),
                    None => token
                        .chars()
                        .last()
                        .and_then(|c| self.definition.shortcut_to_name(&c.to_string()).ok())
                        .map(str::to_string),
                };
                skip_next = name.is_some_and(|name| {
                    self.options
                        .get(&name)
                        .is_some_and(|bound| bound.as_list().contains(&self.tokens[i + 1]))
                });
                continue;
            }
            return Some(token);
        }
        None
    }

    // Binding

    /// Bind every token against `definition`, failing on the first user error
    pub fn bind(&mut self, definition: &Definition) -> Result<()> {
        self.reset(definition);
        match self.parse(false) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Bind against a possibly incomplete definition, skipping what does not fit.
    ///
    /// Returns the first user error that was skipped. Other errors still fail.
    pub fn bind_lenient(&mut self, definition: &Definition) -> Result<Option<ConsoleError>> {
        self.reset(definition);
        match self.parse(true) {
            Some(err) if !err.is_user_error() => Err(err),
            skipped => Ok(skipped),
        }
    }

    fn reset(&mut self, definition: &Definition) {
        self.definition = definition.clone();
        self.arguments.clear();
        self.options.clear();
    }

    /// Walk a fresh copy of the tokens. Returns the first error; when
    /// `lenient` the walk continues past user errors.
    fn parse(&mut self, lenient: bool) -> Option<ConsoleError> {
        let mut parsed: VecDeque<String> = self.tokens.iter().cloned().collect();
        let mut parse_options = true;
        let mut first_error = None;

        while let Some(token) = parsed.pop_front() {
            trace!("Parsing token {:?}", token);
            let result = if parse_options && token == "--" {
                parse_options = false;
                Ok(())
            } else if parse_options && token.starts_with("--") {
                self.parse_long_option(&token, &mut parsed)
            } else if parse_options && token.starts_with('-') && token != "-" {
                self.parse_short_option(&token, &mut parsed)
            } else {
                self.parse_argument(token)
            };

            if let Err(err) = result {
                if !lenient || !err.is_user_error() {
                    return Some(err);
                }
                debug!("Skipping token during lenient bind: {}", err);
                first_error.get_or_insert(err);
            }
        }
        first_error
    }

    fn parse_argument(&mut self, token: String) -> Result<()> {
        let position = self.arguments.len();

        if let Ok(argument) = self.definition.argument_at(position) {
            let value = if argument.is_list() {
                Value::List(vec![token])
            } else {
                Value::String(token)
            };
            self.arguments.insert(argument.name().to_string(), value);
            return Ok(());
        }

        if let Some(last) = position
            .checked_sub(1)
            .and_then(|i| self.definition.argument_at(i).ok())
            .filter(|argument| argument.is_list())
        {
            if let Some(Value::List(items)) = self.arguments.get_mut(last.name()) {
                items.push(token);
                return Ok(());
            }
        }

        if self.definition.argument_count() == 0 {
            return Err(ConsoleError::invalid_input(format!(
                "No arguments expected, got \"{token}\"."
            )));
        }
        let expected: Vec<&str> = self.definition.argument_names().collect();
        Err(ConsoleError::invalid_input(format!(
            "Too many arguments, expected arguments \"{}\".",
            expected.join("\" \"")
        )))
    }

    fn parse_long_option(&mut self, token: &str, parsed: &mut VecDeque<String>) -> Result<()> {
        let name = &token[2..];
        match name.split_once('=') {
            Some((name, value)) => self.add_long_option(name, Some(value.to_string()), parsed),
            None => self.add_long_option(name, None, parsed),
        }
    }

    fn parse_short_option(&mut self, token: &str, parsed: &mut VecDeque<String>) -> Result<()> {
        let name = &token[1..];
        let mut letters = name.char_indices();
        let Some((_, first)) = letters.next() else {
            return Ok(());
        };

        if letters.next().is_none() {
            return self.add_short_option(&first.to_string(), None, parsed);
        }

        let first_takes_value = self
            .definition
            .option_for_shortcut(&first.to_string())
            .is_ok_and(|option| option.accepts_value());
        if first_takes_value {
            // -ovalue
            let rest = &name[first.len_utf8()..];
            self.add_short_option(&first.to_string(), Some(rest.to_string()), parsed)
        } else {
            self.parse_short_option_set(name, parsed)
        }
    }

    /// `-abc`: flags until the first letter that accepts a value, which takes
    /// the rest of the token or the next token
    fn parse_short_option_set(&mut self, set: &str, parsed: &mut VecDeque<String>) -> Result<()> {
        for (index, letter) in set.char_indices() {
            let shortcut = letter.to_string();
            let Ok(option) = self.definition.option_for_shortcut(&shortcut) else {
                return Err(ConsoleError::no_such_option(format!("-{letter}")));
            };
            let name = option.name().to_string();

            if option.accepts_value() {
                let rest = &set[index + letter.len_utf8()..];
                let value = (!rest.is_empty()).then(|| rest.to_string());
                return self.add_long_option(&name, value, parsed);
            }
            self.add_long_option(&name, None, parsed)?;
        }
        Ok(())
    }

    fn add_short_option(
        &mut self,
        shortcut: &str,
        value: Option<String>,
        parsed: &mut VecDeque<String>,
    ) -> Result<()> {
        let name = self
            .definition
            .shortcut_to_name(shortcut)
            .map_err(|_| ConsoleError::no_such_option(format!("-{shortcut}")))?
            .to_string();
        self.add_long_option(&name, value, parsed)
    }

    fn add_long_option(
        &mut self,
        name: &str,
        value: Option<String>,
        parsed: &mut VecDeque<String>,
    ) -> Result<()> {
        let option = self
            .definition
            .option(name)
            .map_err(|_| ConsoleError::no_such_option(format!("--{name}")))?;

        if value.is_some() && !option.accepts_value() {
            return Err(ConsoleError::invalid_input(format!(
                "The \"--{name}\" option does not accept a value."
            )));
        }

        let mut value = value;
        if value.is_none() && option.accepts_value() {
            if let Some(next) = parsed.front() {
                if !next.starts_with('-') || next.is_empty() {
                    value = parsed.pop_front();
                }
            }
        }

        let value = match value {
            Some(value) => Value::String(value),
            None if option.requires_value() => {
                return Err(ConsoleError::invalid_input(format!(
                    "The \"--{name}\" option requires a value."
                )));
            }
            None if option.is_flag() => Value::Bool(true),
            None => Value::Null,
        };

        if option.is_list() {
            let entry = self
                .options
                .entry(name.to_string())
                .or_insert_with(|| Value::List(Vec::new()));
            if let (Value::List(items), Value::String(value)) = (entry, value) {
                items.push(value);
            }
        } else {
            self.options.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// Check required arguments and allow-lists after a full bind
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<String> = self
            .definition
            .arguments()
            .filter(|argument| argument.is_required() && !self.arguments.contains_key(argument.name()))
            .map(|argument| argument.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConsoleError::missing_arguments(missing));
        }

        for argument in self.definition.arguments() {
            if let Some(value) = self.arguments.get(argument.name()) {
                Self::check_choices(argument.name(), argument.get_choices(), value)?;
            }
        }
        for option in self.definition.options() {
            if let Some(value) = self.options.get(option.name()) {
                Self::check_choices(&format!("--{}", option.name()), option.get_choices(), value)?;
            }
        }
        Ok(())
    }

    fn check_choices(name: &str, choices: &[String], value: &Value) -> Result<()> {
        if choices.is_empty() {
            return Ok(());
        }
        match value.as_list().iter().find(|v| !choices.contains(v)) {
            Some(bad) => Err(ConsoleError::invalid_input(format!(
                "Invalid value \"{bad}\" for \"{name}\". Possible values: {}",
                choices.join(", ")
            ))),
            None => Ok(()),
        }
    }

    // Bound values

    /// The bound value of an argument, or its default
    pub fn argument(&self, name: &str) -> Result<Value> {
        let argument = self.definition.argument(name)?;
        Ok(self
            .arguments
            .get(name)
            .cloned()
            .unwrap_or_else(|| argument.default()))
    }

    /// Every argument of the bound definition with its value or default
    pub fn arguments(&self) -> IndexMap<String, Value> {
        self.definition
            .arguments()
            .map(|argument| {
                let value = self
                    .arguments
                    .get(argument.name())
                    .cloned()
                    .unwrap_or_else(|| argument.default());
                (argument.name().to_string(), value)
            })
            .collect()
    }

    pub fn set_argument(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.definition.argument(name)?;
        self.arguments.insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn has_argument(&self, name: &str) -> bool {
        self.definition.has_argument(name)
    }

    /// Whether a positional token was bound to the argument
    pub fn argument_given(&self, name: &str) -> bool {
        self.arguments.contains_key(name)
    }

    /// The bound value of an option, or its default
    pub fn option(&self, name: &str) -> Result<Value> {
        let option = self.definition.option(name)?;
        Ok(self
            .options
            .get(name)
            .cloned()
            .unwrap_or_else(|| option.default()))
    }

    /// Every option of the bound definition with its value or default
    pub fn options(&self) -> IndexMap<String, Value> {
        self.definition
            .options()
            .map(|option| {
                let value = self
                    .options
                    .get(option.name())
                    .cloned()
                    .unwrap_or_else(|| option.default());
                (option.name().to_string(), value)
            })
            .collect()
    }

    pub fn set_option(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.definition.option(name)?;
        self.options.insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.definition.has_option(name)
    }

    /// Whether the option appeared in the tokens, with or without a value
    pub fn option_given(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }
}
