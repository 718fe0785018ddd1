//! Commands, their lifecycle hooks and the execution context handed to them

use crate::core::application::Application;
use crate::core::argument::Argument;
use crate::core::definition::Definition;
use crate::core::input::Input;
use crate::core::option::InputOption;
use crate::core::value::Value;
use crate::error::Result;
use crate::utils::io::Io;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Behaviour behind a command.
///
/// Only `handle` is required. `initialize` runs right after binding and
/// `interact` only when the input is interactive, both before validation.
pub trait CommandHandler {
    fn handle(&self, ctx: &mut Context<'_>) -> anyhow::Result<i32>;

    fn initialize(&self, _ctx: &mut Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn interact(&self, _ctx: &mut Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

struct FnHandler<F>(F);

impl<F> CommandHandler for FnHandler<F>
where
    F: Fn(&mut Context<'_>) -> anyhow::Result<i32>,
{
    fn handle(&self, ctx: &mut Context<'_>) -> anyhow::Result<i32> {
        (self.0)(ctx)
    }
}

/// A named command with its own definition
pub struct Command {
    name: String,
    description: String,
    aliases: Vec<String>,
    hidden: bool,
    enabled: bool,
    ignore_validation_errors: bool,
    definition: Definition,
    handler: Box<dyn CommandHandler>,
    merged: RefCell<Option<Definition>>,
}

impl Command {
    /// Create a new command; spaces in `name` place it in a namespace
    pub fn new(name: impl Into<String>, handler: impl CommandHandler + 'static) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            aliases: Vec::new(),
            hidden: false,
            enabled: true,
            ignore_validation_errors: false,
            definition: Definition::new(),
            handler: Box::new(handler),
            merged: RefCell::new(None),
        }
    }

    /// Create a new command whose only hook is `handle`
    pub fn from_fn<F>(name: impl Into<String>, handle: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> anyhow::Result<i32> + 'static,
    {
        Self::new(name, FnHandler(handle))
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Disabled commands are silently skipped at registration
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Keep going when binding the full input fails
    #[must_use]
    pub fn ignore_validation_errors(mut self) -> Self {
        self.ignore_validation_errors = true;
        self
    }

    pub fn argument(mut self, argument: Argument) -> Result<Self> {
        self.definition.add_argument(argument)?;
        self.invalidate_merged();
        Ok(self)
    }

    pub fn option(mut self, option: InputOption) -> Result<Self> {
        self.definition.add_option(option)?;
        self.invalidate_merged();
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ignores_validation_errors(&self) -> bool {
        self.ignore_validation_errors
    }

    /// The command's own definition
    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    /// Own definition layered over the application's global one.
    ///
    /// Own options come first, then global ones; global arguments come
    /// first, then own ones. Cached until [`Command::invalidate_merged`].
    pub fn merged_definition(&self, global: &Definition) -> Result<Definition> {
        if let Some(merged) = self.merged.borrow().as_ref() {
            return Ok(merged.clone());
        }

        let mut merged = Definition::new();
        merged.add_options(self.definition.options().cloned())?;
        merged.add_options(global.options().cloned())?;
        merged.add_arguments(global.arguments().cloned())?;
        merged.add_arguments(self.definition.arguments().cloned())?;

        *self.merged.borrow_mut() = Some(merged.clone());
        Ok(merged)
    }

    /// Drop the cached merged definition
    pub fn invalidate_merged(&self) {
        self.merged.borrow_mut().take();
    }

    /// Usage line, e.g. `db init [options] [--] <env>`
    pub fn synopsis(&self, short: bool) -> String {
        let grammar = self.definition.synopsis(short);
        if grammar.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, grammar)
        }
    }

    pub(crate) fn initialize(&self, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        self.handler.initialize(ctx)
    }

    pub(crate) fn interact(&self, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        self.handler.interact(ctx)
    }

    pub(crate) fn execute(&self, ctx: &mut Context<'_>) -> anyhow::Result<i32> {
        self.handler.handle(ctx)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("hidden", &self.hidden)
            .field("enabled", &self.enabled)
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

/// Everything a running command can reach
pub struct Context<'a> {
    application: &'a Application,
    command: Rc<Command>,
    input: Input,
    io: &'a mut Io,
    target: Option<Rc<Command>>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        application: &'a Application,
        command: Rc<Command>,
        input: Input,
        io: &'a mut Io,
        target: Option<Rc<Command>>,
    ) -> Self {
        Self {
            application,
            command,
            input,
            io,
            target,
        }
    }

    pub fn application(&self) -> &'a Application {
        self.application
    }

    /// The command being run
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// The command `--help` was requested for, when running `help` on its behalf
    pub fn target(&self) -> Option<Rc<Command>> {
        self.target.clone()
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut Input {
        &mut self.input
    }

    pub fn io(&mut self) -> &mut Io {
        &mut *self.io
    }

    pub fn argument(&self, name: &str) -> Result<Value> {
        self.input.argument(name)
    }

    pub fn option(&self, name: &str) -> Result<Value> {
        self.input.option(name)
    }

    /// Write a line at normal verbosity
    pub fn write_line(&mut self, message: &str) -> std::io::Result<()> {
        self.io.write_line(message)
    }

    /// Run another registered command with a shell-like argument string
    pub fn call(&mut self, name: &str, args: &str) -> anyhow::Result<i32> {
        self.application.call(name, args, self.io)
    }

    /// Like [`Context::call`] but discards everything the command writes
    pub fn call_silent(&mut self, name: &str, args: &str) -> anyhow::Result<i32> {
        let mut silent = self.io.silent();
        self.application.call(name, args, &mut silent)
    }
}
