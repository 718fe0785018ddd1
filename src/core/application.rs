//! Command registry and dispatcher
//!
//! An [`Application`] owns the global definition and every registered
//! command. [`Application::run`] takes one [`Input`] through the dispatch
//! pipeline:
//!
//! 1. prescan the raw tokens for global flags, binding leniently
//! 2. resolve the (possibly multi-word) command name
//! 3. merge the command's definition with the global one and rebind
//! 4. validate, then hand over to the command's handler

use crate::config::Config;
use crate::core::argument::Argument;
use crate::core::builtin;
use crate::core::command::{Command, Context};
use crate::core::definition::Definition;
use crate::core::input::Input;
use crate::core::loader::CommandLoader;
use crate::core::option::InputOption;
use crate::core::similarity::find_similar_names;
use crate::core::tokenizer::CommandLineTokenizer;
use crate::error::{ConsoleError, Result, exit_code, exit_code_for};
use crate::utils::io::{Io, Verbosity};
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, info, instrument, warn};

/// Where the dispatcher is in handling the current input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Created,
    GlobalOptionsPrescanned,
    NameResolved,
    DefinitionMerged,
    Validated,
    Dispatching,
    Completed,
    Failed,
}

/// Registry of commands plus the dispatch pipeline
pub struct Application {
    config: Config,
    definition: Definition,
    commands: RefCell<IndexMap<String, Rc<Command>>>,
    loader: Option<Box<dyn CommandLoader>>,
    initialized: Cell<bool>,
    state: Cell<DispatchState>,
}

impl Application {
    /// Create a new application with the default global definition
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            definition: Self::default_definition()?,
            commands: RefCell::new(IndexMap::new()),
            loader: None,
            initialized: Cell::new(false),
            state: Cell::new(DispatchState::Created),
        })
    }

    fn default_definition() -> Result<Definition> {
        Definition::with(
            [Argument::new("command")
                .required()
                .description("The command to execute")],
            [
                InputOption::flag("help")
                    .shortcut("h")
                    .description("Display help for the given command. When no command is given display help for the list command."),
                InputOption::flag("quiet")
                    .shortcut("q")
                    .description("Do not output any message."),
                InputOption::flag("verbose")
                    .shortcut("v|vv|vvv")
                    .description("Increase the verbosity of messages: 1 for normal output, 2 for more verbose output and 3 for debug."),
                InputOption::flag("version")
                    .shortcut("V")
                    .description("Display this application version."),
                InputOption::flag("ansi").description("Force ANSI output."),
                InputOption::flag("no-ansi").description("Disable ANSI output."),
                InputOption::flag("no-interaction")
                    .shortcut("n")
                    .description("Do not ask any interactive question."),
            ],
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn long_version(&self) -> String {
        self.config.long_version()
    }

    pub fn state(&self) -> DispatchState {
        self.state.get()
    }

    fn transition(&self, state: DispatchState) {
        debug!("Dispatch state: {:?} -> {:?}", self.state.get(), state);
        self.state.set(state);
    }

    /// The global definition as configured
    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    /// Replace the global definition; cached merged definitions are dropped
    pub fn set_definition(&mut self, definition: Definition) {
        self.definition = definition;
        for command in self.commands.borrow().values() {
            command.invalidate_merged();
        }
    }

    /// The definition every command is merged with.
    ///
    /// In single-command mode there are no global arguments, so every
    /// positional belongs to the default command.
    pub fn global_definition(&self) -> Result<Definition> {
        let mut definition = self.definition.clone();
        if self.config.single_command {
            definition.set_arguments(Vec::new())?;
        }
        Ok(definition)
    }

    /// Global definition with `command` collecting every positional, so each
    /// word of a namespaced name is visible to name resolution
    fn prescan_definition(&self) -> Result<Definition> {
        let mut definition = self.global_definition()?;
        if !definition.has_argument("command") {
            return Ok(definition);
        }
        let mut arguments: Vec<Argument> = definition
            .arguments()
            .take_while(|argument| argument.name() != "command")
            .cloned()
            .collect();
        arguments.push(Argument::new("command").required().list());
        definition.set_arguments(arguments)?;
        Ok(definition)
    }

    pub fn set_command_loader(&mut self, loader: impl CommandLoader + 'static) {
        self.loader = Some(Box::new(loader));
    }

    // Registry

    /// Register the built-in commands; later calls do nothing
    pub fn ensure_initialized(&self) -> Result<()> {
        if self.initialized.replace(true) {
            return Ok(());
        }
        debug!("Registering default commands");
        for command in builtin::default_commands()? {
            self.register(command)?;
        }
        Ok(())
    }

    /// Register a command under its name and aliases.
    ///
    /// Returns `None` for a disabled command, which is skipped.
    pub fn add(&self, command: Command) -> Result<Option<Rc<Command>>> {
        self.ensure_initialized()?;
        self.register(command)
    }

    fn register(&self, command: Command) -> Result<Option<Rc<Command>>> {
        if !command.is_enabled() {
            debug!("Skipping disabled command: {}", command.name());
            return Ok(None);
        }
        if command.name().is_empty() {
            return Err(ConsoleError::logic("A command name cannot be empty"));
        }

        let mut commands = self.commands.borrow_mut();
        let keys = std::iter::once(command.name())
            .chain(command.aliases().iter().map(String::as_str));
        for key in keys {
            if commands.contains_key(key) {
                return Err(ConsoleError::logic(format!(
                    "A command named \"{key}\" is already registered"
                )));
            }
        }

        command.invalidate_merged();
        let command = Rc::new(command);
        commands.insert(command.name().to_string(), Rc::clone(&command));
        for alias in command.aliases() {
            commands.insert(alias.clone(), Rc::clone(&command));
        }
        debug!("Registered command: {}", command.name());
        Ok(Some(command))
    }

    /// Whether `name` is registered, building it through the loader if needed
    pub fn has(&self, name: &str) -> Result<bool> {
        self.ensure_initialized()?;
        if self.commands.borrow().contains_key(name) {
            return Ok(true);
        }
        let Some(loader) = &self.loader else {
            return Ok(false);
        };
        if !loader.has(name) {
            return Ok(false);
        }
        let command = loader.get(name)?;
        Ok(self.register(command)?.is_some())
    }

    /// The command registered as `name`
    pub fn get(&self, name: &str) -> Result<Rc<Command>> {
        if !self.has(name)? {
            return Err(ConsoleError::command_not_found(name, Vec::new()));
        }
        self.commands
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| ConsoleError::command_not_found(name, Vec::new()))
    }

    /// Like [`Application::get`], suggesting similar names on failure
    #[instrument(skip(self))]
    pub fn find(&self, name: &str) -> Result<Rc<Command>> {
        if self.has(name)? {
            return self.get(name);
        }

        let mut known: Vec<String> = self
            .loader
            .as_ref()
            .map(|loader| loader.names())
            .unwrap_or_default();
        known.extend(
            self.commands
                .borrow()
                .iter()
                .filter(|(_, command)| !command.is_hidden())
                .map(|(key, _)| key.clone()),
        );

        let suggestions = find_similar_names(name, known.iter().map(String::as_str));
        debug!("Command {:?} not found, suggesting {:?}", name, suggestions);
        Err(ConsoleError::command_not_found(name, suggestions))
    }

    /// Every command keyed by name and alias, optionally limited to a namespace
    pub fn all(&self, namespace: Option<&str>) -> Result<IndexMap<String, Rc<Command>>> {
        self.ensure_initialized()?;
        let in_namespace = |name: &str| match namespace {
            None => true,
            Some(namespace) => {
                namespace == Self::extract_namespace(name, Some(namespace.matches(' ').count() + 1))
            }
        };

        let mut commands: IndexMap<String, Rc<Command>> = self
            .commands
            .borrow()
            .iter()
            .filter(|(name, _)| in_namespace(name))
            .map(|(name, command)| (name.clone(), Rc::clone(command)))
            .collect();

        let lazy = self
            .loader
            .as_ref()
            .map(|loader| loader.names())
            .unwrap_or_default();
        for name in lazy {
            if !commands.contains_key(&name) && in_namespace(&name) && self.has(&name)? {
                commands.insert(name.clone(), self.get(&name)?);
            }
        }
        Ok(commands)
    }

    /// Every namespace prefix of every visible command, in registration order
    pub fn namespaces(&self) -> Result<Vec<String>> {
        let mut namespaces: Vec<String> = Vec::new();
        for command in self.all(None)?.values() {
            if command.is_hidden() {
                continue;
            }
            let names = std::iter::once(command.name())
                .chain(command.aliases().iter().map(String::as_str));
            for namespace in names.flat_map(Self::extract_all_namespaces) {
                if !namespaces.contains(&namespace) {
                    namespaces.push(namespace);
                }
            }
        }
        Ok(namespaces)
    }

    /// Check that `namespace` exists
    pub fn find_namespace(&self, namespace: &str) -> Result<String> {
        let namespaces = self.namespaces()?;
        if namespaces.iter().any(|known| known == namespace) {
            return Ok(namespace.to_string());
        }
        let suggestions = find_similar_names(namespace, namespaces.iter().map(String::as_str));
        Err(ConsoleError::namespace_not_found(namespace, suggestions))
    }

    /// Namespace part of `name`, keeping at most `limit` words
    pub fn extract_namespace(name: &str, limit: Option<usize>) -> String {
        let mut parts: Vec<&str> = name.split(' ').collect();
        parts.pop();
        if let Some(limit) = limit {
            parts.truncate(limit);
        }
        parts.join(" ")
    }

    /// `"a b c"` → `["a", "a b"]`
    fn extract_all_namespaces(name: &str) -> Vec<String> {
        let parts: Vec<&str> = name.split(' ').collect();
        (1..parts.len()).map(|n| parts[..n].join(" ")).collect()
    }

    // Dispatch

    /// Run the input and return the exit code.
    ///
    /// Errors are rendered to the error output and mapped to an exit code,
    /// unless `catch_exceptions` is off, in which case they are returned.
    pub fn run(&self, mut input: Input, io: &mut Io) -> anyhow::Result<i32> {
        self.configure_io(&input, io);
        input.set_interactive(io.is_interactive());

        let result = self.dispatch(input, io);
        self.transition(if result.is_ok() {
            DispatchState::Completed
        } else {
            DispatchState::Failed
        });

        match result {
            Ok(code) if (0..=255).contains(&code) => Ok(code),
            Ok(code) => {
                warn!("Exit code {} is out of range, reporting 255", code);
                Ok(255)
            }
            Err(err) if self.config.catch_exceptions => {
                let code = exit_code_for(&err);
                if code == exit_code::BROKEN_PIPE {
                    return Ok(code);
                }
                self.render_error(&err, io);
                Ok(code)
            }
            Err(err) => Err(err),
        }
    }

    /// Apply the global terminal flags from the raw tokens
    pub fn configure_io(&self, input: &Input, io: &mut Io) {
        if input.has_parameter_option(&["--ansi"], true) {
            io.set_decorated(true);
        } else if input.has_parameter_option(&["--no-ansi"], true) {
            io.set_decorated(false);
        }
        if input.has_parameter_option(&["--no-interaction", "-n"], true) {
            io.set_interactive(false);
        }

        io.set_verbosity(Verbosity::detect(input, self.config.shell_verbosity));
        if io.is_quiet() {
            io.set_interactive(false);
        }
    }

    fn render_error(&self, err: &anyhow::Error, io: &mut Io) {
        let message = match err.downcast_ref::<ConsoleError>() {
            Some(console) => console.to_string(),
            None => format!("{err:#}"),
        };
        if let Err(write_err) = io.write_error_line(&message) {
            warn!("Failed to render error: {}", write_err);
        }
    }

    #[instrument(skip(self, input, io), fields(tokens = ?input.tokens()))]
    fn dispatch(&self, mut input: Input, io: &mut Io) -> anyhow::Result<i32> {
        self.transition(DispatchState::Created);

        if input.has_parameter_option(&["--version", "-V"], true) {
            io.write_line(&self.long_version())?;
            return Ok(exit_code::SUCCESS);
        }

        self.ensure_initialized()?;

        let prescan = self.prescan_definition()?;
        if let Some(skipped) = input.bind_lenient(&prescan)? {
            debug!("Prescan skipped: {}", skipped);
        }
        self.transition(DispatchState::GlobalOptionsPrescanned);

        let mut name = self.command_name(&input)?;
        let mut want_help = false;
        if input.has_parameter_option(&["--help", "-h"], true) {
            if name.is_none() {
                name = Some("help".to_string());
                input = input.with_tokens(["help", self.config.default_command.as_str()]);
            } else {
                want_help = true;
            }
        }
        let name = name.unwrap_or_else(|| self.config.default_command.clone());

        let command = match self.find(&name) {
            Ok(command) => command,
            Err(err @ ConsoleError::CommandNotFound { .. }) => {
                if !self.namespaces()?.contains(&name) {
                    return Err(err.into());
                }
                debug!("Listing namespace: {}", name);
                let list = self.get("list")?;
                let input = input.with_tokens(["list", name.as_str()]);
                self.transition(DispatchState::NameResolved);
                return self.run_command(list, input, io, None);
            }
            Err(err) => return Err(err.into()),
        };
        self.transition(DispatchState::NameResolved);
        info!("Running command: {}", command.name());

        if name.contains(' ') {
            input = Self::rewrite_namespaced(&input, &name);
        }

        if want_help {
            let help = self.get("help")?;
            return self.run_command(help, input, io, Some(command));
        }
        self.run_command(command, input, io, None)
    }

    /// Longest registered prefix of the `command` words, else the first positional
    fn command_name(&self, input: &Input) -> Result<Option<String>> {
        if self.config.single_command {
            return Ok(Some(self.config.default_command.clone()));
        }

        let words = input
            .argument("command")
            .map(|value| value.as_list().to_vec())
            .unwrap_or_default();
        let mut candidates: Vec<String> = Vec::with_capacity(words.len());
        for word in words {
            let candidate = match candidates.last() {
                Some(previous) => format!("{previous} {word}"),
                None => word,
            };
            candidates.push(candidate);
        }
        for candidate in candidates.iter().rev() {
            if self.has(candidate)? {
                return Ok(Some(candidate.clone()));
            }
        }
        Ok(input.first_argument().map(str::to_string))
    }

    /// Fold the words of a namespaced name into one token.
    ///
    /// The first token equal to the namespace is replaced, even when that
    /// token was meant as an option value.
    fn rewrite_namespaced(input: &Input, name: &str) -> Input {
        let mut tokens = input.tokens().to_vec();
        let words = name.split(' ').count();
        let namespace = name.split(' ').next().unwrap_or(name);

        if let Some(index) = tokens.iter().position(|token| token == namespace) {
            tokens[index] = name.to_string();
            let end = (index + words).min(tokens.len());
            tokens.drain(index + 1..end);
        }
        debug!("Rewrote tokens for {:?}: {:?}", name, tokens);
        input.with_tokens(tokens)
    }

    /// Merge, bind, validate and execute one command
    fn run_command(
        &self,
        command: Rc<Command>,
        mut input: Input,
        io: &mut Io,
        target: Option<Rc<Command>>,
    ) -> anyhow::Result<i32> {
        let definition = command.merged_definition(&self.global_definition()?)?;
        self.transition(DispatchState::DefinitionMerged);

        if let Err(err) = input.bind(&definition) {
            if !(err.is_user_error() && command.ignores_validation_errors()) {
                return Err(err.into());
            }
            debug!("Ignoring binding error for {}: {}", command.name(), err);
        }
        if input.has_argument("command") && !input.argument_given("command") {
            input.set_argument("command", command.name())?;
        }

        let interactive = input.is_interactive();
        let mut ctx = Context::new(self, Rc::clone(&command), input, io, target);
        command.initialize(&mut ctx)?;
        if interactive {
            command.interact(&mut ctx)?;
        }
        ctx.input().validate()?;
        self.transition(DispatchState::Validated);

        self.transition(DispatchState::Dispatching);
        command.execute(&mut ctx)
    }

    /// Run `name` with a shell-like argument string, sharing `io`.
    ///
    /// The caller's input and dispatch state are left untouched.
    pub fn call(&self, name: &str, args: &str, io: &mut Io) -> anyhow::Result<i32> {
        let command = self.get(name)?;

        let mut tokens = vec![command.name().to_string()];
        tokens.extend(CommandLineTokenizer::new()?.tokenize(args)?);
        let mut input = Input::from_tokens(tokens);
        input.set_interactive(io.is_interactive());
        debug!("Calling {} with {:?}", name, input.tokens());

        let saved = self.state.get();
        let result = self.run_command(command, input, io, None);
        self.state.set(saved);
        result
    }

    /// Like [`Application::call`] but discards all output
    pub fn call_silent(&self, name: &str, args: &str, io: &Io) -> anyhow::Result<i32> {
        let mut silent = io.silent();
        self.call(name, args, &mut silent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::CommandHandler;
    use crate::core::loader::FactoryCommandLoader;
    use crate::utils::io::Output;

    fn app() -> Application {
        Application::new(Config::new("tool", "1.0.0")).unwrap()
    }

    fn noop(name: &str) -> Command {
        Command::from_fn(name.to_string(), |_| Ok(0))
    }

    /// Prints `name=value` for every argument and option it was given
    fn echo(name: &str) -> Command {
        Command::from_fn(name.to_string(), |ctx| {
            let mut lines = Vec::new();
            for (key, value) in ctx.input().arguments() {
                lines.push(format!("{key}={value}"));
            }
            for (key, value) in ctx.input().options() {
                if ctx.input().option_given(&key) {
                    lines.push(format!("--{key}={value}"));
                }
            }
            for line in lines {
                ctx.write_line(&line)?;
            }
            Ok(0)
        })
    }

    fn run(app: &Application, tokens: &[&str]) -> (i32, String, String) {
        let mut io = Io::buffered();
        let code = app
            .run(Input::from_tokens(tokens.iter().copied()), &mut io)
            .unwrap();
        let out = io.output().contents().unwrap_or_default().to_string();
        let err = io.error_output().contents().unwrap_or_default().to_string();
        (code, out, err)
    }

    #[test]
    fn test_builtins_registered_once() {
        let app = app();
        assert!(app.has("help").unwrap());
        assert!(app.has("list").unwrap());
        app.ensure_initialized().unwrap();
        assert_eq!(app.all(None).unwrap().len(), 2);
    }

    #[test]
    fn test_add_registers_aliases_and_skips_disabled() {
        let app = app();
        let added = app.add(noop("deploy").alias("dep")).unwrap();
        assert!(added.is_some());
        assert_eq!(app.get("dep").unwrap().name(), "deploy");

        assert!(app.add(noop("old").enabled(false)).unwrap().is_none());
        assert!(!app.has("old").unwrap());
    }

    #[test]
    fn test_add_rejects_empty_and_duplicate_names() {
        let app = app();
        assert!(matches!(app.add(noop("")), Err(ConsoleError::Logic { .. })));

        app.add(noop("deploy")).unwrap();
        assert!(matches!(app.add(noop("deploy")), Err(ConsoleError::Logic { .. })));
        assert!(app.add(noop("ship").alias("deploy")).is_err());
        assert!(!app.has("ship").unwrap());
    }

    #[test]
    fn test_get_and_find() {
        let app = app();
        app.add(noop("greet")).unwrap();

        let err = app.get("gret").unwrap_err();
        assert!(err.suggestions().is_empty());

        let err = app.find("gret").unwrap_err();
        assert_eq!(err.code(), "command_not_found");
        assert_eq!(err.suggestions(), ["greet".to_string()]);
    }

    #[test]
    fn test_hidden_commands_are_not_suggested() {
        let app = app();
        app.add(noop("secret").hidden()).unwrap();
        assert!(app.find("secre").unwrap_err().suggestions().is_empty());
        assert!(app.find("secret").is_ok());
    }

    #[test]
    fn test_namespaces() {
        let app = app();
        app.add(noop("db init")).unwrap();
        app.add(noop("a b c")).unwrap();
        assert_eq!(app.namespaces().unwrap(), vec!["db", "a", "a b"]);

        assert_eq!(app.find_namespace("db").unwrap(), "db");
        let err = app.find_namespace("bd").unwrap_err();
        assert!(matches!(err, ConsoleError::NamespaceNotFound { .. }));
    }

    #[test]
    fn test_all_filters_by_namespace() {
        let app = app();
        app.add(noop("db init")).unwrap();
        app.add(noop("db migrate")).unwrap();
        app.add(noop("cache clear")).unwrap();

        let names: Vec<String> = app.all(Some("db")).unwrap().into_keys().collect();
        assert_eq!(names, vec!["db init", "db migrate"]);
    }

    #[test]
    fn test_extract_namespace() {
        assert_eq!(Application::extract_namespace("a b c", None), "a b");
        assert_eq!(Application::extract_namespace("a b c", Some(1)), "a");
        assert_eq!(Application::extract_namespace("list", None), "");
    }

    #[test]
    fn test_loader_commands_are_registered_on_demand() {
        let mut app = app();
        app.set_command_loader(
            FactoryCommandLoader::new().with_factory("db seed", || Ok(noop("db seed"))),
        );

        assert!(!app.commands.borrow().contains_key("db seed"));
        assert!(app.has("db seed").unwrap());
        assert!(app.commands.borrow().contains_key("db seed"));
        assert!(app.namespaces().unwrap().contains(&"db".to_string()));
    }

    #[test]
    fn test_loader_names_are_suggested() {
        let mut app = app();
        app.set_command_loader(
            FactoryCommandLoader::new().with_factory("deploy", || Ok(noop("deploy"))),
        );
        assert_eq!(
            app.find("deploi").unwrap_err().suggestions(),
            ["deploy".to_string()]
        );
    }

    #[test]
    fn test_version_flag() {
        let (code, out, _) = run(&app(), &["-V"]);
        assert_eq!(code, 0);
        assert_eq!(out, "tool (version 1.0.0)\n");
    }

    #[test]
    fn test_global_and_command_options_bind_together() {
        let app = app();
        app.add(
            echo("deploy")
                .argument(Argument::new("env").required())
                .unwrap()
                .option(InputOption::flag("force").shortcut("f"))
                .unwrap(),
        )
        .unwrap();

        let (code, out, _) = run(&app, &["-v", "deploy", "-f", "prod"]);
        assert_eq!(code, 0);
        assert!(out.contains("command=deploy"));
        assert!(out.contains("env=prod"));
        assert!(out.contains("--force=true"));
        assert!(out.contains("--verbose=true"));
        assert_eq!(app.state(), DispatchState::Completed);
    }

    #[test]
    fn test_namespaced_command_is_rewritten() {
        let app = app();
        app.add(
            echo("db init")
                .option(InputOption::flag("dry-run"))
                .unwrap(),
        )
        .unwrap();

        let (code, out, _) = run(&app, &["db", "init", "--dry-run"]);
        assert_eq!(code, 0);
        assert!(out.contains("command=db init"));
        assert!(out.contains("--dry-run=true"));
    }

    #[test]
    fn test_namespace_rewrite_replaces_first_matching_token() {
        let mut app = app();
        app.set_definition(
            Definition::with(
                [Argument::new("command").required()],
                [InputOption::value("env")],
            )
            .unwrap(),
        );
        app.add(echo("db init").argument(Argument::new("target")).unwrap())
            .unwrap();

        // The option value "db" is the first match, so it absorbs the full name
        let (code, out, _) = run(&app, &["--env", "db", "db", "init"]);
        assert_eq!(code, 0);
        assert!(out.contains("--env=db init"));
        assert!(out.contains("command=init"));
    }

    #[test]
    fn test_namespace_rewrite_drops_interleaved_options() {
        let app = app();
        app.add(
            echo("db init")
                .option(InputOption::flag("dry-run"))
                .unwrap(),
        )
        .unwrap();

        let (code, out, err) = run(&app, &["db", "--dry-run", "init"]);
        assert_eq!(code, exit_code::USAGE);
        assert!(out.is_empty());
        assert_eq!(err, "Too many arguments, expected arguments \"command\".\n");
    }

    #[test]
    fn test_longest_registered_prefix_wins() {
        let app = app();
        app.add(echo("db").argument(Argument::new("what")).unwrap())
            .unwrap();
        app.add(echo("db init")).unwrap();

        let (_, out, _) = run(&app, &["db", "init"]);
        assert!(out.contains("command=db init"));

        let (_, out, _) = run(&app, &["db", "status"]);
        assert!(out.contains("command=db"));
        assert!(out.contains("what=status"));
    }

    #[test]
    fn test_missing_arguments_fail_with_usage_code() {
        let app = app();
        app.add(
            noop("copy")
                .argument(Argument::new("source").required())
                .unwrap()
                .argument(Argument::new("target").required())
                .unwrap(),
        )
        .unwrap();

        let (code, _, err) = run(&app, &["copy"]);
        assert_eq!(code, exit_code::USAGE);
        assert!(err.contains("Not enough arguments (missing: \"source, target\")."));
        assert_eq!(app.state(), DispatchState::Failed);
    }

    #[test]
    fn test_unknown_command_suggests() {
        let app = app();
        app.add(noop("greet")).unwrap();

        let (code, _, err) = run(&app, &["gret"]);
        assert_eq!(code, exit_code::USAGE);
        assert!(err.contains("The command \"gret\" does not exist."));
        assert!(err.contains("Did you mean this?\n    greet"));
    }

    #[test]
    fn test_unknown_option_after_resolution_fails() {
        let app = app();
        app.add(noop("greet")).unwrap();
        let (code, _, err) = run(&app, &["greet", "--loud"]);
        assert_eq!(code, exit_code::USAGE);
        assert!(err.contains("The \"--loud\" option does not exist."));
    }

    #[test]
    fn test_ignore_validation_errors() {
        let app = app();
        app.add(echo("lenient").ignore_validation_errors()).unwrap();
        let (code, out, _) = run(&app, &["lenient", "--loud"]);
        assert_eq!(code, 0);
        assert!(out.contains("command=lenient"));
    }

    #[test]
    fn test_default_command_runs_without_name() {
        let app = app();
        let (code, out, _) = run(&app, &[]);
        assert_eq!(code, 0);
        assert!(out.contains("Available commands"));
    }

    #[test]
    fn test_bare_namespace_lists_its_commands() {
        let app = app();
        app.add(noop("db init").description("Create the schema")).unwrap();
        app.add(noop("greet")).unwrap();

        let (code, out, _) = run(&app, &["db"]);
        assert_eq!(code, 0);
        assert!(out.contains("db init"));
        assert!(!out.contains("greet"));
    }

    #[test]
    fn test_help_flag_targets_command() {
        let app = app();
        app.add(
            noop("deploy")
                .description("Ship it")
                .argument(Argument::new("env").required())
                .unwrap(),
        )
        .unwrap();

        let (code, out, _) = run(&app, &["deploy", "--help"]);
        assert_eq!(code, 0);
        assert!(out.contains("Ship it"));
        assert!(out.contains("deploy <env>"));
    }

    #[test]
    fn test_help_flag_alone_describes_default_command() {
        let (code, out, _) = run(&app(), &["-h"]);
        assert_eq!(code, 0);
        assert!(out.contains("Lists commands."));
    }

    #[test]
    fn test_single_command_mode() {
        let mut config = Config::new("greeter", "");
        config.single_command = true;
        config.default_command = "greet".to_string();
        let app = Application::new(config).unwrap();
        app.add(echo("greet").argument(Argument::new("name").required()).unwrap())
            .unwrap();

        let (code, out, _) = run(&app, &["Ada"]);
        assert_eq!(code, 0);
        assert!(out.contains("name=Ada"));
        assert!(!out.contains("command="));
    }

    #[test]
    fn test_handler_errors_map_to_failure() {
        let app = app();
        app.add(Command::from_fn("boom", |_| anyhow::bail!("exploded")))
            .unwrap();
        let (code, _, err) = run(&app, &["boom"]);
        assert_eq!(code, exit_code::FAILURE);
        assert!(err.contains("exploded"));
    }

    #[test]
    fn test_uncaught_errors_are_returned() {
        let mut config = Config::new("tool", "");
        config.catch_exceptions = false;
        let app = Application::new(config).unwrap();

        let mut io = Io::buffered();
        let err = app.run(Input::from_tokens(["nope"]), &mut io).unwrap_err();
        assert_eq!(exit_code_for(&err), exit_code::USAGE);
    }

    #[test]
    fn test_handler_exit_code_is_propagated() {
        let app = app();
        app.add(Command::from_fn("three", |_| Ok(3))).unwrap();
        assert_eq!(run(&app, &["three"]).0, 3);
    }

    #[test]
    fn test_out_of_range_exit_code_is_not_success() {
        let app = app();
        app.add(Command::from_fn("fail", |_| Ok(-1))).unwrap();
        app.add(Command::from_fn("huge", |_| Ok(256))).unwrap();
        assert_eq!(run(&app, &["fail"]).0, 255);
        assert_eq!(run(&app, &["huge"]).0, 255);
    }

    #[test]
    fn test_quiet_suppresses_output() {
        let app = app();
        app.add(echo("greet")).unwrap();
        let (code, out, _) = run(&app, &["greet", "-q"]);
        assert_eq!(code, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_call_runs_other_commands() {
        let app = app();
        app.add(echo("db migrate").argument(Argument::new("steps")).unwrap())
            .unwrap();
        app.add(Command::from_fn("setup", |ctx| {
            ctx.call("db migrate", "3")?;
            ctx.call_silent("db migrate", "9")
        }))
        .unwrap();

        let (code, out, _) = run(&app, &["setup"]);
        assert_eq!(code, 0);
        assert!(out.contains("steps=3"));
        assert!(!out.contains("steps=9"));
        assert_eq!(app.state(), DispatchState::Completed);
    }

    #[test]
    fn test_interact_and_initialize_hooks() {
        struct Prompting;

        impl CommandHandler for Prompting {
            fn initialize(&self, ctx: &mut Context<'_>) -> anyhow::Result<()> {
                ctx.write_line("initialize")?;
                Ok(())
            }

            fn interact(&self, ctx: &mut Context<'_>) -> anyhow::Result<()> {
                ctx.input_mut().set_argument("name", "from prompt")?;
                Ok(())
            }

            fn handle(&self, ctx: &mut Context<'_>) -> anyhow::Result<i32> {
                let name = ctx.argument("name")?;
                ctx.write_line(&format!("hello {name}"))?;
                Ok(0)
            }
        }

        let app = app();
        app.add(
            Command::new("ask", Prompting)
                .argument(Argument::new("name").required())
                .unwrap(),
        )
        .unwrap();

        let mut io = Io::new(Output::Buffer(String::new()), Output::Buffer(String::new()));
        let code = app.run(Input::from_tokens(["ask"]), &mut io).unwrap();
        assert_eq!(code, 0);
        assert_eq!(
            io.output().contents(),
            Some("initialize\nhello from prompt\n")
        );

        let (code, _, err) = run(&app, &["ask", "-n"]);
        assert_eq!(code, exit_code::USAGE);
        assert!(err.contains("missing: \"name\""));
    }

    #[test]
    fn test_set_definition_invalidates_merged() {
        let mut app = app();
        let command = app.add(noop("greet")).unwrap().unwrap();
        let before = command.merged_definition(&app.global_definition().unwrap()).unwrap();
        assert!(before.has_option("ansi"));

        app.set_definition(
            Definition::with([Argument::new("command").required()], []).unwrap(),
        );
        let after = command.merged_definition(&app.global_definition().unwrap()).unwrap();
        assert!(!after.has_option("ansi"));
    }
}
