//! Error types for the console engine
//!
//! Errors fall into three kinds: logic errors (a misconfigured definition or
//! registry, always a programming bug), user errors (caused by the tokens the
//! end user typed) and value errors (a caller querying something that does
//! not exist).

use thiserror::Error;

/// Process exit codes used by the top-level runner
pub mod exit_code {
    /// The command completed successfully
    pub const SUCCESS: i32 = 0;
    /// The command failed while executing
    pub const FAILURE: i32 = 1;
    /// The end user invoked the program incorrectly
    pub const USAGE: i32 = 2;
    /// The output pipe was closed before the command finished writing
    pub const BROKEN_PIPE: i32 = 32;
    /// The program itself is inconsistent (bad definition, duplicate registration)
    pub const INTERNAL: i32 = 70;
    /// The command was interrupted
    pub const INTERRUPTED: i32 = 130;
}

/// Broad classification of a [`ConsoleError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration-time programming error
    Logic,
    /// Runtime error caused by end-user input
    User,
    /// Malformed query against an internal API
    Value,
}

/// Main error type for the console engine
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// Definition or registry misconfiguration
    #[error("{message}")]
    Logic { message: String },

    /// Unknown argument or option requested through the API
    #[error("{message}")]
    Value { message: String },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An option in the token stream is not part of the definition
    #[error("The \"{name}\" option does not exist.")]
    NoSuchOption { name: String },

    /// Malformed input such as a missing option value or a surplus argument
    #[error("{message}")]
    InvalidInput { message: String },

    /// Required arguments were not supplied
    #[error("Not enough arguments (missing: \"{}\").", .missing.join(", "))]
    MissingArguments { missing: Vec<String> },

    /// No command is registered under the requested name
    #[error("{}", command_not_found_message(.name, .suggestions))]
    CommandNotFound {
        name: String,
        suggestions: Vec<String>,
    },

    /// No command lives in the requested namespace
    #[error("{}", namespace_not_found_message(.namespace, .suggestions))]
    NamespaceNotFound {
        namespace: String,
        suggestions: Vec<String>,
    },
}

fn command_not_found_message(name: &str, suggestions: &[String]) -> String {
    with_suggestions(format!("The command \"{name}\" does not exist."), suggestions)
}

fn namespace_not_found_message(namespace: &str, suggestions: &[String]) -> String {
    with_suggestions(
        format!("There are no commands in the \"{namespace}\" namespace."),
        suggestions,
    )
}

fn with_suggestions(mut message: String, suggestions: &[String]) -> String {
    match suggestions.len() {
        0 => {}
        1 => message.push_str("\n\nDid you mean this?\n    "),
        _ => message.push_str("\n\nDid you mean one of these?\n    "),
    }
    message.push_str(&suggestions.join("\n    "));
    message
}

impl ConsoleError {
    /// Create a new logic error
    pub fn logic(message: impl Into<String>) -> Self {
        Self::Logic {
            message: message.into(),
        }
    }

    /// Create a new value error
    pub fn value(message: impl Into<String>) -> Self {
        Self::Value {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new configuration error wrapping its cause
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new unknown-option error; `name` includes its dashes
    pub fn no_such_option(name: impl Into<String>) -> Self {
        Self::NoSuchOption { name: name.into() }
    }

    /// Create a new invalid-input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new missing-arguments error
    pub fn missing_arguments(missing: Vec<String>) -> Self {
        Self::MissingArguments { missing }
    }

    /// Create a new command-not-found error
    pub fn command_not_found(name: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self::CommandNotFound {
            name: name.into(),
            suggestions,
        }
    }

    /// Create a new namespace-not-found error
    pub fn namespace_not_found(namespace: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self::NamespaceNotFound {
            namespace: namespace.into(),
            suggestions,
        }
    }

    /// Broad classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Logic { .. } | Self::Config { .. } => ErrorKind::Logic,
            Self::Value { .. } => ErrorKind::Value,
            Self::NoSuchOption { .. }
            | Self::InvalidInput { .. }
            | Self::MissingArguments { .. }
            | Self::CommandNotFound { .. }
            | Self::NamespaceNotFound { .. } => ErrorKind::User,
        }
    }

    /// Whether the error was caused by end-user input
    pub fn is_user_error(&self) -> bool {
        self.kind() == ErrorKind::User
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Logic { .. } => "logic_error",
            Self::Value { .. } => "value_error",
            Self::Config { .. } => "config_error",
            Self::NoSuchOption { .. } => "no_such_option",
            Self::InvalidInput { .. } => "invalid_input",
            Self::MissingArguments { .. } => "missing_arguments",
            Self::CommandNotFound { .. } => "command_not_found",
            Self::NamespaceNotFound { .. } => "namespace_not_found",
        }
    }

    /// Names suggested to the user in place of the one that was not found
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::CommandNotFound { suggestions, .. }
            | Self::NamespaceNotFound { suggestions, .. } => suggestions,
            _ => &[],
        }
    }

    /// Exit code the top-level runner reports for this error
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::User => exit_code::USAGE,
            ErrorKind::Logic | ErrorKind::Value => exit_code::INTERNAL,
        }
    }
}

/// Pick the exit code for an error that escaped command execution.
///
/// The first [`ConsoleError`] or I/O error found in the chain decides;
/// anything else is a generic failure.
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    for cause in error.chain() {
        if let Some(console) = cause.downcast_ref::<ConsoleError>() {
            return console.exit_code();
        }
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::BrokenPipe => return exit_code::BROKEN_PIPE,
                std::io::ErrorKind::Interrupted => return exit_code::INTERRUPTED,
                _ => {}
            }
        }
    }
    exit_code::FAILURE
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ConsoleError>;
