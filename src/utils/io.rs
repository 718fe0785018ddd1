//! Output sinks and verbosity
//!
//! Commands write through an [`Io`] rather than to stdout directly so a
//! caller can capture output in memory or silence a sub-invocation.

use crate::core::input::Input;
use std::io::{self, Write};

/// How much a command is allowed to say
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
    VeryVerbose,
    Debug,
}

impl Verbosity {
    /// Map a `SHELL_VERBOSITY` level (-1 to 3) onto a verbosity
    pub fn from_shell_level(level: i32) -> Self {
        match level {
            i32::MIN..=-1 => Self::Quiet,
            0 => Self::Normal,
            1 => Self::Verbose,
            2 => Self::VeryVerbose,
            _ => Self::Debug,
        }
    }

    /// Read the verbosity flags from the raw tokens.
    ///
    /// Flags win over `shell_verbosity`; only tokens before `--` count.
    pub fn detect(input: &Input, shell_verbosity: i32) -> Self {
        if input.has_parameter_option(&["--quiet", "-q"], true) {
            Self::Quiet
        } else if input.has_parameter_option(&["-vvv"], true) {
            Self::Debug
        } else if input.has_parameter_option(&["-vv"], true) {
            Self::VeryVerbose
        } else if input.has_parameter_option(&["-v", "--verbose"], true) {
            Self::Verbose
        } else {
            Self::from_shell_level(shell_verbosity)
        }
    }
}

/// Where written text ends up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    Stderr,
    /// Captured in memory
    Buffer(String),
    /// Discarded
    Null,
}

impl Output {
    fn write_str(&mut self, text: &str) -> io::Result<()> {
        match self {
            Self::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(text.as_bytes())?;
                stdout.flush()
            }
            Self::Stderr => io::stderr().lock().write_all(text.as_bytes()),
            Self::Buffer(buffer) => {
                buffer.push_str(text);
                Ok(())
            }
            Self::Null => Ok(()),
        }
    }

    /// Captured text of a buffer sink
    pub fn contents(&self) -> Option<&str> {
        match self {
            Self::Buffer(buffer) => Some(buffer),
            _ => None,
        }
    }
}

/// Output and error sinks plus the terminal settings commands consult
#[derive(Debug, Clone)]
pub struct Io {
    output: Output,
    error_output: Output,
    verbosity: Verbosity,
    interactive: bool,
    decorated: bool,
}

impl Io {
    /// Create a new IO over the given sinks
    pub fn new(output: Output, error_output: Output) -> Self {
        Self {
            output,
            error_output,
            verbosity: Verbosity::Normal,
            interactive: true,
            decorated: false,
        }
    }

    /// Process stdout and stderr
    pub fn stdio() -> Self {
        Self::new(Output::Stdout, Output::Stderr)
    }

    /// Both sinks captured in memory, non-interactive
    pub fn buffered() -> Self {
        let mut io = Self::new(Output::Buffer(String::new()), Output::Buffer(String::new()));
        io.interactive = false;
        io
    }

    /// A discarding IO carrying the same settings as `self`
    pub fn silent(&self) -> Self {
        Self {
            output: Output::Null,
            error_output: Output::Null,
            ..self.clone()
        }
    }

    /// Write a line shown at normal verbosity and above
    pub fn write_line(&mut self, message: &str) -> io::Result<()> {
        self.write_line_at(message, Verbosity::Normal)
    }

    /// Write a line only when the current verbosity reaches `level`
    pub fn write_line_at(&mut self, message: &str, level: Verbosity) -> io::Result<()> {
        if self.verbosity < level {
            return Ok(());
        }
        self.output.write_str(message)?;
        self.output.write_str("\n")
    }

    /// Write a line to the error sink regardless of verbosity
    pub fn write_error_line(&mut self, message: &str) -> io::Result<()> {
        self.error_output.write_str(message)?;
        self.error_output.write_str("\n")
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn error_output(&self) -> &Output {
        &self.error_output
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.verbosity = verbosity;
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity >= Verbosity::Verbose
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    /// Whether ANSI decoration was requested
    pub fn is_decorated(&self) -> bool {
        self.decorated
    }

    pub fn set_decorated(&mut self, decorated: bool) {
        self.decorated = decorated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(tokens: &[&str], shell: i32) -> Verbosity {
        Verbosity::detect(&Input::from_tokens(tokens.iter().copied()), shell)
    }

    #[test]
    fn test_detect_from_flags() {
        assert_eq!(detect(&["list"], 0), Verbosity::Normal);
        assert_eq!(detect(&["list", "-q"], 0), Verbosity::Quiet);
        assert_eq!(detect(&["list", "-v"], 0), Verbosity::Verbose);
        assert_eq!(detect(&["list", "--verbose"], 0), Verbosity::Verbose);
        assert_eq!(detect(&["-vv", "list"], 0), Verbosity::VeryVerbose);
        assert_eq!(detect(&["list", "-vvv"], 0), Verbosity::Debug);
    }

    #[test]
    fn test_detect_stops_at_double_dash() {
        assert_eq!(detect(&["greet", "--", "-vvv"], 0), Verbosity::Normal);
    }

    #[test]
    fn test_flags_override_shell_level() {
        assert_eq!(detect(&["list"], 2), Verbosity::VeryVerbose);
        assert_eq!(detect(&["list", "-q"], 3), Verbosity::Quiet);
        assert_eq!(detect(&["list"], -1), Verbosity::Quiet);
    }

    #[test]
    fn test_write_line_respects_verbosity() {
        let mut io = Io::buffered();
        io.write_line("shown").unwrap();
        io.write_line_at("hidden", Verbosity::Verbose).unwrap();
        io.set_verbosity(Verbosity::Quiet);
        io.write_line("suppressed").unwrap();
        io.write_error_line("error").unwrap();

        assert_eq!(io.output().contents(), Some("shown\n"));
        assert_eq!(io.error_output().contents(), Some("error\n"));
    }

    #[test]
    fn test_silent_keeps_settings() {
        let mut io = Io::buffered();
        io.set_verbosity(Verbosity::Debug);
        let silent = io.silent();
        assert_eq!(silent.verbosity(), Verbosity::Debug);
        assert_eq!(silent.output(), &Output::Null);
    }

    #[test]
    fn test_quiet_and_verbose_checks() {
        let mut io = Io::buffered();
        assert!(!io.is_quiet());
        assert!(!io.is_verbose());
        io.set_verbosity(Verbosity::VeryVerbose);
        assert!(io.is_verbose());
        io.set_verbosity(Verbosity::Quiet);
        assert!(io.is_quiet());
    }
}
