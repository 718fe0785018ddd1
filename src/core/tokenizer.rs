//! Command-line string tokenizer
//!
//! Splits a single shell-like string into argv tokens without invoking a
//! shell. Used when a command invokes another one with a string of arguments.

use crate::error::{ConsoleError, Result};
use regex::Regex;
use tracing::{debug, instrument};

/// Splits `--name="a b" 'c d' e\ f` into `["--name=a b", "c d", "e f"]`
pub struct CommandLineTokenizer {
    /// One token: runs of bare characters, quoted strings and escapes
    re_token: Regex,
}

impl CommandLineTokenizer {
    /// Create a new tokenizer
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_token: Regex::new(
                r#"(?:[^\s"'\\]+|"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|\\.)+"#,
            )
            .map_err(|e| ConsoleError::logic(format!("Failed to compile regex: {e}")))?,
        })
    }

    /// Split `line` into tokens
    #[instrument(skip(self))]
    pub fn tokenize(&self, line: &str) -> Result<Vec<String>> {
        let mut tokens = Vec::new();
        let mut cursor = 0;

        for found in self.re_token.find_iter(line) {
            Self::expect_blank(line, cursor, found.start())?;
            tokens.push(Self::unquote(found.as_str()));
            cursor = found.end();
        }
        Self::expect_blank(line, cursor, line.len())?;

        debug!("Tokenized {} token(s): {:?}", tokens.len(), tokens);
        Ok(tokens)
    }

    /// Text between two tokens may only be whitespace
    fn expect_blank(line: &str, from: usize, to: usize) -> Result<()> {
        let gap = &line[from..to];
        if gap.chars().all(char::is_whitespace) {
            return Ok(());
        }
        let near: String = line[from..].trim_start().chars().take(10).collect();
        Err(ConsoleError::invalid_input(format!(
            "Unable to parse input near \"... {near} ...\""
        )))
    }

    /// Strip quotes and resolve backslash escapes
    fn unquote(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut quote: Option<char> = None;
        let mut chars = raw.chars();

        while let Some(c) = chars.next() {
            match (c, quote) {
                ('\\', _) => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                ('"' | '\'', None) => quote = Some(c),
                (c, Some(open)) if c == open => quote = None,
                (c, _) => out.push(c),
            }
        }
        out
    }
}
