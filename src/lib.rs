//! # Command Console
//!
//! A command-line definition, tokenizer and command dispatch engine.
//! Commands declare their arguments and options, live in a namespaced
//! registry (`db init`, `db migrate`), and are resolved and bound from a raw
//! argument vector in one pass.
//!
//! ## Features
//!
//! - Long, short, bundled and list options with `=` or spaced values
//! - Multi-word command names with "Did you mean" suggestions
//! - Lazily loaded commands through a [`core::CommandLoader`]
//! - Built-in `help` and `list` commands
//! - Exit codes that separate usage errors from internal ones
//!
//! ## Example
//!
//! ```
//! use command_console::{
//!     config::Config,
//!     core::{Application, Argument, Command, Input},
//!     utils::Io,
//! };
//!
//! let app = Application::new(Config::new("tool", "1.0.0"))?;
//! app.add(
//!     Command::from_fn("greet", |ctx| {
//!         let name = ctx.argument("name")?;
//!         ctx.write_line(&format!("Hello, {name}!"))?;
//!         Ok(0)
//!     })
//!     .argument(Argument::new("name").required())?,
//! )?;
//!
//! let mut io = Io::buffered();
//! let code = app.run(Input::from_tokens(["greet", "Ada"]), &mut io)?;
//! assert_eq!(code, 0);
//! assert_eq!(io.output().contents(), Some("Hello, Ada!\n"));
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod utils;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use utils::Verbosity;

/// Initialize logging for the given console verbosity.
///
/// `RUST_LOG` takes precedence when set.
pub fn setup_logging(verbosity: Verbosity) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(verbosity)));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

fn log_level(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "info",
        Verbosity::VeryVerbose => "debug",
        Verbosity::Debug => "trace",
    }
}
