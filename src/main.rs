#![allow(clippy::cargo_common_metadata)]
use anyhow::Result;
use command_console::{
    cli,
    config::Config,
    core::Input,
    error::exit_code_for,
    setup_logging,
    utils::{EnvUtils, Io, Verbosity},
};
use std::io::IsTerminal;
use std::process::ExitCode;

/// Optional path to a TOML configuration file
const CONFIG_PATH_VAR: &str = "CONSOLE_CONFIG";

fn main() -> ExitCode {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            exit_code_for(&err)
        }
    };
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn run() -> Result<i32> {
    // Defaults, then the config file, then the environment
    let config_path = EnvUtils::get_var_or_default(CONFIG_PATH_VAR, "");
    let mut config = if config_path.is_empty() {
        Config::new("console", "")
    } else {
        Config::load(&config_path)?
    }
    .with_env();
    if config.version.is_empty() {
        config.version = env!("CARGO_PKG_VERSION").to_string();
    }

    let input = Input::from_argv(std::env::args());

    // Setup logging based on the verbosity flags
    setup_logging(Verbosity::detect(&input, config.shell_verbosity))?;

    let mut io = Io::stdio();
    io.set_interactive(std::io::stdin().is_terminal() && !EnvUtils::is_ci());

    let application = cli::build_application(config)?;
    application.run(input, &mut io)
}
