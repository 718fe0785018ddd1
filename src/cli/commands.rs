//! Command implementations for the CLI

use crate::{
    config::Config,
    core::{Application, Argument, Command, Context, FactoryCommandLoader, InputOption},
    error::Result,
    utils::Verbosity,
};
use anyhow::Context as _;
use tracing::{info, instrument};

/// Build the demo application with every command registered
pub fn build_application(config: Config) -> Result<Application> {
    let mut application = Application::new(config)?;
    application.set_command_loader(
        FactoryCommandLoader::new().with_factory("db seed", db_seed_command),
    );

    application.add(greet_command()?)?;
    application.add(db_init_command()?)?;
    application.add(db_migrate_command()?)?;
    application.add(tags_command()?)?;
    Ok(application)
}

fn greet_command() -> Result<Command> {
    Command::from_fn("greet", execute_greet)
        .description("Greet someone")
        .argument(Argument::new("name").required().description("Who to greet"))?
        .option(
            InputOption::flag("yell")
                .shortcut("y")
                .description("Shout the greeting"),
        )?
        .option(
            InputOption::value("greeting")
                .default_value("Hello")
                .description("Word to greet with"),
        )
}

fn db_init_command() -> Result<Command> {
    Command::from_fn("db init", execute_db_init)
        .description("Create the database schema")
        .option(InputOption::flag("dry-run").description("Only print what would be done"))?
        .option(
            InputOption::value("env")
                .shortcut("e")
                .choices(["dev", "prod"])
                .default_value("dev")
                .description("Target environment"),
        )
}

fn db_migrate_command() -> Result<Command> {
    Command::from_fn("db migrate", execute_db_migrate)
        .description("Apply pending migrations")
        .alias("migrate")
        .argument(
            Argument::new("steps")
                .default_value("all")
                .description("Number of migrations to apply"),
        )
}

fn db_seed_command() -> Result<Command> {
    Command::from_fn("db seed", execute_db_seed)
        .description("Fill the database with sample rows")
        .option(
            InputOption::value("count")
                .shortcut("c")
                .default_value("10")
                .description("Rows to insert"),
        )
}

fn tags_command() -> Result<Command> {
    Command::from_fn("tags", execute_tags)
        .description("Print tags, minus the excluded ones")
        .argument(Argument::new("tag").required().list().description("Tags to print"))?
        .option(
            InputOption::value("exclude")
                .shortcut("x")
                .list()
                .description("Tag to leave out"),
        )
}

/// Execute the greet command
#[instrument(skip(ctx))]
fn execute_greet(ctx: &mut Context<'_>) -> anyhow::Result<i32> {
    let name = ctx.argument("name")?;
    let greeting = ctx.option("greeting")?;

    let mut line = format!("{greeting}, {name}!");
    if ctx.option("yell")?.as_bool() {
        line = line.to_uppercase();
    }

    ctx.io()
        .write_line_at(&format!("Greeting {name}"), Verbosity::Verbose)?;
    ctx.write_line(&line)?;
    Ok(0)
}

/// Execute the db init command
#[instrument(skip(ctx))]
fn execute_db_init(ctx: &mut Context<'_>) -> anyhow::Result<i32> {
    let env = ctx.option("env")?;
    info!("Initializing {} database", env);

    if ctx.option("dry-run")?.as_bool() {
        ctx.write_line(&format!("Would initialize the {env} database"))?;
    } else {
        ctx.write_line(&format!("Initialized the {env} database"))?;
    }
    Ok(0)
}

/// Execute the db migrate command
#[instrument(skip(ctx))]
fn execute_db_migrate(ctx: &mut Context<'_>) -> anyhow::Result<i32> {
    let steps = ctx.argument("steps")?.to_string();
    if steps != "all" {
        steps
            .parse::<u32>()
            .with_context(|| format!("Invalid step count: {steps}"))?;
    }

    info!("Applying {} migration(s)", steps);
    ctx.write_line(&format!("Applied {steps} migration(s)"))?;
    Ok(0)
}

/// Execute the db seed command
#[instrument(skip(ctx))]
fn execute_db_seed(ctx: &mut Context<'_>) -> anyhow::Result<i32> {
    let count = ctx.option("count")?.to_string();
    let rows: u32 = count
        .parse()
        .with_context(|| format!("Invalid row count: {count}"))?;

    let status = ctx
        .call_silent("db migrate", "")
        .context("Failed to migrate before seeding")?;
    if status != 0 {
        return Ok(status);
    }

    ctx.write_line(&format!("Seeded {rows} row(s)"))?;
    Ok(0)
}

/// Execute the tags command
#[instrument(skip(ctx))]
fn execute_tags(ctx: &mut Context<'_>) -> anyhow::Result<i32> {
    let tags = ctx.argument("tag")?;
    let excluded = ctx.option("exclude")?;

    for tag in tags.as_list() {
        if !excluded.as_list().contains(tag) {
            ctx.write_line(tag)?;
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Input;
    use crate::error::exit_code;
    use crate::utils::Io;

    fn run(tokens: &[&str]) -> (i32, String, String) {
        let application = build_application(Config::new("console", "0.1.0")).unwrap();
        let mut io = Io::buffered();
        let code = application
            .run(Input::from_tokens(tokens.iter().copied()), &mut io)
            .unwrap();
        let out = io.output().contents().unwrap_or_default().to_string();
        let err = io.error_output().contents().unwrap_or_default().to_string();
        (code, out, err)
    }

    #[test]
    fn test_greet() {
        assert_eq!(run(&["greet", "Ada"]).1, "Hello, Ada!\n");
        assert_eq!(run(&["greet", "-y", "Ada"]).1, "HELLO, ADA!\n");
        assert_eq!(run(&["greet", "Ada", "--greeting=Hi"]).1, "Hi, Ada!\n");
        assert_eq!(
            run(&["greet", "Ada", "-v"]).1,
            "Greeting Ada\nHello, Ada!\n"
        );
    }

    #[test]
    fn test_db_init_env_choices() {
        let (code, out, _) = run(&["db", "init", "--env", "prod", "--dry-run"]);
        assert_eq!(code, 0);
        assert_eq!(out, "Would initialize the prod database\n");

        let (code, _, err) = run(&["db", "init", "-e", "qa"]);
        assert_eq!(code, exit_code::USAGE);
        assert!(err.contains("Possible values: dev, prod"));
    }

    #[test]
    fn test_migrate_alias_and_bad_steps() {
        assert_eq!(run(&["migrate", "2"]).1, "Applied 2 migration(s)\n");

        let (code, _, err) = run(&["db", "migrate", "many"]);
        assert_eq!(code, exit_code::FAILURE);
        assert!(err.contains("Invalid step count: many"));
    }

    #[test]
    fn test_lazy_seed_calls_migrate_silently() {
        let (code, out, _) = run(&["db", "seed", "-c", "5"]);
        assert_eq!(code, 0);
        assert_eq!(out, "Seeded 5 row(s)\n");
    }

    #[test]
    fn test_tags_list_argument_and_option() {
        let (code, out, _) = run(&["tags", "a", "b", "c", "-x", "b", "--exclude=c"]);
        assert_eq!(code, 0);
        assert_eq!(out, "a\n");
    }
}
