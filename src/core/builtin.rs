//! Commands every application carries: `help` and `list`
//!
//! Output is plain aligned text.

use crate::core::application::Application;
use crate::core::argument::Argument;
use crate::core::command::{Command, Context};
use crate::core::option::InputOption;
use crate::core::value::Value;
use crate::error::Result;
use std::rc::Rc;

/// The commands registered by [`Application::ensure_initialized`]
pub fn default_commands() -> Result<Vec<Command>> {
    Ok(vec![help_command()?, list_command()?])
}

fn help_command() -> Result<Command> {
    Command::from_fn("help", run_help)
        .description("Displays help for a command.")
        .ignore_validation_errors()
        .argument(
            Argument::new("command_name")
                .list()
                .default_value(vec!["help"])
                .description("The command name"),
        )
}

fn list_command() -> Result<Command> {
    Command::from_fn("list", run_list)
        .description("Lists commands.")
        .argument(Argument::new("namespace").description("The namespace name"))
}

fn run_help(ctx: &mut Context<'_>) -> anyhow::Result<i32> {
    let application = ctx.application();
    let command = match ctx.target() {
        Some(target) => target,
        None => {
            let name = ctx.argument("command_name")?.as_list().join(" ");
            application.find(&name)?
        }
    };

    let text = describe_command(application, &command)?;
    ctx.write_line(&text)?;
    Ok(0)
}

fn run_list(ctx: &mut Context<'_>) -> anyhow::Result<i32> {
    let application = ctx.application();
    let namespace = ctx.argument("namespace")?.as_str().map(str::to_string);
    if let Some(namespace) = &namespace {
        application.find_namespace(namespace)?;
    }

    let text = describe_application(application, namespace.as_deref())?;
    ctx.write_line(&text)?;
    Ok(0)
}

/// Description, usage, arguments and options of one command
pub fn describe_command(application: &Application, command: &Rc<Command>) -> Result<String> {
    let merged = command.merged_definition(&application.global_definition()?)?;
    let mut lines: Vec<String> = Vec::new();

    if !command.get_description().is_empty() {
        lines.push("Description:".to_string());
        lines.push(format!("  {}", command.get_description()));
        lines.push(String::new());
    }

    lines.push("Usage:".to_string());
    lines.push(format!("  {}", command.synopsis(false)));
    for alias in command.aliases() {
        lines.push(format!("  {alias}"));
    }

    let arguments: Vec<(String, String)> = command
        .definition()
        .arguments()
        .map(|argument| {
            let description =
                with_default(argument.get_description(), &argument.default(), argument.is_list());
            (argument.name().to_string(), description)
        })
        .collect();
    if !arguments.is_empty() {
        lines.push(String::new());
        lines.push("Arguments:".to_string());
        lines.extend(columns(&arguments));
    }

    let options: Vec<(String, String)> = merged.options().map(option_row).collect();
    if !options.is_empty() {
        lines.push(String::new());
        lines.push("Options:".to_string());
        lines.extend(columns(&options));
    }

    Ok(lines.join("\n"))
}

/// Version, global options and the visible commands grouped by namespace
pub fn describe_application(application: &Application, namespace: Option<&str>) -> Result<String> {
    let mut lines = vec![
        application.long_version(),
        String::new(),
        "Usage:".to_string(),
        "  command [options] [arguments]".to_string(),
    ];

    let options: Vec<(String, String)> = application.definition().options().map(option_row).collect();
    if !options.is_empty() {
        lines.push(String::new());
        lines.push("Options:".to_string());
        lines.extend(columns(&options));
    }

    let mut commands: Vec<(String, String)> = application
        .all(namespace)?
        .into_iter()
        .filter(|(key, command)| key == command.name() && !command.is_hidden())
        .map(|(key, command)| (key, command.get_description().to_string()))
        .collect();
    commands.sort_by(|(a, _), (b, _)| {
        let group_a = Application::extract_namespace(a, Some(1));
        let group_b = Application::extract_namespace(b, Some(1));
        group_a.cmp(&group_b).then_with(|| a.cmp(b))
    });

    lines.push(String::new());
    lines.push(match namespace {
        Some(namespace) => format!("Available commands for the \"{namespace}\" namespace:"),
        None => "Available commands:".to_string(),
    });

    let width = commands.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut current_group: Option<String> = None;
    for (name, description) in &commands {
        let group = Application::extract_namespace(name, Some(1));
        if !group.is_empty() && current_group.as_deref() != Some(group.as_str()) {
            lines.push(format!(" {group}"));
        }
        current_group = Some(group);
        lines.push(format!("  {name:<width$}  {description}").trim_end().to_string());
    }

    Ok(lines.join("\n"))
}

fn option_row(option: &InputOption) -> (String, String) {
    let shortcut = if option.shortcuts().is_empty() {
        "    ".to_string()
    } else {
        format!("-{}, ", option.shortcuts().join("|"))
    };
    let placeholder = option.name().to_uppercase().replace('-', "_");
    let value = if option.requires_value() {
        format!("={placeholder}")
    } else if option.accepts_value() {
        format!("[={placeholder}]")
    } else {
        String::new()
    };

    let label = format!("{shortcut}--{}{value}", option.name());
    let description = with_default(option.get_description(), &option.default(), option.is_list());
    (label, description)
}

fn with_default(description: &str, default: &Value, is_list: bool) -> String {
    let mut text = description.to_string();
    match default {
        Value::String(value) => text.push_str(&format!(" [default: \"{value}\"]")),
        Value::List(items) if !items.is_empty() => {
            text.push_str(&format!(" [default: [\"{}\"]]", items.join("\", \"")))
        }
        _ => {}
    }
    if is_list {
        text.push_str(" (multiple values allowed)");
    }
    text.trim_start().to_string()
}

fn columns(rows: &[(String, String)]) -> Vec<String> {
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(label, description)| {
            format!("  {label:<width$}  {description}").trim_end().to_string()
        })
        .collect()
}
