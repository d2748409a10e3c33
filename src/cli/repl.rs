//! Interactive REPL for browsing dates and cards.
//!
//! Plain words drive the explorer (`date 07-20`, `open 4`, `ext 1`, `back`);
//! slash commands control the REPL itself (`/help`, `/config`, `/quit`).

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;

use crate::error::AlmanacError;
use crate::explorer::{ExploreDate, NavigationController, ViewState};

use super::bootstrap::CliContext;
use super::output::{format_card_list, format_cover, format_focused, INSTRUCTIONS};
use super::runner::{close_output, spawn_output, write_export};

/// REPL command variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Exit the REPL
    Quit,
    /// Print the command reference
    Help,
    /// Explore today's date
    Today,
    /// Explore a random date
    Random,
    /// Explore a date given as MM-DD
    Date(String),
    /// Open event N (1-based) of the main list
    Open(usize),
    /// Follow anchor N (1-based) of the focused card
    Ext(usize),
    /// Focus card N (1-based)
    Focus(usize),
    Next,
    Prev,
    /// Focus the main list
    Main,
    /// Print the focused card
    Show,
    /// List open cards
    Cards,
    /// Export generated content to a file, or stdout
    Export(Option<PathBuf>),
    /// Regenerate the focused card after a failure
    Retry,
    /// Return to the cover
    Back,
    /// Stop showing the usage guide on the cover
    Dismiss,
    /// Inspect or edit the settings file
    Config(ConfigCommand),
    /// Known command with a bad argument; holds the usage line
    Usage(&'static str),
    /// Unknown command (will show help)
    Unknown(String),
    /// Empty input (skip)
    Empty,
}

/// `/config` sub-commands.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigCommand {
    /// Print the settings file path
    Path,
    /// Print one setting by dot-path, e.g. `ai.model`
    Get(String),
    /// Set one setting and save the file
    Set { key: String, value: String },
    /// Re-read the settings file
    Reload,
}

const CONFIG_USAGE: &str = "/config [path | get KEY | set KEY VALUE | reload]";

impl ReplCommand {
    /// Parse user input into a REPL command.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return ReplCommand::Empty;
        }

        if let Some(rest) = trimmed.strip_prefix('/') {
            let (name, args) = split_word(rest);
            return match (name.to_lowercase().as_str(), args) {
                ("quit" | "exit" | "q", "") => ReplCommand::Quit,
                ("help" | "h" | "?", "") => ReplCommand::Help,
                ("config", args) => parse_config(args),
                _ => ReplCommand::Unknown(trimmed.to_string()),
            };
        }

        let mut words = trimmed.split_whitespace();
        let command = words.next().unwrap_or_default().to_lowercase();
        let arg = words.next();
        if words.next().is_some() {
            return ReplCommand::Unknown(trimmed.to_string());
        }

        match (command.as_str(), arg) {
            ("today", None) => ReplCommand::Today,
            ("random", None) => ReplCommand::Random,
            ("date", Some(value)) => ReplCommand::Date(value.to_string()),
            ("date", None) => ReplCommand::Usage("date MM-DD"),
            ("open", arg) => number(arg).map_or(ReplCommand::Usage("open N"), ReplCommand::Open),
            ("ext", arg) => number(arg).map_or(ReplCommand::Usage("ext N"), ReplCommand::Ext),
            ("focus", arg) => number(arg).map_or(ReplCommand::Usage("focus N"), ReplCommand::Focus),
            ("next", None) => ReplCommand::Next,
            ("prev", None) => ReplCommand::Prev,
            ("main", None) => ReplCommand::Main,
            ("show", None) => ReplCommand::Show,
            ("cards", None) => ReplCommand::Cards,
            ("export", path) => ReplCommand::Export(path.map(PathBuf::from)),
            ("retry", None) => ReplCommand::Retry,
            ("back", None) => ReplCommand::Back,
            ("dismiss", None) => ReplCommand::Dismiss,
            _ => ReplCommand::Unknown(trimmed.to_string()),
        }
    }
}

fn parse_config(args: &str) -> ReplCommand {
    let (action, rest) = split_word(args);
    let (key, value) = split_word(rest);
    let command = match (action.to_lowercase().as_str(), key, value) {
        ("" | "path", "", _) => ConfigCommand::Path,
        ("get", key, "") if !key.is_empty() => ConfigCommand::Get(key.to_string()),
        ("set", key, value) if !key.is_empty() && !value.is_empty() => ConfigCommand::Set {
            key: key.to_string(),
            value: value.to_string(),
        },
        ("reload", "", _) => ConfigCommand::Reload,
        _ => return ReplCommand::Usage(CONFIG_USAGE),
    };
    ReplCommand::Config(command)
}

/// First word of `input` and the trimmed remainder.
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

/// Setting values are read as JSON when they parse (`true`, `4000`),
/// otherwise as a plain string.
fn setting_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

/// Positive 1-based number argument.
fn number(arg: Option<&str>) -> Option<usize> {
    arg.and_then(|a| a.parse::<usize>().ok()).filter(|n| *n > 0)
}

/// Run an interactive REPL session.
///
/// Returns when the user exits or on EOF (Ctrl+D).
pub async fn run_repl(ctx: &mut CliContext) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    let output_handle = spawn_output(ctx);
    let mut show_instructions = ctx.settings.ui.show_instructions;

    if !ctx.args.quiet {
        eprintln!(
            "{}",
            format_cover(ctx.settings.ui.show_instructions, ctx.settings.ui.hide_banner)
        );
    }

    // Piped input gets no prompt
    let interactive = ctx.runtime.is_interactive();

    loop {
        if interactive {
            print!("{}", prompt(&ctx.controller));
            stdout.flush()?;
        }

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF (Ctrl+D)
            eprintln!("\nGoodbye!");
            break;
        }

        match ReplCommand::parse(&input) {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => {
                eprintln!("Goodbye!");
                break;
            }
            ReplCommand::Help => eprintln!("{}", INSTRUCTIONS),
            ReplCommand::Dismiss => {
                show_instructions = false;
                let hide = serde_json::Value::Bool(false);
                match ctx.settings_manager.set_value("ui.show_instructions", hide).await {
                    Ok(()) => eprintln!("Guide hidden; /help still shows it."),
                    Err(e) => {
                        tracing::warn!("could not save ui.show_instructions: {:#}", e);
                        eprintln!("Guide hidden for this run; /help still shows it.");
                    }
                }
            }
            ReplCommand::Config(command) => match configure(ctx, command).await {
                Ok(()) => show_instructions = ctx.settings.ui.show_instructions,
                Err(e) => eprintln!("Error: {:#}", e),
            },
            ReplCommand::Usage(usage) => eprintln!("Usage: {}", usage),
            ReplCommand::Unknown(cmd) => {
                eprintln!("Unknown command: {}", cmd);
                eprintln!("Type /help for the list of commands");
            }
            command => {
                let leaving = command == ReplCommand::Back;
                if let Err(e) = execute(&mut ctx.controller, command).await {
                    eprintln!("Error: {}", e);
                } else if leaving && show_instructions {
                    eprintln!("{}", INSTRUCTIONS);
                }
            }
        }
    }

    close_output(ctx);
    match output_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("Output handler error: {}", e),
        Err(e) => tracing::warn!("Output handler panicked: {}", e),
    }

    Ok(())
}

/// Apply a `/config` command. Model and connection settings take effect on
/// the next start.
async fn configure(ctx: &mut CliContext, command: ConfigCommand) -> Result<()> {
    let manager = ctx.settings_manager.clone();
    match command {
        ConfigCommand::Path => println!("{}", manager.path().display()),
        ConfigCommand::Get(key) => {
            let value = manager.get_value(&key).await?;
            if key.ends_with("api_key") {
                let state = if value.is_null() { "unset" } else { "set" };
                println!("{} = ({})", key, state);
            } else {
                println!("{} = {}", key, value);
            }
        }
        ConfigCommand::Set { key, value } => {
            manager.set_value(&key, setting_value(&value)).await?;
            eprintln!("Saved {} to {}", key, manager.path().display());
        }
        ConfigCommand::Reload => {
            manager.reload().await?;
            eprintln!("Reloaded {}", manager.path().display());
        }
    }
    ctx.settings = manager.get().await;
    Ok(())
}

/// Apply an explorer command to the controller.
async fn execute(controller: &mut NavigationController, command: ReplCommand) -> Result<()> {
    match command {
        ReplCommand::Today => select(controller, ExploreDate::today()).await?,
        ReplCommand::Random => select(controller, ExploreDate::random()).await?,
        ReplCommand::Date(raw) => select(controller, ExploreDate::parse(&raw)?).await?,
        ReplCommand::Open(n) => controller.open_event_number(n).map(drop)?,
        ReplCommand::Ext(n) => controller.open_anchor(n).map(drop)?,
        ReplCommand::Focus(n) => controller.focus(n - 1).map(drop)?,
        ReplCommand::Next => controller.next().map(drop)?,
        ReplCommand::Prev => controller.prev().map(drop)?,
        ReplCommand::Main => controller.focus(0).map(drop)?,
        ReplCommand::Show => {
            let session = controller.session().ok_or(AlmanacError::NoSession)?;
            println!("{}", format_focused(session));
        }
        ReplCommand::Cards => {
            let session = controller.session().ok_or(AlmanacError::NoSession)?;
            println!("{}", format_card_list(session));
        }
        ReplCommand::Export(path) => {
            let blob = controller.export()?;
            write_export(&blob, path.as_deref()).await?;
        }
        ReplCommand::Retry => {
            if !controller.retry_focused()? {
                eprintln!("Nothing to retry on this card.");
            }
        }
        ReplCommand::Back => controller.back()?,
        ReplCommand::Quit
        | ReplCommand::Help
        | ReplCommand::Dismiss
        | ReplCommand::Config(_)
        | ReplCommand::Usage(_)
        | ReplCommand::Unknown(_)
        | ReplCommand::Empty => {}
    }
    Ok(())
}

async fn select(controller: &mut NavigationController, date: ExploreDate) -> Result<()> {
    if let Err(e) = controller.select_date(date).await {
        // List failures were already rendered by the output loop
        tracing::debug!("date selection failed: {}", e);
        if matches!(e, AlmanacError::SessionActive) {
            return Err(e.into());
        }
    }
    Ok(())
}

fn prompt(controller: &NavigationController) -> String {
    match (controller.view(), controller.session()) {
        (ViewState::Exploring, Some(session)) => format!(
            "[{} {}/{}]> ",
            session.selected_date.display_name(),
            session.focused_index() + 1,
            session.cards.len()
        ),
        _ => "> ".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn parses_quit_and_help() {
            assert_eq!(ReplCommand::parse("/quit"), ReplCommand::Quit);
            assert_eq!(ReplCommand::parse("/EXIT"), ReplCommand::Quit);
            assert_eq!(ReplCommand::parse("/q\n"), ReplCommand::Quit);
            assert_eq!(ReplCommand::parse("/help"), ReplCommand::Help);
            assert_eq!(
                ReplCommand::parse("/tools"),
                ReplCommand::Unknown("/tools".to_string())
            );
        }

        #[test]
        fn parses_cover_commands() {
            assert_eq!(ReplCommand::parse("today"), ReplCommand::Today);
            assert_eq!(ReplCommand::parse("  RANDOM "), ReplCommand::Random);
            assert_eq!(
                ReplCommand::parse("date 07-20"),
                ReplCommand::Date("07-20".to_string())
            );
            assert_eq!(ReplCommand::parse("date"), ReplCommand::Usage("date MM-DD"));
        }

        #[test]
        fn parses_numbered_commands() {
            assert_eq!(ReplCommand::parse("open 4"), ReplCommand::Open(4));
            assert_eq!(ReplCommand::parse("ext 1"), ReplCommand::Ext(1));
            assert_eq!(ReplCommand::parse("focus 2"), ReplCommand::Focus(2));
            assert_eq!(ReplCommand::parse("open"), ReplCommand::Usage("open N"));
            assert_eq!(ReplCommand::parse("open 0"), ReplCommand::Usage("open N"));
            assert_eq!(ReplCommand::parse("ext x"), ReplCommand::Usage("ext N"));
            assert_eq!(ReplCommand::parse("focus -1"), ReplCommand::Usage("focus N"));
        }

        #[test]
        fn parses_navigation_commands() {
            assert_eq!(ReplCommand::parse("next"), ReplCommand::Next);
            assert_eq!(ReplCommand::parse("prev"), ReplCommand::Prev);
            assert_eq!(ReplCommand::parse("main"), ReplCommand::Main);
            assert_eq!(ReplCommand::parse("show"), ReplCommand::Show);
            assert_eq!(ReplCommand::parse("cards"), ReplCommand::Cards);
            assert_eq!(ReplCommand::parse("retry"), ReplCommand::Retry);
            assert_eq!(ReplCommand::parse("back"), ReplCommand::Back);
            assert_eq!(ReplCommand::parse("dismiss"), ReplCommand::Dismiss);
        }

        #[test]
        fn parses_export_with_optional_path() {
            assert_eq!(ReplCommand::parse("export"), ReplCommand::Export(None));
            assert_eq!(
                ReplCommand::parse("export /tmp/log.txt"),
                ReplCommand::Export(Some(PathBuf::from("/tmp/log.txt")))
            );
        }

        #[test]
        fn rejects_extra_arguments() {
            assert_eq!(
                ReplCommand::parse("next please"),
                ReplCommand::Unknown("next please".to_string())
            );
            assert_eq!(
                ReplCommand::parse("open 1 2"),
                ReplCommand::Unknown("open 1 2".to_string())
            );
        }

        #[test]
        fn parses_empty_input() {
            assert_eq!(ReplCommand::parse(""), ReplCommand::Empty);
            assert_eq!(ReplCommand::parse("\t\n"), ReplCommand::Empty);
        }

        #[test]
        fn parses_config_commands() {
            assert_eq!(
                ReplCommand::parse("/config"),
                ReplCommand::Config(ConfigCommand::Path)
            );
            assert_eq!(
                ReplCommand::parse("/CONFIG get ai.model"),
                ReplCommand::Config(ConfigCommand::Get("ai.model".to_string()))
            );
            assert_eq!(
                ReplCommand::parse("/config set ai.model  Claude-Custom "),
                ReplCommand::Config(ConfigCommand::Set {
                    key: "ai.model".to_string(),
                    value: "Claude-Custom".to_string(),
                })
            );
            assert_eq!(
                ReplCommand::parse("/config reload"),
                ReplCommand::Config(ConfigCommand::Reload)
            );
            assert_eq!(ReplCommand::parse("/config get"), ReplCommand::Usage(CONFIG_USAGE));
            assert_eq!(
                ReplCommand::parse("/config set ui.hide_banner"),
                ReplCommand::Usage(CONFIG_USAGE)
            );
            assert_eq!(ReplCommand::parse("/config drop"), ReplCommand::Usage(CONFIG_USAGE));
            assert_eq!(
                ReplCommand::parse("/quit now"),
                ReplCommand::Unknown("/quit now".to_string())
            );
        }

        #[test]
        fn setting_values_prefer_json() {
            assert_eq!(setting_value("true"), serde_json::json!(true));
            assert_eq!(setting_value("4000"), serde_json::json!(4000));
            assert_eq!(
                setting_value("claude-sonnet-4-20250514"),
                serde_json::json!("claude-sonnet-4-20250514")
            );
        }
    }

    mod config_tests {
        use std::sync::Arc;

        use clap::Parser;
        use tempfile::TempDir;
        use tokio::sync::mpsc;

        use super::*;
        use crate::cli::args::Args;
        use crate::explorer::test_support::ScriptedClient;
        use crate::runtime::{CliRuntime, ExplorerRuntime};
        use crate::settings::SettingsManager;

        async fn context(dir: &TempDir) -> CliContext {
            let manager = SettingsManager::with_path(dir.path().join("settings.toml"))
                .await
                .unwrap();
            let settings = manager.get().await;
            let (event_tx, event_rx) = mpsc::unbounded_channel();
            let runtime: Arc<dyn ExplorerRuntime> = Arc::new(CliRuntime::new(event_tx));
            let client = Arc::new(ScriptedClient::new(|_| Ok(String::new())));

            CliContext {
                controller: NavigationController::new(client, runtime.clone()),
                runtime,
                event_rx: Some(event_rx),
                settings_manager: Arc::new(manager),
                settings,
                args: Args::parse_from(["almanac"]),
            }
        }

        #[tokio::test]
        async fn set_saves_and_refreshes_snapshot() {
            let dir = TempDir::new().unwrap();
            let mut ctx = context(&dir).await;
            assert!(ctx.settings.ui.show_instructions);

            configure(
                &mut ctx,
                ConfigCommand::Set {
                    key: "ui.show_instructions".to_string(),
                    value: "false".to_string(),
                },
            )
            .await
            .unwrap();

            assert!(!ctx.settings.ui.show_instructions);
            let written = std::fs::read_to_string(dir.path().join("settings.toml")).unwrap();
            assert!(written.contains("show_instructions = false"));
        }

        #[tokio::test]
        async fn reload_picks_up_file_edits() {
            let dir = TempDir::new().unwrap();
            let mut ctx = context(&dir).await;

            std::fs::write(
                dir.path().join("settings.toml"),
                "[ui]\nhide_banner = true\n",
            )
            .unwrap();
            configure(&mut ctx, ConfigCommand::Reload).await.unwrap();

            assert!(ctx.settings.ui.hide_banner);
        }

        #[tokio::test]
        async fn unknown_keys_are_errors() {
            let dir = TempDir::new().unwrap();
            let mut ctx = context(&dir).await;

            assert!(configure(&mut ctx, ConfigCommand::Get("ui.nope".to_string()))
                .await
                .is_err());
            assert!(configure(
                &mut ctx,
                ConfigCommand::Set {
                    key: "ai.nope".to_string(),
                    value: "1".to_string(),
                },
            )
            .await
            .is_err());
        }
    }
}
