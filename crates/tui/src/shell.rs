//! Command dispatch for the interactive prompt and `--command`.
//!
//! A line holds one or more `;`-separated commands. Each command is a view id
//! (or a builtin) followed by `key=value` arguments; bare words fill the
//! view's declared arguments in order.

use std::collections::HashSet;
use std::sync::Arc;

use befall_util::{LexError, lex_shell_like_ranged, lex_words, split_commands};
use thiserror::Error;
use tracing::debug;

use crate::app::App;
use crate::line_editor::LineEditor;
use crate::router::{NavigationError, Router};
use crate::view::ViewArgs;

pub const PROMPT: &str = "befall> ";

const BUILTINS: &[(&str, &str)] = &[
    ("help", "Show this help"),
    ("complete", "Print the completions for the rest of the line"),
    ("exit", "Leave the shell"),
    ("quit", "Leave the shell"),
];

#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("unexpected argument {token:?} for {command}")]
    UnexpectedArgument { command: String, token: String },
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: ViewArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell {
    app: App,
    router: Arc<Router>,
}

impl Shell {
    pub fn new(app: App, router: Arc<Router>) -> Self {
        Self { app, router }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Splits one command into its name and arguments. Blank input is `None`.
    pub fn parse_command(&self, command: &str) -> Result<Option<ParsedCommand>, ShellError> {
        let mut words = lex_words(command)?.into_iter();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let declared = self.router.get(&name).map(|view| view.args()).unwrap_or_default();

        let mut args = ViewArgs::new();
        let mut bare = Vec::new();
        for word in words {
            match word.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    args.insert(key.to_string(), value.to_string());
                }
                _ => bare.push(word),
            }
        }
        let mut open = declared.iter().filter(|arg| !args.contains_key(arg.name));
        let mut positional = Vec::new();
        for word in bare {
            match open.next() {
                Some(arg) => positional.push((arg.name.to_string(), word)),
                None => {
                    return Err(ShellError::UnexpectedArgument {
                        command: name,
                        token: word,
                    });
                }
            }
        }
        args.extend(positional);
        Ok(Some(ParsedCommand { name, args }))
    }

    /// Runs every command on the line, stopping at the first error or exit.
    pub async fn run_line(&self, line: &str) -> Result<Flow, ShellError> {
        for command in split_commands(line)? {
            if self.run_command(command).await? == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    async fn run_command(&self, command: &str) -> Result<Flow, ShellError> {
        // The rest of a `complete` line is raw input, not arguments.
        if let Some(rest) = command.trim_start().strip_prefix("complete")
            && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            for candidate in self.complete(rest.trim_start()) {
                self.app.console().println(candidate);
            }
            return Ok(Flow::Continue);
        }

        let Some(parsed) = self.parse_command(command)? else {
            return Ok(Flow::Continue);
        };
        debug!(command = %parsed.name, "Running command");
        match parsed.name.as_str() {
            "exit" | "quit" => return Ok(Flow::Exit),
            "help" => self.print_help(),
            name => self.router.goto(&self.app, name, parsed.args).await?,
        }
        Ok(Flow::Continue)
    }

    /// Full-line completion candidates for `line`.
    pub fn complete(&self, line: &str) -> Vec<String> {
        let tokens = lex_shell_like_ranged(line);
        let ends_with_space = line.chars().last().is_some_and(char::is_whitespace);

        let first = match tokens.first() {
            Some(first) if tokens.len() > 1 || ends_with_space => first,
            _ => {
                let typed = tokens.first().map_or(String::new(), |token| token.text.to_lowercase());
                return self
                    .command_names()
                    .into_iter()
                    .filter(|name| name.to_lowercase().starts_with(&typed))
                    .map(str::to_string)
                    .collect();
            }
        };

        let Some(view) = self.router.get(first.text) else {
            return Vec::new();
        };
        if let Some(candidates) = view.complete(&self.app, line) {
            return candidates;
        }

        let fragment = if ends_with_space { None } else { tokens.last() };
        if fragment.is_some_and(|token| token.text.contains('=')) {
            return Vec::new();
        }
        let present: HashSet<&str> = tokens[1..]
            .iter()
            .filter_map(|token| token.text.split_once('=').map(|(key, _)| key))
            .collect();
        let head = match fragment {
            Some(token) => line[..token.start].trim_end(),
            None => line.trim_end(),
        };
        let typed = fragment.map_or("", |token| token.text);
        view.args()
            .iter()
            .filter(|arg| !present.contains(arg.name) && arg.name.starts_with(typed))
            .map(|arg| format!("{head} {}=", arg.name))
            .collect()
    }

    fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.router.views().map(|view| view.id()).collect();
        names.extend(BUILTINS.iter().map(|(name, _)| *name));
        names
    }

    fn print_help(&self) {
        let console = self.app.console();
        console.println("Commands:");
        for view in self.router.views() {
            console.println(format!("  {:<16}{}", view.id(), view.description()));
            for arg in view.args() {
                console.println(format!("      {}=<{}>  {}", arg.name, arg.type_name, arg.description));
            }
        }
        console.println("");
        console.println("Builtins:");
        for (name, description) in BUILTINS {
            console.println(format!("  {name:<16}{description}"));
        }
    }

    /// Runs `;`-separated commands, failing on the first error.
    pub async fn run_commands(&self, commands: &str) -> Result<(), ShellError> {
        self.run_line(commands).await.map(|_| ())
    }

    /// Reads and runs lines until `exit` or end of input. Errors are printed
    /// and the prompt continues.
    pub async fn run_interactive(&self) -> anyhow::Result<()> {
        let paste = self.app.state().lock().await.prefs.paste_enabled;
        let mut editor = LineEditor::new(paste);
        loop {
            let line = tokio::task::block_in_place(|| editor.read_line(PROMPT, &|line: &str| self.complete(line)))?;
            let Some(line) = line else {
                break;
            };
            editor.add_history(&line);
            match self.run_line(&line).await {
                Ok(Flow::Exit) => break,
                Ok(Flow::Continue) => {}
                Err(err) => self.app.console().println(format!("Error: {err}")),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use befall_api::{ApiClient, ApiContext, shared_state};
    use befall_registry::OperationRegistry;
    use befall_types::AppState;

    use crate::app::Console;
    use crate::views::default_router;

    fn shell() -> Shell {
        let ctx = ApiContext::new(ApiClient::new().unwrap(), shared_state(AppState::default()));
        let app = App::new(ctx, Arc::new(OperationRegistry::new()), None).with_console(Console::capture());
        Shell::new(app, Arc::new(default_router()))
    }

    #[test]
    fn bare_words_fill_declared_arguments_in_order() {
        let shell = shell();
        let parsed = shell.parse_command("choose_guild 'a b' refresh=true").unwrap().unwrap();
        assert_eq!(parsed.name, "choose_guild");
        assert_eq!(parsed.args.get("guild_id").map(String::as_str), Some("a b"));
        assert_eq!(parsed.args.get("refresh").map(String::as_str), Some("true"));

        let parsed = shell.parse_command("choose_guild refresh=false 12").unwrap().unwrap();
        assert_eq!(parsed.args.get("guild_id").map(String::as_str), Some("12"));
    }

    #[test]
    fn extra_bare_words_and_bad_quotes_are_errors() {
        let shell = shell();
        assert!(matches!(
            shell.parse_command("showstate now"),
            Err(ShellError::UnexpectedArgument { .. })
        ));
        assert!(matches!(shell.parse_command("login 'x"), Err(ShellError::Lex(_))));
        assert_eq!(shell.parse_command("   ").unwrap(), None);
    }

    #[tokio::test]
    async fn commands_run_in_sequence_and_exit_stops_the_line() {
        let shell = shell();
        let flow = shell
            .run_line("choose_guild guild_id=5; exit; choose_guild guild_id=6")
            .await
            .unwrap();
        assert_eq!(flow, Flow::Exit);
        assert_eq!(shell.app().state().lock().await.selected_guild.as_deref(), Some("5"));
        assert_eq!(shell.app().state().lock().await.current_loc.id, "choose_guild");
    }

    #[tokio::test]
    async fn unknown_commands_are_route_errors() {
        let shell = shell();
        let err = shell.run_commands("nowhere").await.unwrap_err();
        assert!(matches!(err, ShellError::Navigation(NavigationError::RouteNotFound(_))));
    }

    #[tokio::test]
    async fn help_lists_views_and_builtins() {
        let shell = shell();
        shell.run_line("help").await.unwrap();
        let out = shell.app().console().captured();
        assert!(out.contains("choose_guild    Choose the selected guild"));
        assert!(out.contains("guild_id=<string>"));
        assert!(out.contains("exit"));
    }

    #[test]
    fn completes_commands_then_declared_arguments() {
        let shell = shell();
        assert_eq!(shell.complete("ch"), vec!["choose_guild"]);
        assert!(shell.complete("").contains(&"help".to_string()));
        assert_eq!(
            shell.complete("choose_guild "),
            vec!["choose_guild guild_id=", "choose_guild refresh="]
        );
        assert_eq!(shell.complete("choose_guild guild_id=1 re"), vec!["choose_guild guild_id=1 refresh="]);
        assert!(shell.complete("choose_guild guild_id=").is_empty());
    }

    #[tokio::test]
    async fn complete_builtin_prints_candidates() {
        let shell = shell();
        shell.run_line("complete show").await.unwrap();
        assert_eq!(shell.app().console().captured(), "showstate\n");
    }
}
