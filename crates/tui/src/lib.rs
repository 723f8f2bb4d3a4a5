//! # Befall Shell
//!
//! The interactive side of the Befall console: the navigation router and
//! its views, the prompt with completion, and the small terminal widgets
//! (guild picker, line editor) the views need.
//!
//! ## Architecture
//!
//! Every navigable state is a [`View`] with a setup/render/teardown
//! lifecycle. The [`Router`] moves between views and persists the current
//! location after every transition, so the next start resumes where the
//! user left off unless that view has side effects. The [`Shell`] turns
//! typed lines into router transitions.

mod app;
mod line_editor;
mod oauth_callback;
mod picker;
mod router;
mod shell;
mod theme;
mod view;
pub mod views;

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

pub use app::{App, Console};
pub use oauth_callback::{CallbackServer, redirect_uri};
pub use router::{DEFAULT_VIEW, Hook, NavigationError, Router};
pub use shell::{Flow, PROMPT, ParsedCommand, Shell, ShellError};
pub use view::{View, ViewArg, ViewArgs};

/// Runs the shell.
///
/// With `commands`, the `;`-separated commands are executed and the first
/// failure is returned. Otherwise the persisted location is re-entered
/// (views with side effects fall back to [`DEFAULT_VIEW`]) and the
/// interactive prompt takes over until `exit` or end of input.
pub async fn run(app: App, commands: Option<&str>) -> Result<()> {
    let router = Arc::new(views::default_router());
    let shell = Shell::new(app, Arc::clone(&router));

    if let Some(commands) = commands {
        shell.run_commands(commands).await?;
        return Ok(());
    }

    if let Err(err) = router.goto_current_location(shell.app()).await {
        warn!(error = %err, "Failed to resume the saved location");
        shell.app().console().println(format!("Error: {err}"));
    }
    shell.run_interactive().await
}
