use std::io::IsTerminal;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use befall_api::ops::users::{GetUserGuildsData, get_user_guilds};
use befall_types::models::{DashboardGuild, DashboardGuildData};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{arg, flag};
use crate::app::App;
use crate::picker::{PickerItem, PickerOptions, PickerState, run_picker};
use crate::view::{View, ViewArg, ViewArgs};

const ARGS: &[ViewArg] = &[
    ViewArg::new(
        "guild_id",
        "The ID of the guild to choose. If unset, will show guild picker",
        "string",
    ),
    ViewArg::new("refresh", "Whether to refresh the guild list", "bool"),
];

/// Picks the guild later operations default to.
#[derive(Default)]
pub struct ChooseGuildView {
    cancel: Mutex<Option<CancellationToken>>,
}

fn label(guild: &DashboardGuild) -> String {
    format!("{} ({})", guild.name, guild.id)
}

fn picker_items(data: &DashboardGuildData) -> Vec<PickerItem> {
    data.guilds
        .iter()
        .map(|guild| {
            let item = PickerItem::new(label(guild));
            if data.bot_in_guild(&guild.id) {
                item
            } else {
                item.with_detail("[bot not added]")
            }
        })
        .collect()
}

impl ChooseGuildView {
    fn token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get_or_insert_with(CancellationToken::new)
            .clone()
    }

    /// Applies a picked guild: selects it, or explains that the bot must be
    /// invited first.
    async fn choose(&self, app: &App, data: &DashboardGuildData, index: usize) -> Result<()> {
        let guild = data
            .guilds
            .get(index)
            .ok_or_else(|| anyhow!("invalid guild index {index}"))?;
        if !data.bot_in_guild(&guild.id) {
            info!(guild_id = %guild.id, "Bot is not in the chosen guild");
            app.console().println(format!(
                "The bot is not in {}. Invite it to the guild, then run `choose_guild refresh=true`.",
                label(guild)
            ));
            return Ok(());
        }
        app.state().lock().await.set_selected_guild(&guild.id)?;
        app.console().println(format!("Selected guild {}", label(guild)));
        Ok(())
    }
}

#[async_trait]
impl View for ChooseGuildView {
    fn id(&self) -> &'static str {
        "choose_guild"
    }

    fn description(&self) -> &'static str {
        "Choose the selected guild"
    }

    fn args(&self) -> &'static [ViewArg] {
        ARGS
    }

    fn resumable(&self) -> bool {
        false
    }

    async fn setup(&self, _app: &App) -> Result<()> {
        *self.cancel.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(CancellationToken::new());
        Ok(())
    }

    async fn render(&self, app: &App, args: &ViewArgs) -> Result<()> {
        if let Some(guild_id) = arg(args, "guild_id") {
            app.state().lock().await.set_selected_guild(guild_id)?;
            app.console().println(format!("Selected guild {guild_id}"));
            return Ok(());
        }

        let refresh = flag(args, "refresh")?;
        info!(refresh, "Fetching user guild list...");
        let data = get_user_guilds(app.ctx.clone(), GetUserGuildsData { refresh })
            .await
            .context("failed to fetch your guilds")?;
        if data.guilds.is_empty() {
            app.console().println("No guilds found for this account.");
            return Ok(());
        }

        if !std::io::stdout().is_terminal() {
            for item in picker_items(&data) {
                match item.detail {
                    Some(detail) => app.console().println(format!("{} {detail}", item.label)),
                    None => app.console().println(item.label),
                }
            }
            app.console().println("Run `choose_guild guild_id=<id>` to select one.");
            return Ok(());
        }

        let options = {
            let state = app.state().lock().await;
            PickerOptions {
                fullscreen: state.prefs.fullscreen_enabled,
                mouse: state.prefs.mouse_enabled,
            }
        };
        let picker = PickerState::new("Guilds", picker_items(&data));
        let token = self.token();
        let picked = tokio::task::spawn_blocking(move || run_picker(picker, options, token))
            .await
            .context("guild picker panicked")??;

        match picked {
            Some(index) => self.choose(app, &data, index).await,
            None => {
                app.console().println("No guild selected.");
                Ok(())
            }
        }
    }

    async fn teardown(&self, _app: &App) -> Result<()> {
        if let Some(token) = self.cancel.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take() {
            token.cancel();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use befall_api::{ApiClient, ApiContext, shared_state};
    use befall_registry::OperationRegistry;
    use befall_types::AppState;

    use crate::app::Console;

    fn app() -> App {
        let ctx = ApiContext::new(ApiClient::new().unwrap(), shared_state(AppState::default()));
        App::new(ctx, Arc::new(OperationRegistry::new()), None).with_console(Console::capture())
    }

    fn guilds() -> DashboardGuildData {
        DashboardGuildData {
            guilds: vec![
                DashboardGuild {
                    id: "1".into(),
                    name: "Alpha".into(),
                    avatar: String::new(),
                },
                DashboardGuild {
                    id: "2".into(),
                    name: "Beta".into(),
                    avatar: String::new(),
                },
            ],
            bot_in_guilds: vec!["1".into()],
        }
    }

    #[tokio::test]
    async fn explicit_guild_id_is_selected_without_fetching() {
        let app = app();
        let mut args = ViewArgs::new();
        args.insert("guild_id".into(), " 123 ".into());
        ChooseGuildView::default().render(&app, &args).await.unwrap();
        assert_eq!(app.state().lock().await.selected_guild.as_deref(), Some("123"));
    }

    #[test]
    fn picker_marks_guilds_without_the_bot() {
        let items = picker_items(&guilds());
        assert_eq!(items[0], PickerItem::new("Alpha (1)"));
        assert_eq!(items[1].detail.as_deref(), Some("[bot not added]"));
    }

    #[tokio::test]
    async fn choosing_a_guild_without_the_bot_only_prints_a_notice() {
        let app = app();
        let view = ChooseGuildView::default();
        view.choose(&app, &guilds(), 1).await.unwrap();
        assert!(app.state().lock().await.selected_guild.is_none());
        assert!(app.console().captured().contains("Invite it to the guild"));

        view.choose(&app, &guilds(), 0).await.unwrap();
        assert_eq!(app.state().lock().await.selected_guild.as_deref(), Some("1"));
        assert!(view.choose(&app, &guilds(), 9).await.is_err());
    }
}
