use async_trait::async_trait;

use crate::app::App;
use crate::view::{View, ViewArgs};

/// Landing view: where we are and what to do next.
pub struct RootView;

#[async_trait]
impl View for RootView {
    fn id(&self) -> &'static str {
        "root"
    }

    fn description(&self) -> &'static str {
        "Shows the current instance, session and guild"
    }

    async fn render(&self, app: &App, _args: &ViewArgs) -> anyhow::Result<()> {
        let (instance, user, guild) = {
            let mut state = app.state().lock().await;
            let user = state
                .session
                .current_session()
                .ok()
                .map(|session| session.user_id.clone());
            (state.api_url().to_string(), user, state.selected_guild.clone())
        };

        let console = app.console();
        console.println(format!("Instance: {instance}"));
        console.println(match &user {
            Some(user_id) => format!("Session:  logged in as {user_id}"),
            None => "Session:  not logged in".to_string(),
        });
        console.println(match &guild {
            Some(guild_id) => format!("Guild:    {guild_id}"),
            None => "Guild:    none selected".to_string(),
        });
        console.println("");
        if user.is_none() {
            console.println("Run `login` to authenticate.");
        } else if guild.is_none() {
            console.println("Run `choose_guild` to pick a guild.");
        }
        console.println("Run `apiexec.ls` to list API operations, or `help` for all commands.");
        Ok(())
    }
}
