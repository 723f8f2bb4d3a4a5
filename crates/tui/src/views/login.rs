use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use befall_api::ops::instance::get_api_config;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use super::arg;
use crate::app::App;
use crate::oauth_callback::{CallbackServer, redirect_uri};
use crate::view::{View, ViewArg, ViewArgs};

const AUTHORIZE_ENDPOINT: &str = "https://discord.com/api/oauth2/authorize";

const ARGS: &[ViewArg] = &[ViewArg::new(
    "instance_url",
    "Base URL of the API instance to log in to. Defaults to the current instance",
    "string",
)];

/// The browser URL that starts the OAuth2 flow for `client_id`.
pub fn authorize_url(client_id: &str, bind_addr: &str) -> Result<Url> {
    let url = Url::parse_with_params(
        AUTHORIZE_ENDPOINT,
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri(bind_addr).as_str()),
            ("scope", "guilds identify"),
            ("prompt", "none"),
        ],
    )?;
    Ok(url)
}

/// OAuth2 login through the browser and a local callback listener.
#[derive(Default)]
pub struct LoginView {
    cancel: Mutex<Option<CancellationToken>>,
}

impl LoginView {
    fn token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get_or_insert_with(CancellationToken::new)
            .clone()
    }
}

#[async_trait]
impl View for LoginView {
    fn id(&self) -> &'static str {
        "login"
    }

    fn description(&self) -> &'static str {
        "Log in to an instance through the browser"
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
        if let Some(instance_url) = arg(args, "instance_url") {
            let parsed = Url::parse(instance_url).with_context(|| format!("invalid instance URL {instance_url}"))?;
            let normalized = parsed.as_str().trim_end_matches('/').to_string();
            app.state().lock().await.fetch_options.instance_api_url = normalized;
        }
        let (instance, bind_addr) = {
            let state = app.state().lock().await;
            (state.api_url().to_string(), state.bind_addr.clone())
        };

        let config = get_api_config(app.ctx.clone())
            .await
            .with_context(|| format!("failed to fetch API config from {instance}"))?;
        let url = authorize_url(&config.client_id, &bind_addr)?;
        let server = CallbackServer::bind(app.ctx.clone(), &bind_addr).await?;

        let console = app.console();
        console.println(format!("Logging in to {instance}"));
        console.println("Open the following URL in your browser to continue:");
        console.println(url.as_str());
        console.println("Waiting for the login to complete (Ctrl-C to cancel)...");

        let token = self.token();
        let interrupt = tokio::spawn({
            let token = token.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    token.cancel();
                }
            }
        });
        let session = server.wait_for_session(token).await;
        interrupt.abort();

        match session? {
            Some(session) => {
                let user_id = session.user_id.clone();
                {
                    let mut state = app.state().lock().await;
                    state.session.add_session(session);
                    let newest = state.session.user_sessions.len().saturating_sub(1);
                    if let Err(err) = state.session.set_current_session(newest) {
                        warn!(error = %err, "Failed to switch to the new session");
                    }
                }
                info!(user_id = %user_id, "Logged in");
                console.println(format!("Logged in as {user_id}"));
            }
            None => console.println("Login cancelled"),
        }
        Ok(())
    }

    async fn teardown(&self, _app: &App) -> Result<()> {
        if let Some(token) = self.cancel.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take() {
            token.cancel();
        }
        Ok(())
    }
}
