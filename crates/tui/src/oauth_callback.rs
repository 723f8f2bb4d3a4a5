//! Local HTTP listener that receives the OAuth2 redirect.
//!
//! The provider redirects the browser to `<bind addr>/authorize?code=...`.
//! The handler exchanges the code for a session and hands it back to the
//! waiting login view, which then shuts the listener down.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use befall_api::ApiContext;
use befall_api::ops::auth::create_oauth2_login;
use befall_types::UserSession;
use befall_types::models::AuthorizeRequest;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

pub const CALLBACK_PATH: &str = "/authorize";

/// `<bind addr>/authorize`, the redirect URI registered with the provider.
pub fn redirect_uri(bind_addr: &str) -> String {
    format!("{}{CALLBACK_PATH}", bind_addr.trim_end_matches('/'))
}

/// Host and port to listen on for `bind_addr`, e.g. `http://localhost:5173`.
pub fn listen_target(bind_addr: &str) -> Result<(String, u16)> {
    let url = Url::parse(bind_addr).with_context(|| format!("invalid bind address {bind_addr}"))?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("bind address {bind_addr} has no host"))?
        .to_string();
    let port = url
        .port_or_known_default()
        .ok_or_else(|| anyhow!("bind address {bind_addr} has no port"))?;
    Ok((host, port))
}

#[derive(Clone)]
struct CallbackState {
    ctx: ApiContext,
    redirect_uri: String,
    sender: Arc<Mutex<Option<oneshot::Sender<UserSession>>>>,
}

async fn authorize(State(state): State<CallbackState>, Query(params): Query<HashMap<String, String>>) -> String {
    let Some(code) = params.get("code").filter(|code| !code.is_empty()) else {
        return "Error: missing code".to_string();
    };
    let request = AuthorizeRequest {
        code: code.clone(),
        redirect_uri: state.redirect_uri.clone(),
        protocol: "a1".to_string(),
        scope: "normal".to_string(),
    };
    match create_oauth2_login(state.ctx.clone(), request).await {
        Ok(session) => {
            let sender = state.sender.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take();
            match sender.map(|sender| sender.send(session)) {
                Some(Ok(())) => "Success! You can close this window now.".to_string(),
                Some(Err(_)) | None => "Error: login already completed".to_string(),
            }
        }
        Err(err) => {
            warn!(error = %err, "OAuth2 code exchange failed");
            format!("Error: {err}")
        }
    }
}

/// A bound callback listener waiting for a single successful login.
pub struct CallbackServer {
    listener: TcpListener,
    ctx: ApiContext,
    redirect_uri: String,
}

impl CallbackServer {
    pub async fn bind(ctx: ApiContext, bind_addr: &str) -> Result<Self> {
        let (host, port) = listen_target(bind_addr)?;
        let listener = TcpListener::bind((host.as_str(), port))
            .await
            .with_context(|| format!("failed to listen on {host}:{port}"))?;
        Ok(Self::from_listener(ctx, listener, redirect_uri(bind_addr)))
    }

    pub fn from_listener(ctx: ApiContext, listener: TcpListener, redirect_uri: String) -> Self {
        Self {
            listener,
            ctx,
            redirect_uri,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until a session is created (`Some`) or `cancel` fires (`None`).
    pub async fn wait_for_session(self, cancel: CancellationToken) -> Result<Option<UserSession>> {
        let (sender, receiver) = oneshot::channel();
        let state = CallbackState {
            ctx: self.ctx,
            redirect_uri: self.redirect_uri,
            sender: Arc::new(Mutex::new(Some(sender))),
        };
        let router = Router::new().route(CALLBACK_PATH, get(authorize)).with_state(state);

        let shutdown = CancellationToken::new();
        let server = tokio::spawn({
            let shutdown = shutdown.clone();
            let listener = self.listener;
            async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move { shutdown.cancelled().await })
                    .await
            }
        });

        let session = tokio::select! {
            session = receiver => session.ok(),
            _ = cancel.cancelled() => {
                info!("Login wait cancelled");
                None
            }
        };

        shutdown.cancel();
        server
            .await
            .map_err(|err| anyhow!("callback server task failed: {err}"))?
            .context("callback server failed")?;
        Ok(session)
    }
}
