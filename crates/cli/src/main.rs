mod catalog;
mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use befall_api::{ApiClient, ApiContext, shared_state};
use befall_tui::App;
use befall_types::AppState;
use befall_util::StateStore;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let settings = Settings::resolve(Cli::parse())?;

    let store = settings.prefs.persist.clone().map(StateStore::new);
    let mut state = match &store {
        Some(store) => {
            debug!(path = %store.path().display(), "Loading state");
            store
                .load_app_state(settings.prefs.clone())
                .with_context(|| format!("failed to load state from {}", store.path().display()))?
                .unwrap_or_else(|| AppState::new(settings.prefs.clone()))
        }
        None => {
            info!("Persistence disabled; state is kept in memory");
            AppState::new(settings.prefs.clone())
        }
    };
    settings.apply(&mut state);

    let ctx = ApiContext::new(ApiClient::new()?, shared_state(state));
    let registry = Arc::new(catalog::build_operation_registry());
    let app = App::new(ctx, registry, store);
    befall_tui::run(app, settings.commands.as_deref()).await
}

/// Logs go to stderr so stdout stays clean for command output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
