use anyhow::Context;
use async_trait::async_trait;
use befall_util::redact_json;

use crate::app::App;
use crate::view::{View, ViewArgs};

/// Pretty-prints the persisted state with secrets redacted.
pub struct ShowStateView;

#[async_trait]
impl View for ShowStateView {
    fn id(&self) -> &'static str {
        "showstate"
    }

    fn description(&self) -> &'static str {
        "Prints out the current state"
    }

    async fn render(&self, app: &App, _args: &ViewArgs) -> anyhow::Result<()> {
        let snapshot = app.state().lock().await.clone();
        let mut value = serde_json::to_value(&snapshot).context("failed to encode state")?;
        redact_json(&mut value);
        app.console().println(serde_json::to_string_pretty(&value)?);
        Ok(())
    }
}
