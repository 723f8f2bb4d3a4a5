//! Error taxonomy of the fetch client and the business operations.

use befall_types::SessionError;
use indexmap::IndexMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable session for an authorized call.
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("fetch: server currently undergoing maintenance")]
    ServerMaintenance,
    #[error("fetch: failed to unmarshal response: {0}")]
    Unmarshal(String),
    #[error("fetch: invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("fetch: failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("fetch: transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// `X-Error-Type: permission_check`, already rendered for display.
    #[error("{0}")]
    Permission(String),
    /// `X-Error-Type: settings_error`, already rendered for display.
    #[error("{0}")]
    Settings(String),
    #[error("API error: {message}{}", render_context(.context))]
    Api {
        status: u16,
        message: String,
        context: IndexMap<String, String>,
    },
}

impl ApiError {
    /// Whether re-running the login flow may fix the error.
    pub fn is_session_error(&self) -> bool {
        matches!(self, ApiError::Session(_))
    }
}

fn render_context(context: &IndexMap<String, String>) -> String {
    if context.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = context.iter().map(|(key, value)| format!("{key}: {value}")).collect();
    format!(" [{{{}}}]", pairs.join(", "))
}
