//! Process-wide application state.
//!
//! `AppState` is what gets persisted between runs: the current location,
//! the stored sessions, the instance being talked to and the selected guild.
//! User preferences come from the environment on every start and are never
//! written to disk.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::location::Location;
use crate::session::SessionStore;

/// View entered when no persisted location exists.
pub const ROOT_LOCATION: &str = "root";

/// Address the local OAuth2 callback listener binds to.
pub const DEFAULT_BIND_ADDR: &str = "http://localhost:5173";

/// API instance used until the user logs in somewhere else.
pub const DEFAULT_INSTANCE_URL: &str = "http://localhost:3010";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("guild id must not be empty")]
    EmptyGuildId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    /// Base URL of the API instance, without a trailing slash.
    pub instance_api_url: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            instance_api_url: DEFAULT_INSTANCE_URL.to_string(),
        }
    }
}

/// Preferences read from flags and environment on start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPrefs {
    pub mouse_enabled: bool,
    pub paste_enabled: bool,
    pub fullscreen_enabled: bool,
    /// State file; `None` keeps state in memory only.
    pub persist: Option<PathBuf>,
}

impl Default for UserPrefs {
    fn default() -> Self {
        Self {
            mouse_enabled: false,
            paste_enabled: true,
            fullscreen_enabled: true,
            persist: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    /// The location the user is currently at.
    pub current_loc: Location,
    #[serde(default)]
    pub session: SessionStore,
    #[serde(default)]
    pub fetch_options: FetchOptions,
    /// Base address of the local OAuth2 callback listener.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub selected_guild: Option<String>,
    #[serde(skip)]
    pub prefs: UserPrefs,
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

impl AppState {
    pub fn new(prefs: UserPrefs) -> Self {
        Self {
            current_loc: Location::new(ROOT_LOCATION),
            session: SessionStore::default(),
            fetch_options: FetchOptions::default(),
            bind_addr: default_bind_addr(),
            selected_guild: None,
            prefs,
        }
    }

    pub fn set_selected_guild(&mut self, guild_id: &str) -> Result<(), StateError> {
        let guild_id = guild_id.trim();
        if guild_id.is_empty() {
            return Err(StateError::EmptyGuildId);
        }
        self.selected_guild = Some(guild_id.to_string());
        Ok(())
    }

    /// Instance URL with any trailing slash removed.
    pub fn api_url(&self) -> &str {
        self.fetch_options.instance_api_url.trim_end_matches('/')
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(UserPrefs::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_form_omits_prefs_and_fills_defaults() {
        let mut state = AppState::default();
        state.prefs.persist = Some(PathBuf::from("/tmp/state.json"));
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("prefs").is_none());

        let restored: AppState = serde_json::from_str(r#"{"current_loc":{"id":"login"}}"#).unwrap();
        assert_eq!(restored.current_loc.id, "login");
        assert_eq!(restored.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(restored.fetch_options.instance_api_url, DEFAULT_INSTANCE_URL);
    }

    #[test]
    fn selected_guild_rejects_blank_ids() {
        let mut state = AppState::default();
        assert_eq!(state.set_selected_guild("  "), Err(StateError::EmptyGuildId));
        state.set_selected_guild("42").unwrap();
        assert_eq!(state.selected_guild.as_deref(), Some("42"));
    }

    #[test]
    fn api_url_strips_trailing_slash() {
        let mut state = AppState::default();
        state.fetch_options.instance_api_url = "https://api.example.com/".into();
        assert_eq!(state.api_url(), "https://api.example.com");
    }
}
