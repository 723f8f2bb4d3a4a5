//! Crash-safe JSON persistence of the application state.
//!
//! State is written to a hidden swap file next to the target and then renamed
//! over it, so a reader never observes a half-written file.

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use befall_types::{AppState, UserPrefs};
use dirs_next::config_dir;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use crate::expand_tilde;

/// Environment variable selecting the state file. Empty or `false` disables
/// persistence.
pub const PERSIST_PATH_ENV: &str = "BEFALL_PERSIST";

/// Default filename for the persisted state.
pub const STATE_FILE_NAME: &str = "state.json";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("state I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("state file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("state serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// JSON file store with atomic replace-on-save.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Swap file used while saving: `.<file name>.swp` in the same directory.
    pub fn swap_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| STATE_FILE_NAME.to_string());
        self.path.with_file_name(format!(".{file_name}.swp"))
    }

    /// Reads the stored value. A missing file is `Ok(None)`; a file that does
    /// not parse is an error and is left untouched.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, PersistenceError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|source| PersistenceError::Malformed {
                path: self.path.clone(),
                source,
            })
    }

    pub fn save<T: Serialize>(&self, value: &T) -> Result<(), PersistenceError> {
        let io_err = |source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let data = serde_json::to_vec_pretty(value)?;
        let swap = self.swap_path();
        {
            let mut file = fs::File::create(&swap).map_err(io_err)?;
            file.write_all(&data).map_err(io_err)?;
            file.sync_all().map_err(io_err)?;
        }
        fs::rename(&swap, &self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), bytes = data.len(), "Persisted state");
        Ok(())
    }

    /// Loads the application state, attaching `prefs` and dropping expired
    /// sessions. When any session was dropped the pruned state is written
    /// back immediately.
    pub fn load_app_state(&self, prefs: UserPrefs) -> Result<Option<AppState>, PersistenceError> {
        let Some(mut state) = self.load::<AppState>()? else {
            return Ok(None);
        };
        state.prefs = prefs;
        let removed = state.session.remove_expired_sessions();
        if !removed.is_empty() {
            info!(count = removed.len(), path = %self.path.display(), "Re-persisting state after dropping expired sessions");
            self.save(&state)?;
        }
        Ok(Some(state))
    }
}

/// State file location: `BEFALL_PERSIST` when set to a path, otherwise
/// `<config dir>/befall/state.json`. Returns `None` when the variable
/// explicitly disables persistence.
pub fn default_state_path() -> Option<PathBuf> {
    if let Ok(value) = env::var(PERSIST_PATH_ENV) {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("false") {
            return None;
        }
        return Some(expand_tilde(trimmed));
    }

    Some(
        config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("befall")
            .join(STATE_FILE_NAME),
    )
}
