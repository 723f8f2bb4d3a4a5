//! Authenticated user sessions.
//!
//! Several sessions may be stored at once; one of them is "current" and is
//! used to authorize requests. Every accessor prunes expired sessions first
//! so callers never observe a stale token.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session was not found")]
    NotFound,
    #[error("session does not have a token")]
    NoToken,
}

/// A session created by the OAuth2 login flow or the session API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UserSession {
    pub user_id: String,
    pub session_id: String,
    pub token: String,
    pub expiry: DateTime<Utc>,
}

impl UserSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry < now
    }
}

/// Stored sessions plus the index of the current one.
///
/// The index follows its session when others are removed, and is cleared
/// when the current session itself goes away.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStore {
    #[serde(default)]
    pub user_sessions: Vec<UserSession>,
    #[serde(default)]
    pub current_session_index: Option<usize>,
}

impl SessionStore {
    /// Drops expired sessions, returning the ones removed.
    pub fn remove_expired_sessions(&mut self) -> Vec<UserSession> {
        self.remove_expired_sessions_at(Utc::now())
    }

    pub fn remove_expired_sessions_at(&mut self, now: DateTime<Utc>) -> Vec<UserSession> {
        let expired = self.retain_sessions(|session| !session.is_expired_at(now));
        if !expired.is_empty() {
            info!(count = expired.len(), "Removed expired sessions from state");
        }
        expired
    }

    /// Keeps the sessions matching `keep`, re-pointing the current index.
    fn retain_sessions(&mut self, mut keep: impl FnMut(&UserSession) -> bool) -> Vec<UserSession> {
        let current = self.current_session_index.take();
        let mut removed = Vec::new();
        for (index, session) in std::mem::take(&mut self.user_sessions).into_iter().enumerate() {
            if keep(&session) {
                if current == Some(index) {
                    self.current_session_index = Some(self.user_sessions.len());
                }
                self.user_sessions.push(session);
            } else {
                removed.push(session);
            }
        }
        removed
    }

    /// Stores a session. It becomes current when no session is current yet.
    pub fn add_session(&mut self, session: UserSession) {
        self.remove_expired_sessions();
        self.user_sessions.push(session);
        if self.current_session_index.is_none() {
            self.current_session_index = Some(self.user_sessions.len() - 1);
        }
    }

    /// The session used to authorize requests.
    pub fn current_session(&mut self) -> Result<&UserSession, SessionError> {
        self.remove_expired_sessions();
        let session = self
            .current_session_index
            .and_then(|index| self.user_sessions.get(index))
            .ok_or(SessionError::NotFound)?;
        if session.token.is_empty() {
            return Err(SessionError::NoToken);
        }
        Ok(session)
    }

    pub fn set_current_session(&mut self, index: usize) -> Result<(), SessionError> {
        self.remove_expired_sessions();
        if index >= self.user_sessions.len() {
            return Err(SessionError::NotFound);
        }
        self.current_session_index = Some(index);
        Ok(())
    }

    /// Removes the session with the given id, if stored. Returns whether a
    /// session was removed.
    pub fn remove_session_if_exists(&mut self, session_id: &str) -> bool {
        let removed = !self.retain_sessions(|session| session.session_id != session_id).is_empty();
        self.remove_expired_sessions();
        removed
    }

    pub fn is_authorized(&mut self) -> bool {
        self.current_session().is_ok()
    }
}
