//! Process-wide authentication state.
//!
//! A single [`SessionStore`] is created by the application and handed to the
//! transport, which reads the token on every request, and to the auth
//! service, which sets and clears it. Clones share the same state.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

pub const ADMIN_ROLE: &str = "admin";

/// Client-side description of the logged-in user.
///
/// The login endpoint only returns a token, so this is built from the
/// submitted email and a fixed role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: SessionUser,
}

impl AuthSession {
    pub fn new(token: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: SessionUser {
                email: email.into(),
                role: ADMIN_ROLE.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<Option<AuthSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(watch::Sender::new(None)),
        }
    }

    /// Current bearer token, if authenticated.
    pub fn token(&self) -> Option<String> {
        self.state.borrow().as_ref().map(|session| session.token.clone())
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Install a session, replacing any previous one.
    pub fn set(&self, session: AuthSession) {
        tracing::debug!("Session set for {}", session.user.email);
        self.state.send_replace(Some(session));
    }

    /// Re-install a session persisted by a previous run.
    pub fn restore(&self, session: AuthSession) {
        self.set(session);
    }

    /// Drop the session. Returns `false` when there was nothing to clear.
    pub fn clear(&self) -> bool {
        let cleared = self.state.send_if_modified(|state| state.take().is_some());
        if cleared {
            tracing::debug!("Session cleared");
        }
        cleared
    }

    /// Observe login/logout transitions.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.state.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
