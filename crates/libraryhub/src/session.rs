//! Shared, observable session store
//!
//! A cheap-to-clone handle over a `tokio::sync::watch` channel. Every clone
//! sees the same state, and `subscribe` hands out receivers that wake on each
//! mutation.

use std::sync::Arc;

use libraryhub_core::auth::UserIdentity;
use libraryhub_core::session::Session;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::new());
        Self { tx: Arc::new(tx) }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.tx.borrow().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated()
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.tx.borrow().csrf_token().map(str::to_string)
    }

    pub fn set_user(&self, user: Option<UserIdentity>) {
        self.tx.send_modify(|s| s.set_user(user));
    }

    pub fn set_csrf_token(&self, token: Option<String>) {
        self.tx.send_modify(|s| s.set_csrf_token(token));
    }

    /// Forget the user and the CSRF token. Server-side session cookies are
    /// left for the backend to expire.
    pub fn clear_auth(&self) {
        self.tx.send_modify(Session::clear_auth);
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }
}
