//! Session state: who is logged in and which CSRF token is current
//!
//! `is_authenticated` is derived from the presence of a user, so the two can
//! never disagree.

use serde::Serialize;

use crate::auth::UserIdentity;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    user: Option<UserIdentity>,
    csrf_token: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserIdentity::is_admin)
    }

    /// Replace the identity. Passing `None` logs the session out but keeps
    /// the CSRF token.
    pub fn set_user(&mut self, user: Option<UserIdentity>) {
        self.user = user;
    }

    /// Replace the CSRF token. Empty tokens are stored as `None`.
    pub fn set_csrf_token(&mut self, token: Option<String>) {
        self.csrf_token = token.filter(|t| !t.is_empty());
    }

    /// Reset identity and token together.
    pub fn clear_auth(&mut self) {
        self.user = None;
        self.csrf_token = None;
    }
}
