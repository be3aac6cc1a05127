//! Bearer token handling and route guard
//!
//! Tokens are opaque. The only thing the engine cares about is whether a
//! token is present and not past its expiry.

use crate::traits::AuthProvider;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Opaque bearer token with optional expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl BearerToken {
    /// Token that never expires
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    /// Token valid until `expires_at`
    pub fn expiring(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at: Some(expires_at),
        }
    }

    /// Whether the token is expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl AuthProvider for BearerToken {
    fn bearer_token(&self) -> Option<String> {
        if self.token.is_empty() || self.is_expired() {
            None
        } else {
            Some(self.token.clone())
        }
    }
}

/// Mutable token holder (login/logout)
#[derive(Debug, Default)]
pub struct TokenStore {
    current: RwLock<Option<BearerToken>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: BearerToken) -> Self {
        Self {
            current: RwLock::new(Some(token)),
        }
    }

    /// Store a token (login)
    pub fn set(&self, token: BearerToken) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Some(token);
    }

    /// Clear the stored token (logout)
    pub fn clear(&self) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = None;
    }
}

impl AuthProvider for TokenStore {
    fn bearer_token(&self) -> Option<String> {
        let current = self.current.read().unwrap_or_else(|e| e.into_inner());
        current.as_ref().and_then(|t| t.bearer_token())
    }
}

/// No credentials at all
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl AuthProvider for Anonymous {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// Route guard decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteAccess {
    Allow,
    Deny,
}

/// Allow protected routes only for authenticated callers
pub fn guard(auth: &dyn AuthProvider) -> RouteAccess {
    if auth.is_authenticated() {
        RouteAccess::Allow
    } else {
        RouteAccess::Deny
    }
}
