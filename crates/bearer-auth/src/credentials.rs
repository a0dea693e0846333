//! In-memory credential state
//!
//! The access and refresh token always travel together as one `Credentials`
//! value, so state is either "both held" or "both absent". A generation
//! counter identifies the credential epoch: login, logout and refresh each
//! start a new one, and a refresh that began in an older epoch is discarded
//! when it settles.

use common::Secret;

/// Access token plus the refresh token issued with it.
#[derive(Debug, Clone)]
pub struct Credentials {
    access: Secret<String>,
    refresh: Secret<String>,
}

impl Credentials {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: Secret::new(access.into()),
            refresh: Secret::new(refresh.into()),
        }
    }

    pub fn access_token(&self) -> &str {
        self.access.expose()
    }

    pub fn refresh_token(&self) -> &str {
        self.refresh.expose()
    }
}

/// Token pair currently held by a client, if any.
#[derive(Debug, Default)]
pub(crate) struct CredentialState {
    tokens: Option<Credentials>,
    generation: u64,
}

impl CredentialState {
    pub(crate) fn new(tokens: Option<Credentials>) -> Self {
        Self {
            tokens,
            generation: 0,
        }
    }

    pub(crate) fn access_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(Credentials::access_token)
    }

    pub(crate) fn refresh_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(Credentials::refresh_token)
    }

    pub(crate) fn snapshot(&self) -> Option<Credentials> {
        self.tokens.clone()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Store a freshly issued pair (login).
    pub(crate) fn replace(&mut self, tokens: Credentials) {
        self.tokens = Some(tokens);
        self.generation = self.generation.wrapping_add(1);
    }

    /// Drop both tokens (logout).
    pub(crate) fn clear(&mut self) {
        self.tokens = None;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Store a refreshed pair only if nothing changed since `started_in`.
    ///
    /// Returns false when a login or logout happened while the refresh was
    /// in flight; the newer state wins.
    pub(crate) fn rotate(&mut self, tokens: Credentials, started_in: u64) -> bool {
        if self.generation != started_in {
            return false;
        }
        self.replace(tokens);
        true
    }
}
