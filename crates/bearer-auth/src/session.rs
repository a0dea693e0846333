//! Shared mutable state of one client instance
//!
//! Credential State and the refresh state machine sit behind a single
//! synchronous mutex. The guard is never held across an `.await`, which makes
//! "is a refresh pending? if not, start one" a single indivisible step.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::credentials::{CredentialState, Credentials};
use crate::refresh::RefreshState;

pub(crate) struct SessionState {
    pub(crate) credentials: CredentialState,
    pub(crate) refresh: RefreshState,
}

impl SessionState {
    /// Store a login result and detach any refresh still in flight.
    ///
    /// The detached task keeps running; its generation no longer matches, so
    /// it settles as superseded and the next 401 starts a fresh refresh.
    pub(crate) fn sign_in(&mut self, tokens: Credentials) {
        self.credentials.replace(tokens);
        self.refresh = RefreshState::Idle;
    }

    /// Drop both tokens and detach any refresh still in flight.
    pub(crate) fn sign_out(&mut self) {
        self.credentials.clear();
        self.refresh = RefreshState::Idle;
    }
}

pub(crate) struct Session {
    state: Mutex<SessionState>,
}

impl Session {
    pub(crate) fn new(tokens: Option<Credentials>) -> Self {
        Self {
            state: Mutex::new(SessionState {
                credentials: CredentialState::new(tokens),
                refresh: RefreshState::Idle,
            }),
        }
    }

    /// Lock the state. Poisoning is ignored: every mutation is a single
    /// assignment, so a panicking holder cannot leave it half-written.
    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
