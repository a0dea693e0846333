//! Single-flight token refresh on 401
//!
//! State machine:
//! - Idle → Refreshing: first qualifying 401 spawns the refresh task and
//!   publishes a shared handle to its outcome
//! - Refreshing → Refreshing: later 401s attach to the published handle
//! - Refreshing → Idle: the task settles and clears its own handle, or a
//!   login/logout detaches it
//!
//! A 401 qualifies only if a refresh token is held and the failed descriptor
//! is not already a replay. The refresh runs on its own task, so it settles
//! even if every caller that awaited it has been dropped.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};

use common::Secret;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use reqwest::StatusCode;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use transport::Request;

use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::interceptor::{Recovery, ResponseStrategy};
use crate::metrics;
use crate::pipeline::Pipeline;
use crate::session::Session;
use crate::token;

/// How a refresh attempt settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New credentials are stored.
    Refreshed,
    /// The refresh endpoint rejected the token or could not be reached.
    Failed,
    /// Login or logout happened while the refresh was in flight; its result was dropped.
    Superseded,
}

impl RefreshOutcome {
    pub fn label(self) -> &'static str {
        match self {
            RefreshOutcome::Refreshed => "success",
            RefreshOutcome::Failed => "failure",
            RefreshOutcome::Superseded => "superseded",
        }
    }
}

type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Refresh state stored next to the credentials.
#[derive(Default)]
pub(crate) enum RefreshState {
    #[default]
    Idle,
    Refreshing {
        /// Credential generation the refresh started in.
        generation: u64,
        pending: PendingRefresh,
    },
}

impl RefreshState {
    pub(crate) fn is_refreshing(&self) -> bool {
        matches!(self, RefreshState::Refreshing { .. })
    }

    /// Return to Idle if the published refresh is the one started in `generation`.
    fn finish(&mut self, started_in: u64) {
        if matches!(self, RefreshState::Refreshing { generation, .. } if *generation == started_in) {
            *self = RefreshState::Idle;
        }
    }
}

impl fmt::Debug for RefreshState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshState::Idle => f.write_str("Idle"),
            RefreshState::Refreshing { generation, .. } => {
                f.debug_struct("Refreshing").field("generation", generation).finish()
            }
        }
    }
}

/// Response strategy that turns a qualifying 401 into refresh + replay.
pub struct RefreshCoordinator {
    session: Arc<Session>,
    pipeline: Arc<Pipeline>,
}

impl RefreshCoordinator {
    pub(crate) fn new(session: Arc<Session>, pipeline: Arc<Pipeline>) -> Self {
        Self { session, pipeline }
    }

    /// The failed descriptor, if this failure qualifies for refresh + replay.
    fn replayable<'e>(&self, error: &'e Error) -> Option<&'e Request> {
        let Error::Status { status, request, .. } = error else {
            return None;
        };
        if *status != StatusCode::UNAUTHORIZED {
            return None;
        }
        if request.is_retry() {
            debug!(path = request.path(), "replayed request rejected again, giving up");
            return None;
        }
        if self.session.lock().credentials.refresh_token().is_none() {
            debug!(path = request.path(), "401 without refresh token");
            return None;
        }
        Some(request)
    }

    /// Attach to the pending refresh, or start one if Idle.
    ///
    /// Check and publish happen under one lock with no suspension in between.
    fn pending(&self) -> Option<PendingRefresh> {
        let mut state = self.session.lock();
        if let RefreshState::Refreshing { pending, .. } = &state.refresh {
            metrics::record_coalesced();
            debug!("joining in-flight token refresh");
            return Some(pending.clone());
        }

        let refresh_token = Secret::new(state.credentials.refresh_token()?.to_owned());
        let generation = state.credentials.generation();
        let task = tokio::spawn(run_refresh(
            Arc::clone(&self.session),
            Arc::clone(&self.pipeline),
            refresh_token,
            generation,
        ));
        let session = Arc::downgrade(&self.session);
        let pending = join_refresh(task, session, generation).boxed().shared();
        state.refresh = RefreshState::Refreshing {
            generation,
            pending: pending.clone(),
        };
        Some(pending)
    }

    /// Refresh the credentials, sharing any refresh already in flight.
    ///
    /// Must be called from within a Tokio runtime: the refresh runs on a
    /// spawned task.
    pub async fn refresh(&self) -> RefreshOutcome {
        match self.pending() {
            Some(pending) => pending.await,
            None => RefreshOutcome::Failed,
        }
    }
}

impl ResponseStrategy for RefreshCoordinator {
    fn recover<'a>(&'a self, error: &'a Error) -> Pin<Box<dyn Future<Output = Recovery> + Send + 'a>> {
        Box::pin(async move {
            let Some(request) = self.replayable(error) else {
                return Recovery::Propagate;
            };
            match self.refresh().await {
                RefreshOutcome::Refreshed => {
                    metrics::record_replay();
                    debug!(path = request.path(), "replaying request with refreshed token");
                    Recovery::Replay(request.replay())
                }
                RefreshOutcome::Failed | RefreshOutcome::Superseded => Recovery::Propagate,
            }
        })
    }
}

async fn run_refresh(
    session: Arc<Session>,
    pipeline: Arc<Pipeline>,
    refresh_token: Secret<String>,
    generation: u64,
) -> RefreshOutcome {
    info!("access token rejected, refreshing");
    let result = token::refresh(&pipeline, refresh_token.expose()).await;
    let outcome = settle(&session, result, generation);
    metrics::record_refresh(outcome);
    outcome
}

/// Outcome of the spawned refresh task. A task that panicked still releases
/// its handle so the next 401 can start over.
async fn join_refresh(
    task: JoinHandle<RefreshOutcome>,
    session: Weak<Session>,
    generation: u64,
) -> RefreshOutcome {
    match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "token refresh task did not complete");
            if let Some(session) = session.upgrade() {
                session.lock().refresh.finish(generation);
            }
            metrics::record_refresh(RefreshOutcome::Failed);
            RefreshOutcome::Failed
        }
    }
}

/// Apply a finished refresh and return to Idle.
fn settle(session: &Session, result: Result<Credentials>, generation: u64) -> RefreshOutcome {
    let mut state = session.lock();
    state.refresh.finish(generation);
    match result {
        Ok(tokens) => {
            if state.credentials.rotate(tokens, generation) {
                info!("token refresh succeeded");
                RefreshOutcome::Refreshed
            } else {
                warn!("credentials changed during refresh, discarding refreshed tokens");
                RefreshOutcome::Superseded
            }
        }
        Err(e) => {
            warn!(error = %e, "token refresh failed");
            RefreshOutcome::Failed
        }
    }
}
