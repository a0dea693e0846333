//! Authenticated client: login, logout and pass-through calls
//!
//! `AuthClient` owns the session (credentials + refresh state), the request
//! pipeline and the refresh coordinator. Callers never see a recoverable 401:
//! they get either the payload or the final failure. Token refreshes run on
//! spawned tasks, so the client must be driven by a Tokio runtime.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info};
use transport::{Request, Response, Transport};

use crate::constants::USERS_PATH;
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::interceptor::{BearerTransform, Recovery, RequestTransform, ResponseStrategy};
use crate::pipeline::Pipeline;
use crate::refresh::RefreshCoordinator;
use crate::session::Session;
use crate::token;

/// Characters of an undecodable payload kept in the error message.
const DECODE_EXCERPT: usize = 64;

/// Builder for [`AuthClient`].
pub struct AuthClientBuilder {
    transport: Arc<dyn Transport>,
    credentials: Option<Credentials>,
    transforms: Vec<Arc<dyn RequestTransform>>,
}

impl AuthClientBuilder {
    /// Start with a previously issued token pair instead of logged out.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Append a request transform. Transforms run in insertion order, before
    /// the bearer token is stamped.
    #[must_use]
    pub fn transform(mut self, transform: impl RequestTransform + 'static) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    pub fn build(self) -> AuthClient {
        let session = Arc::new(Session::new(self.credentials));
        let mut transforms = self.transforms;
        transforms.push(Arc::new(BearerTransform::new(Arc::clone(&session))));
        let pipeline = Arc::new(Pipeline::new(transforms, self.transport));
        let strategy: Arc<dyn ResponseStrategy> = Arc::new(RefreshCoordinator::new(
            Arc::clone(&session),
            Arc::clone(&pipeline),
        ));
        AuthClient {
            session,
            pipeline,
            strategy,
        }
    }
}

/// HTTP client that stamps bearer tokens and refreshes them on 401.
pub struct AuthClient {
    session: Arc<Session>,
    pipeline: Arc<Pipeline>,
    strategy: Arc<dyn ResponseStrategy>,
}

impl AuthClient {
    /// Logged-out client with no extra transforms.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::builder(transport).build()
    }

    pub fn builder(transport: Arc<dyn Transport>) -> AuthClientBuilder {
        AuthClientBuilder {
            transport,
            credentials: None,
            transforms: Vec::new(),
        }
    }

    /// Log in and store the issued token pair.
    ///
    /// On any failure the error is returned unchanged and the previous
    /// credentials (if any) are kept. A 401 here is never refreshed.
    pub async fn login(&self, login: &str, password: &str) -> Result<()> {
        let tokens = token::login(&self.pipeline, login, password).await?;
        self.session.lock().sign_in(tokens);
        info!(login, "logged in");
        Ok(())
    }

    /// Forget both tokens. No network call.
    pub fn logout(&self) {
        self.session.lock().sign_out();
        info!("logged out");
    }

    /// Send a request, refreshing and replaying once on a qualifying 401.
    pub async fn send(&self, request: Request) -> Result<Response> {
        let mut request = request;
        loop {
            let error = match self.pipeline.dispatch(&request).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };
            match self.strategy.recover(&error).await {
                Recovery::Propagate => return Err(error),
                Recovery::Replay(replay) => request = replay,
            }
        }
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(Request::get(path)).await?;
        debug!(path, bytes = response.body().len(), "decoding response");
        response.json().map_err(|e| {
            let body: String = response.text().chars().take(DECODE_EXCERPT).collect();
            Error::Decode(format!("invalid body from {path}: {e} (body: {body:?})"))
        })
    }

    pub async fn get_users(&self) -> Result<serde_json::Value> {
        self.get_json(USERS_PATH).await
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.lock().credentials.access_token().is_some()
    }

    /// Whether a refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.session.lock().refresh.is_refreshing()
    }

    /// Snapshot of the current token pair, e.g. for persisting a session.
    pub fn credentials(&self) -> Option<Credentials> {
        self.session.lock().credentials.snapshot()
    }
}
