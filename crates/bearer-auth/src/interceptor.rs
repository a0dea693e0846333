//! Request transforms and the response strategy seam
//!
//! A client holds an ordered list of `RequestTransform`s, applied to every
//! descriptor right before dispatch, and exactly one `ResponseStrategy`,
//! consulted whenever a dispatch fails.

use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use serde::Deserialize;
use tracing::warn;
use transport::Request;

use crate::constants::BEARER_SCHEME;
use crate::error::{Error, Result};
use crate::session::Session;

/// Synchronous, deterministic rewrite of an outgoing descriptor.
///
/// Receives the pipeline's own copy; the caller's descriptor is never touched.
/// An error aborts the dispatch and reaches the caller unchanged.
pub trait RequestTransform: Send + Sync {
    /// Identifier for logging
    fn name(&self) -> &str;

    fn apply(&self, request: Request) -> Result<Request>;
}

/// What to do after a failed dispatch.
#[derive(Debug)]
pub enum Recovery {
    /// Hand the failure to the caller as-is.
    Propagate,
    /// Dispatch this descriptor through the full pipeline instead.
    Replay(Request),
}

/// Post-dispatch observer deciding between propagation and replay.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn ResponseStrategy>`).
pub trait ResponseStrategy: Send + Sync {
    fn recover<'a>(&'a self, error: &'a Error) -> Pin<Box<dyn Future<Output = Recovery> + Send + 'a>>;
}

/// Stamps `Authorization: Bearer <token>` from the session's current access token.
pub(crate) struct BearerTransform {
    session: Arc<Session>,
}

impl BearerTransform {
    pub(crate) fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

impl RequestTransform for BearerTransform {
    fn name(&self) -> &str {
        "bearer"
    }

    fn apply(&self, request: Request) -> Result<Request> {
        let value = {
            let state = self.session.lock();
            match state.credentials.access_token() {
                Some(token) => bearer_value(token)?,
                None => return Ok(request),
            }
        };
        Ok(request.with_header(AUTHORIZATION, value))
    }
}

fn bearer_value(token: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("{BEARER_SCHEME} {token}"))
        .map_err(|e| Error::InvalidHeader(format!("access token is not a valid header value: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Header injection rule (name + value pair from config).
#[derive(Debug, Clone, Deserialize)]
pub struct HeaderInjection {
    pub name: String,
    pub value: String,
}

/// Static header injection. Never touches `Authorization`.
///
/// Rules are validated once at construction; invalid names or values are
/// skipped with a warning.
#[derive(Debug, Clone)]
pub struct StaticHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl StaticHeaders {
    pub fn new(injections: &[HeaderInjection]) -> Self {
        let mut headers = Vec::with_capacity(injections.len());
        for injection in injections {
            let name = match HeaderName::from_str(&injection.name) {
                Ok(n) => n,
                Err(e) => {
                    warn!(header = %injection.name, error = %e, "skipping invalid header name");
                    continue;
                }
            };
            if name == AUTHORIZATION {
                warn!(header = %injection.name, "refusing to inject authorization header");
                continue;
            }
            let value = match HeaderValue::from_str(&injection.value) {
                Ok(v) => v,
                Err(e) => {
                    warn!(header = %injection.name, error = %e, "skipping invalid header value");
                    continue;
                }
            };
            headers.push((name, value));
        }
        Self { headers }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl RequestTransform for StaticHeaders {
    fn name(&self) -> &str {
        "static-headers"
    }

    fn apply(&self, request: Request) -> Result<Request> {
        Ok(self
            .headers
            .iter()
            .fold(request, |request, (name, value)| {
                request.with_header(name.clone(), value.clone())
            }))
    }
}
