//! reqwest-backed transport
//!
//! Resolves descriptor paths against a base URL, forwards headers and the
//! JSON body verbatim, and buffers the whole response body. No retries, no
//! status interpretation.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::{Request, Response, Transport};

/// Transport that sends descriptors to `base_url` with a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport with its own connection pool and a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("building HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing reqwest client (and its connection pool).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

fn map_send_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else if e.is_builder() {
        Error::InvalidUrl(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

impl Transport for HttpTransport {
    #[instrument(skip_all, fields(method = %request.method(), path = %request.path()))]
    fn send<'a>(
        &'a self,
        request: &'a Request,
    ) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>> {
        Box::pin(async move {
            let url = self.url_for(request.path());
            let mut builder = self
                .client
                .request(request.method().clone(), url.as_str())
                .headers(request.headers().clone());
            if let Some(body) = request.body() {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(map_send_error)?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .bytes()
                .await
                .map_err(|e| Error::Body(e.to_string()))?;

            debug!(status = status.as_u16(), bytes = body.len(), "received response");
            Ok(Response::new(status, body).with_headers(headers))
        })
    }
}
