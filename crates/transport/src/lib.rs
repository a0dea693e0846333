//! Transport capability for the bearer-auth client
//!
//! Defines the `Transport` trait that decouples authentication logic from the
//! HTTP stack. The auth client only needs three things from a transport:
//! send a `Request` descriptor, get back a `Response` with a status and body,
//! or fail with a transport-level `Error`.
//!
//! Any HTTP status, including 4xx/5xx, is a successful `send` at this layer.
//! Deciding what a 401 means is the caller's job.

pub mod error;
pub mod http;
pub mod request;
pub mod response;

pub use error::{Error, Result};
pub use http::HttpTransport;
pub use request::Request;
pub use response::Response;

use std::future::Future;
use std::pin::Pin;

/// Abstraction over the HTTP stack used to dispatch request descriptors.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    /// Dispatch one request descriptor and return the raw response.
    ///
    /// Implementations must not retry and must not inspect the status code.
    fn send<'a>(
        &'a self,
        request: &'a Request,
    ) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>>;
}
