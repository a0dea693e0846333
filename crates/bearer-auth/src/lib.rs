//! Bearer-token client with coalesced refresh
//!
//! Wraps any `transport::Transport` so that every outgoing request carries
//! `Authorization: Bearer <token>` while a token is held, and a 401 response
//! is recovered by one shared refresh followed by a single replay.
//!
//! Request flow:
//! 1. `AuthClient::send()` hands the descriptor to the pipeline
//! 2. Request transforms run in order (static headers, then bearer token)
//! 3. The transport sends it; non-2xx becomes `Error::Status`
//! 4. `RefreshCoordinator` decides: propagate, or refresh and replay once
//! 5. Concurrent 401s attach to the same pending refresh (single-flight)

pub mod client;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod interceptor;
pub mod metrics;
mod pipeline;
pub mod refresh;
mod session;
mod token;

#[cfg(test)]
mod test_support;

pub use client::{AuthClient, AuthClientBuilder};
pub use constants::*;
pub use credentials::Credentials;
pub use error::{Error, Result};
pub use interceptor::{HeaderInjection, Recovery, RequestTransform, ResponseStrategy, StaticHeaders};
pub use refresh::{RefreshCoordinator, RefreshOutcome};
