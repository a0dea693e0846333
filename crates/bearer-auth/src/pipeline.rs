//! Request transforms + transport, without any recovery logic

use std::sync::Arc;

use tracing::{debug, instrument, warn};
use transport::{Request, Response, Transport};

use crate::error::{Error, Result};
use crate::interceptor::RequestTransform;

/// Ordered request transforms in front of a transport.
///
/// `dispatch` sends exactly one request. Non-2xx responses come back as
/// `Error::Status` carrying the caller's unstamped descriptor.
pub(crate) struct Pipeline {
    transforms: Vec<Arc<dyn RequestTransform>>,
    transport: Arc<dyn Transport>,
}

impl Pipeline {
    pub(crate) fn new(transforms: Vec<Arc<dyn RequestTransform>>, transport: Arc<dyn Transport>) -> Self {
        Self {
            transforms,
            transport,
        }
    }

    #[instrument(skip_all, fields(method = %request.method(), path = %request.path(), retry = request.is_retry()))]
    pub(crate) async fn dispatch(&self, request: &Request) -> Result<Response> {
        let mut outgoing = request.clone();
        for transform in &self.transforms {
            outgoing = transform.apply(outgoing).inspect_err(|e| {
                warn!(transform = transform.name(), error = %e, "request transform failed");
            })?;
        }

        let response = self.transport.send(&outgoing).await?;
        if response.is_success() {
            return Ok(response);
        }

        debug!(status = response.status().as_u16(), "request failed");
        Err(Error::Status {
            status: response.status(),
            body: response.body().clone(),
            request: Box::new(request.clone()),
        })
    }
}
