//! In-memory transport for unit tests

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use transport::{Request, Response, Transport};

type Handler = Box<dyn Fn(Request) -> BoxFuture<'static, transport::Result<Response>> + Send + Sync>;

/// Transport that records every stamped request and answers via a closure.
pub(crate) struct MockTransport {
    handler: Handler,
    history: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub(crate) fn new<F, Fut>(handler: F) -> Arc<Self>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = transport::Result<Response>> + Send + 'static,
    {
        Arc::new(Self {
            handler: Box::new(move |request| handler(request).boxed()),
            history: Mutex::new(Vec::new()),
        })
    }

    /// Every request sent so far, in dispatch order.
    pub(crate) fn history(&self) -> Vec<Request> {
        self.history.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, path: &str) -> Vec<Request> {
        self.history()
            .into_iter()
            .filter(|r| r.path() == path)
            .collect()
    }
}

impl Transport for MockTransport {
    fn send<'a>(
        &'a self,
        request: &'a Request,
    ) -> Pin<Box<dyn Future<Output = transport::Result<Response>> + Send + 'a>> {
        self.history.lock().unwrap().push(request.clone());
        (self.handler)(request.clone())
    }
}

pub(crate) fn json_response(status: u16, body: serde_json::Value) -> Response {
    let status = StatusCode::from_u16(status).unwrap();
    Response::from_json(status, &body)
}

/// `Authorization` header of a recorded request, if any.
pub(crate) fn authorization(request: &Request) -> Option<String> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}
