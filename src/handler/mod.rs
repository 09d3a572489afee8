//! Request handler module
//!
//! Handlers are plain synchronous functions of an already-read request.
//! The router owns the (method, path) table and wraps every registered
//! handler in request metrics.

mod health;
mod metrics;
pub mod router;
mod webhook;

use hyper::body::Bytes;
use hyper::{HeaderMap, Method};

use crate::error::HandlerError;
use crate::http::HttpResponse;

pub use health::HealthHandler;
pub use metrics::MetricsHandler;
pub use router::{build_router, Router};
pub use webhook::WebhookHandler;

/// A fully read request, local to a single exchange
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
            body,
        }
    }
}

pub trait Handler: Send + Sync {
    fn handle(&self, req: &RequestContext) -> Result<HttpResponse, HandlerError>;
}
