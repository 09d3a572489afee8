//! Request routing dispatch module
//!
//! Explicit `(method, path)` routing table. Every handler registered through
//! [`Router::route`] is wrapped in [`Instrumented`] when the router carries a
//! metrics registry, so counting and timing are applied uniformly.

use std::sync::Arc;

use hyper::Method;

use super::{Handler, HealthHandler, MetricsHandler, RequestContext, WebhookHandler};
use crate::config::Config;
use crate::error::HandlerError;
use crate::http::{self, HttpResponse};
use crate::logger::Logger;
use crate::metrics::HttpMetrics;

struct Route {
    method: Method,
    path: String,
    handler: Box<dyn Handler>,
}

pub struct Router {
    routes: Vec<Route>,
    metrics: Option<Arc<HttpMetrics>>,
    expose_error_detail: bool,
}

impl Router {
    pub const fn new(metrics: Option<Arc<HttpMetrics>>) -> Self {
        Self {
            routes: Vec::new(),
            metrics,
            expose_error_detail: false,
        }
    }

    /// Include the underlying cause in 500 responses
    #[must_use]
    pub const fn expose_error_detail(mut self, expose: bool) -> Self {
        self.expose_error_detail = expose;
        self
    }

    /// Register `handler` for `method` on the exact `path`
    #[must_use]
    pub fn route(mut self, method: Method, path: &str, handler: impl Handler + 'static) -> Self {
        let handler: Box<dyn Handler> = match &self.metrics {
            Some(metrics) => Box::new(Instrumented {
                inner: handler,
                metrics: Arc::clone(metrics),
                label: path.to_string(),
            }),
            None => Box::new(handler),
        };
        self.routes.push(Route {
            method,
            path: path.to_string(),
            handler,
        });
        self
    }

    /// Dispatch a request. Unknown paths get 404, known paths with an
    /// unregistered method get 405, handler failures become JSON errors.
    ///
    /// The method is matched before any handler runs, so the webhook body is
    /// only parsed for `POST`: `GET` on the webhook path is a 405 even when it
    /// carries an invalid JSON body.
    pub fn dispatch(&self, req: &RequestContext) -> HttpResponse {
        let mut path_matched = false;
        for route in self.routes.iter().filter(|r| r.path == req.path) {
            path_matched = true;
            if route.method == req.method {
                return route.handler.handle(req).unwrap_or_else(|e| {
                    tracing::error!(path = %req.path, error = ?e, "Request failed");
                    e.to_response(self.expose_error_detail)
                });
            }
        }

        if path_matched {
            tracing::warn!("Method not allowed: {} {}", req.method, req.path);
            http::build_405_response(&self.allowed_methods(&req.path))
        } else {
            tracing::debug!("No route for {} {}", req.method, req.path);
            http::build_404_response()
        }
    }

    fn allowed_methods(&self, path: &str) -> String {
        self.routes
            .iter()
            .filter(|r| r.path == path)
            .map(|r| r.method.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Counts, times and tracks in-flight requests for the wrapped handler
struct Instrumented<H> {
    inner: H,
    metrics: Arc<HttpMetrics>,
    label: String,
}

impl<H: Handler> Handler for Instrumented<H> {
    fn handle(&self, req: &RequestContext) -> Result<HttpResponse, HandlerError> {
        let timer = self.metrics.track(&self.label, &req.method);
        let result = self.inner.handle(req);
        let status = match &result {
            Ok(resp) => resp.status(),
            Err(e) => e.status_code(),
        };
        timer.finish(status);
        result
    }
}

/// Build the receiver's routing table from configuration
pub fn build_router(
    config: &Config,
    logger: Arc<Logger>,
    metrics: Option<Arc<HttpMetrics>>,
) -> Router {
    let router = Router::new(metrics.clone())
        .expose_error_detail(config.server.debug)
        .route(Method::POST, &config.routes.webhook_path, WebhookHandler::new(logger))
        .route(Method::GET, &config.routes.health_path, HealthHandler);

    match metrics {
        Some(metrics) => router.route(
            Method::GET,
            &config.routes.metrics_path,
            MetricsHandler::new(metrics),
        ),
        None => router,
    }
}
