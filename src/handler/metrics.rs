// Prometheus scrape endpoint

use std::sync::Arc;

use super::{Handler, RequestContext};
use crate::error::HandlerError;
use crate::http::{self, HttpResponse};
use crate::metrics::HttpMetrics;

pub struct MetricsHandler {
    metrics: Arc<HttpMetrics>,
}

impl MetricsHandler {
    pub const fn new(metrics: Arc<HttpMetrics>) -> Self {
        Self { metrics }
    }
}

impl Handler for MetricsHandler {
    fn handle(&self, _req: &RequestContext) -> Result<HttpResponse, HandlerError> {
        let (body, content_type) = self.metrics.render()?;
        Ok(http::build_metrics_response(body, &content_type))
    }
}
