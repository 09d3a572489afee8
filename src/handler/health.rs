// Liveness/readiness endpoint for the cluster orchestrator.
// Always healthy: no dependency is checked.

use super::{Handler, RequestContext};
use crate::error::HandlerError;
use crate::http::{self, HttpResponse};

pub struct HealthHandler;

impl Handler for HealthHandler {
    fn handle(&self, _req: &RequestContext) -> Result<HttpResponse, HandlerError> {
        Ok(http::build_status_ok_response())
    }
}
