//! Quay push webhook
//!
//! Decodes the body when it is declared as JSON, logs the event and
//! acknowledges it. Nothing is validated, stored or forwarded.

use std::sync::Arc;

use hyper::header::CONTENT_TYPE;
use serde_json::Value;

use super::{Handler, RequestContext};
use crate::error::HandlerError;
use crate::http::{self, HttpResponse};
use crate::logger::Logger;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Body of one webhook request.
///
/// `None` means the request was not declared as JSON and the body was never
/// looked at; it is distinct from an empty JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookPayload(Option<Value>);

impl WebhookPayload {
    /// Parse the body if `Content-Type` starts with `application/json`.
    ///
    /// A declared-JSON body that fails to parse (including an empty one) is
    /// an error; there is no size or schema check.
    pub fn from_request(req: &RequestContext) -> Result<Self, HandlerError> {
        let declared_json = req
            .headers
            .get(CONTENT_TYPE)
            .is_some_and(|ct| ct.as_bytes().starts_with(JSON_CONTENT_TYPE.as_bytes()));

        if declared_json {
            Ok(Self(Some(serde_json::from_slice(&req.body)?)))
        } else {
            Ok(Self(None))
        }
    }

    pub const fn json(&self) -> Option<&Value> {
        self.0.as_ref()
    }
}

pub struct WebhookHandler {
    logger: Arc<Logger>,
}

impl WebhookHandler {
    pub const fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

impl Handler for WebhookHandler {
    fn handle(&self, req: &RequestContext) -> Result<HttpResponse, HandlerError> {
        let payload = WebhookPayload::from_request(req)?;
        self.logger.log_push_event(payload.json());
        Ok(http::build_status_ok_response())
    }
}
