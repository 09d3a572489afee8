//! HTTP response building module
//!
//! Provides builders for the handful of responses the receiver sends.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

/// Response type produced by every handler
pub type HttpResponse = Response<Full<Bytes>>;

/// Acknowledgement body for webhook and health requests
pub const STATUS_OK_BODY: &str = r#"{"status": "ok"}"#;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Build a JSON response from an already serialized body
pub fn build_json_response(status: StatusCode, body: impl Into<Bytes>) -> HttpResponse {
    let body = body.into();
    Response::builder()
        .status(status)
        .header("Content-Type", JSON_CONTENT_TYPE)
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(body))
        })
}

/// Build 200 `{"status": "ok"}` response
pub fn build_status_ok_response() -> HttpResponse {
    build_json_response(StatusCode::OK, STATUS_OK_BODY)
}

/// Build JSON error envelope: `{"status": "error", "error": ..., "detail": ...}`
pub fn build_error_response(status: StatusCode, message: &str, detail: Option<&str>) -> HttpResponse {
    let mut body = serde_json::json!({
        "status": "error",
        "error": message,
    });
    if let Some(detail) = detail {
        body["detail"] = serde_json::Value::from(detail);
    }
    build_json_response(status, body.to_string())
}

/// Build 404 Not Found response
pub fn build_404_response() -> HttpResponse {
    build_error_response(StatusCode::NOT_FOUND, "not found", None)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: &str) -> HttpResponse {
    let mut resp = build_error_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed", None);
    match allow.parse() {
        Ok(value) => {
            resp.headers_mut().insert("Allow", value);
        }
        Err(e) => tracing::error!("Invalid Allow header value '{allow}': {e}"),
    }
    resp
}

/// Build Prometheus text exposition response
pub fn build_metrics_response(body: Vec<u8>, content_type: &str) -> HttpResponse {
    let body = Bytes::from(body);
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error("metrics", &e);
            Response::new(Full::new(body))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    tracing::error!("Failed to build {status} response: {error}");
}
