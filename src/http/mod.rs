//! HTTP protocol layer module
//!
//! Response builders shared by the handlers and the router. Every body the
//! service emits is JSON except the metrics exposition.

pub mod response;

// Re-export commonly used types
pub use response::{
    build_404_response, build_405_response, build_error_response, build_metrics_response,
    build_status_ok_response, HttpResponse,
};
