//! Error types
//!
//! One enum per failure domain: configuration loading, request handling and
//! server startup. Request errors know how to render themselves as JSON.

use std::net::{AddrParseError, SocketAddr};

use hyper::StatusCode;
use thiserror::Error;

use crate::http::{self, HttpResponse};

/// Configuration could not be loaded or failed validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A handler failed to produce its normal response
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Body declared `application/json` but did not parse
    #[error("invalid JSON payload")]
    InvalidJson(#[from] serde_json::Error),

    #[error("failed to render metrics")]
    Metrics(#[from] prometheus::Error),
}

impl HandlerError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_) | Self::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render as a JSON error envelope.
    ///
    /// The underlying cause is only included when `expose_detail` is set
    /// (the `server.debug` flag).
    pub fn to_response(&self, expose_detail: bool) -> HttpResponse {
        let detail = if expose_detail {
            match self {
                Self::InvalidJson(e) => Some(e.to_string()),
                Self::Metrics(e) => Some(e.to_string()),
            }
        } else {
            None
        };
        http::build_error_response(self.status_code(), &self.to_string(), detail.as_deref())
    }
}

/// Fatal errors raised while bringing the server up
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid listen address '{addr}': {source}")]
    Address {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to set up metrics registry: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
