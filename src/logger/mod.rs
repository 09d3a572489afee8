//! Logger module
//!
//! Two independent streams:
//! - the access log, one line per request, written by [`Logger`] to stdout
//!   or a file in the configured format
//! - the application log, `tracing` events rendered to stderr by the
//!   subscriber installed in [`init_tracing`]
//!
//! A [`Logger`] is built once at startup and handed to every component that
//! logs; it lives for the whole process.

mod format;
mod writer;

pub use format::AccessLogEntry;
use writer::LogWriter;

use std::net::SocketAddr;

use serde_json::Value;
use tracing::{debug, info, Span};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, LoggingConfig};

/// Install the global `tracing` subscriber for the application log.
///
/// `RUST_LOG` wins over the configured level. Should be called once at
/// application startup.
pub fn init_tracing(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(config.log_filter()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
}

/// Logging context shared by the server and handlers
pub struct Logger {
    access: Option<AccessLog>,
    span: Span,
}

struct AccessLog {
    writer: LogWriter,
    format: String,
}

impl Logger {
    pub fn new(config: &LoggingConfig) -> std::io::Result<Self> {
        let access = if config.access_log {
            Some(AccessLog {
                writer: LogWriter::new(config.access_log_file.as_deref())?,
                format: config.access_log_format.clone(),
            })
        } else {
            None
        };

        Ok(Self {
            access,
            span: tracing::info_span!("webhook_receiver"),
        })
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.access.is_some()
    }

    /// Log formatted access log entry
    pub fn log_access(&self, entry: &AccessLogEntry) {
        if let Some(access) = &self.access {
            access.writer.write_line(&entry.format(&access.format));
        }
    }

    /// Receipt of a registry push: notice at INFO, the payload at DEBUG
    pub fn log_push_event(&self, payload: Option<&Value>) {
        let _entered = self.span.enter();
        info!("got a push event from quay");
        match payload {
            Some(value) => debug!(payload = %value, "push event payload"),
            None => debug!(payload = "None", "push event payload"),
        }
    }

    pub fn log_connection_accepted(&self, peer_addr: &SocketAddr) {
        let _entered = self.span.enter();
        debug!("[Connection] Accepted from: {peer_addr}");
    }

    pub fn log_connection_error(&self, err: &impl std::fmt::Display) {
        let _entered = self.span.enter();
        tracing::error!("Failed to serve connection: {err}");
    }

    pub fn log_warning(&self, message: &str) {
        let _entered = self.span.enter();
        tracing::warn!("{message}");
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    info!("Webhook receiver v{} started", env!("CARGO_PKG_VERSION"));
    info!("Listening on: http://{addr}");
    let metrics_path = if config.metrics.enabled {
        config.routes.metrics_path.as_str()
    } else {
        "disabled"
    };
    info!(
        webhook = %config.routes.webhook_path,
        health = %config.routes.health_path,
        metrics = %metrics_path,
        "Routes registered"
    );
    info!("Log filter: {}", config.log_filter());
    if config.server.debug {
        tracing::warn!("Debug mode enabled: error details are included in responses");
    }
    match &config.logging.access_log_file {
        Some(path) if config.logging.access_log => info!("Access log: {path}"),
        _ if config.logging.access_log => info!("Access log: stdout"),
        _ => info!("Access log: disabled"),
    }
    if let Some(max) = config.performance.max_connections {
        info!("Max connections: {max}");
    }
}
