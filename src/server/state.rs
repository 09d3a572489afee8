// Application state module
// Everything a connection needs, built once at startup

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::config::Config;
use crate::error::ServerError;
use crate::handler::{build_router, Router};
use crate::logger::Logger;
use crate::metrics::HttpMetrics;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Routing table; owns the metrics registry when metrics are enabled
    pub router: Router,
    pub logger: Arc<Logger>,
    pub active_connections: AtomicUsize,
}

impl AppState {
    pub fn new(config: Config, logger: Arc<Logger>) -> Result<Self, ServerError> {
        let metrics = if config.metrics.enabled {
            Some(Arc::new(HttpMetrics::new(&config.metrics.prefix)?))
        } else {
            None
        };
        let router = build_router(&config, Arc::clone(&logger), metrics);

        Ok(Self {
            config,
            router,
            logger,
            active_connections: AtomicUsize::new(0),
        })
    }
}
