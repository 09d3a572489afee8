use std::sync::Arc;

use clap::Parser;
use tokio::sync::Notify;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod metrics;
mod server;

use error::ServerError;

/// Receives container registry push webhooks, logs them and acknowledges
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file path, extension optional
    #[arg(short, long, default_value = "config")]
    config: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = config::Config::load_from(&cli.config)?;
    logger::init_tracing(&cfg).map_err(|e| -> Box<dyn std::error::Error> { e })?;

    // Handlers never block, a single-threaded event loop is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cfg)).map_err(|e| {
        tracing::error!("Server failed: {e}");
        e.into()
    })
}

async fn async_main(cfg: config::Config) -> Result<(), ServerError> {
    let addr = cfg.get_socket_addr()?;
    let listener =
        server::create_listener(addr).map_err(|source| ServerError::Bind { addr, source })?;

    let logger = Arc::new(logger::Logger::new(&cfg.logging)?);
    logger::log_server_start(&listener.local_addr()?, &cfg);
    let state = Arc::new(server::AppState::new(cfg, logger)?);

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));

    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(listener, state, shutdown))
        .await;

    tracing::info!("Webhook receiver stopped");
    Ok(())
}
