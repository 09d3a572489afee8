// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown (orchestrator stop)
// - SIGINT:  Graceful shutdown (Ctrl+C)

use std::sync::Arc;
use tokio::sync::Notify;

/// Start signal handlers (Unix)
///
/// Spawns a background task that notifies `shutdown` once on SIGTERM or
/// SIGINT.
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::error!("Failed to register signal handlers: {e}");
                    return;
                }
            };

        tracing::debug!("Signal handlers registered, pid {}", std::process::id());

        tokio::select! {
            _ = sigterm.recv() => tracing::info!("[SIGNAL] SIGTERM received, shutting down"),
            _ = sigint.recv() => tracing::info!("[SIGNAL] SIGINT received (Ctrl+C), shutting down"),
        }

        // notify_one stores a permit if the loop is not waiting right now
        shutdown.notify_one();
    });
}

/// Non-Unix fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("[SIGNAL] Ctrl+C received, shutting down");
                shutdown.notify_one();
            }
            Err(e) => tracing::error!("Failed to register Ctrl+C handler: {e}"),
        }
    });
}
