// Server loop module
// Accepts connections until shutdown is requested

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use super::AppState;

/// Accept connections on `listener` and serve them as local tasks.
///
/// Must run inside a `tokio::task::LocalSet`. Returns once `shutdown` is
/// notified; connections already accepted keep running in their own tasks.
pub async fn start_server_loop(listener: TcpListener, state: Arc<AppState>, shutdown: Arc<Notify>) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => tracing::error!("Failed to accept connection: {e}"),
                }
            }

            () = shutdown.notified() => {
                tracing::info!("Shutdown requested, no longer accepting connections");
                break;
            }
        }
    }
}
