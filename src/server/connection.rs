// Connection handling module
// Accepts a single TCP connection and serves its requests

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::BodyExt;
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, StatusCode};
use hyper_util::rt::TokioIo;

use super::AppState;
use crate::handler::RequestContext;
use crate::http::{self, HttpResponse};
use crate::logger::AccessLogEntry;

/// Accept and process a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
) {
    // Increment counter first, then check limit
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            state.active_connections.fetch_sub(1, Ordering::SeqCst);
            state.logger.log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    state.logger.log_connection_accepted(&peer_addr);
    handle_connection(stream, peer_addr, Arc::clone(state));
}

/// Handle a single connection in a local task.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 keep-alive
/// 3. Serves the connection with the router
/// 4. Applies the read/write timeout to the connection
/// 5. Decrements the connection counter when done
fn handle_connection(stream: tokio::net::TcpStream, peer_addr: SocketAddr, state: Arc<AppState>) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let timeout_duration = std::time::Duration::from_secs(std::cmp::max(
            performance.read_timeout,
            performance.write_timeout,
        ));

        let mut builder = http1::Builder::new();
        builder.keep_alive(performance.keep_alive_timeout > 0);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&service_state);
                async move { Ok::<_, Infallible>(serve_request(req, peer_addr, &state).await) }
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => state.logger.log_connection_error(&err),
            Err(_) => {
                state.logger.log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }

        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Read the whole body, dispatch through the router and write the access log
async fn serve_request(
    req: Request<Incoming>,
    peer_addr: SocketAddr,
    state: &AppState,
) -> HttpResponse {
    let start = Instant::now();
    let (parts, body) = req.into_parts();

    let mut entry = state
        .logger
        .access_log_enabled()
        .then(|| AccessLogEntry::from_request(peer_addr, &parts));

    let response = match body.collect().await {
        Ok(collected) => {
            let ctx = RequestContext::new(
                parts.method,
                parts.uri.path(),
                parts.headers,
                collected.to_bytes(),
            );
            state.router.dispatch(&ctx)
        }
        Err(e) => {
            state
                .logger
                .log_warning(&format!("Failed to read request body from {peer_addr}: {e}"));
            http::build_error_response(StatusCode::BAD_REQUEST, "failed to read request body", None)
        }
    };

    if let Some(entry) = entry.as_mut() {
        let body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.complete(
            response.status().as_u16(),
            usize::try_from(body_bytes).unwrap_or(usize::MAX),
            start.elapsed(),
        );
        state.logger.log_access(entry);
    }

    response
}
