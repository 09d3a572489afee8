// Server module entry
// Listener setup, connection handling, the accept loop and signal handling

pub mod connection;
pub mod listener;
pub mod signal;
mod state;

// Rust does not allow `loop` as a module name (keyword), use server_loop
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_listener;
pub use server_loop::start_server_loop;
pub use signal::start_signal_handler;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::logger::Logger;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::{Method, Request, StatusCode};
    use hyper_util::rt::TokioIo;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn test_state(overrides: &[(&str, &str)]) -> Arc<AppState> {
        let env = overrides
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let mut config = Config::load_with_env("/nonexistent/config", Some(env)).unwrap();
        config.logging.access_log = false;
        let logger = Arc::new(Logger::new(&config.logging).unwrap());
        Arc::new(AppState::new(config, logger).unwrap())
    }

    async fn send(
        addr: SocketAddr,
        method: Method,
        path: &str,
        content_type: Option<&str>,
        body: &'static str,
    ) -> (StatusCode, String) {
        let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .unwrap();
        tokio::task::spawn_local(conn);

        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", addr.to_string());
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        let req = builder.body(Full::new(Bytes::from(body))).unwrap();

        let resp = sender.send_request(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    /// Runs `f` against a live server on an ephemeral port, then shuts it down
    async fn with_server<F, Fut>(state: Arc<AppState>, f: F)
    where
        F: FnOnce(SocketAddr) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
                let addr = listener.local_addr().unwrap();
                let shutdown = Arc::new(Notify::new());
                let server =
                    tokio::task::spawn_local(start_server_loop(listener, state, Arc::clone(&shutdown)));

                f(addr).await;

                shutdown.notify_one();
                server.await.unwrap();
            })
            .await;
    }

    #[tokio::test]
    async fn test_end_to_end_quay_push() {
        with_server(test_state(&[]), |addr| async move {
            let (status, body) = send(
                addr,
                Method::POST,
                "/quay",
                Some("application/json"),
                r#"{"repository":"foo/bar","tag":"latest"}"#,
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, r#"{"status": "ok"}"#);

            let (status, body) = send(addr, Method::POST, "/quay", None, "").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, r#"{"status": "ok"}"#);

            let (status, body) = send(addr, Method::POST, "/quay", Some("text/plain"), "not-json").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, r#"{"status": "ok"}"#);

            let (status, body) =
                send(addr, Method::POST, "/quay", Some("application/json"), "not-json").await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            let envelope: serde_json::Value = serde_json::from_str(&body).unwrap();
            assert_eq!(envelope["status"], "error");
        })
        .await;
    }

    #[tokio::test]
    async fn test_end_to_end_health_and_metrics() {
        with_server(test_state(&[]), |addr| async move {
            for _ in 0..2 {
                let (status, body) = send(addr, Method::GET, "/_healthz", None, "").await;
                assert_eq!(status, StatusCode::OK);
                assert_eq!(body, r#"{"status": "ok"}"#);
            }
            send(addr, Method::POST, "/quay", Some("application/json"), "{}").await;

            let (status, first) = send(addr, Method::GET, "/metrics", None, "").await;
            assert_eq!(status, StatusCode::OK);
            assert!(first.contains(
                r#"webhook_receiver_http_requests_total{handler="/_healthz",method="GET",status="200"} 2"#
            ));
            assert!(first.contains(
                r#"webhook_receiver_http_requests_total{handler="/quay",method="POST",status="200"} 1"#
            ));

            // the scrape itself is counted, so the next one sees it
            let (_, second) = send(addr, Method::GET, "/metrics", None, "").await;
            assert!(second.contains(
                r#"webhook_receiver_http_requests_total{handler="/metrics",method="GET",status="200"} 1"#
            ));

            let (status, _) = send(addr, Method::GET, "/quay", None, "").await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            let (status, _) = send(addr, Method::GET, "/missing", None, "").await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        })
        .await;
    }

    #[tokio::test]
    async fn test_custom_paths_from_config() {
        let state = test_state(&[
            ("WEBHOOK_ROUTES__WEBHOOK_PATH", "/hooks/quay"),
            ("WEBHOOK_METRICS__ENABLED", "false"),
        ]);
        with_server(state, |addr| async move {
            let (status, _) = send(addr, Method::POST, "/hooks/quay", None, "").await;
            assert_eq!(status, StatusCode::OK);
            let (status, _) = send(addr, Method::POST, "/quay", None, "").await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            let (status, _) = send(addr, Method::GET, "/metrics", None, "").await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        })
        .await;
    }

    #[tokio::test]
    async fn test_connections_released_after_close() {
        let state = test_state(&[("WEBHOOK_PERFORMANCE__MAX_CONNECTIONS", "1")]);
        let counter_state = Arc::clone(&state);
        with_server(state, |addr| async move {
            // sequential requests each open and close their own connection
            for _ in 0..3 {
                let (status, _) = send(addr, Method::GET, "/_healthz", None, "").await;
                assert_eq!(status, StatusCode::OK);
                for _ in 0..50 {
                    if counter_state
                        .active_connections
                        .load(std::sync::atomic::Ordering::SeqCst)
                        == 0
                    {
                        break;
                    }
                    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                }
                assert_eq!(
                    counter_state
                        .active_connections
                        .load(std::sync::atomic::Ordering::SeqCst),
                    0
                );
            }
        })
        .await;
    }
}
