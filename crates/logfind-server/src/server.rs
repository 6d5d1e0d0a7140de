//! HTTP server lifecycle.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use logfind_core::LogService;
use tokio::net::TcpListener;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::routes::create_router;
use crate::state::AppState;

/// HTTP front end over a [`LogService`].
#[derive(Debug, Clone)]
pub struct LogServer {
    state: Arc<AppState>,
}

impl LogServer {
    /// Creates a server around `service`, accepting `rate_limit` requests
    /// per second.
    #[must_use]
    pub fn new(service: Arc<LogService>, rate_limit: u32) -> Self {
        Self {
            state: Arc::new(AppState::new(service, rate_limit)),
        }
    }

    /// Get the shared state.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Serves until `shutdown` completes, then drains in-flight requests.
    ///
    /// The service itself is left open; closing it is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails or the server stops abnormally.
    pub async fn serve_with_shutdown<F>(&self, addr: SocketAddr, shutdown: F) -> ApiResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::BindFailed(addr, e))?;

        self.serve_listener(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the server stops abnormally.
    pub async fn serve_listener<F>(&self, listener: TcpListener, shutdown: F) -> ApiResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        info!(addr = %addr, "log server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        info!("log server shut down");
        Ok(())
    }

    /// Create the router without starting the server.
    pub fn router(&self) -> axum::Router {
        create_router(Arc::clone(&self.state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logfind_core::{EngineConfig, LogRepository};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    fn make_test_server(dir: &TempDir) -> LogServer {
        fs::write(
            dir.path().join("app.log"),
            "2023-01-01T00:00:00.000 line1\n2023-01-01T00:00:01.000 line2\n",
        )
        .expect("write log");
        let repo = LogRepository::new(&EngineConfig::new(dir.path())).expect("repository");
        let service = LogService::new(Arc::new(repo), Duration::from_secs(60));
        LogServer::new(Arc::new(service), 100)
    }

    #[test]
    fn test_server_clone_shares_state() {
        let dir = TempDir::new().expect("tempdir");
        let server = make_test_server(&dir);
        let cloned = server.clone();

        assert!(Arc::ptr_eq(&server.state(), &cloned.state()));
    }

    #[tokio::test]
    async fn test_bind_failure() {
        let dir = TempDir::new().expect("tempdir");
        let server = make_test_server(&dir);
        let taken = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = taken.local_addr().expect("addr");

        let result = server.serve_with_shutdown(addr, async {}).await;

        assert!(matches!(result, Err(ApiError::BindFailed(a, _)) if a == addr));
    }

    #[tokio::test]
    async fn test_serves_and_shuts_down() {
        let dir = TempDir::new().expect("tempdir");
        let server = make_test_server(&dir);
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            server
                .serve_listener(listener, async {
                    let _ = stop_rx.await;
                })
                .await
        });

        let mut stream = TcpStream::connect(addr).await.expect("connect");
        stream
            .write_all(
                b"GET /logs?timestamp=2023-01-01T00:00:01.000 HTTP/1.1\r\n\
                  Host: localhost\r\nConnection: close\r\n\r\n",
            )
            .await
            .expect("write request");
        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .await
            .expect("read response");

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("line2"));

        stop_tx.send(()).expect("signal shutdown");
        let result = handle.await.expect("join");
        assert!(result.is_ok());
    }
}
