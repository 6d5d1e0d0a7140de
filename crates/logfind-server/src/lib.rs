//! # logfind-server
//!
//! HTTP front end for exact-timestamp lookups over a log directory, built on
//! the axum HTTP framework and [`logfind_core`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use logfind_core::{EngineConfig, LogService};
//! use logfind_server::LogServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = Arc::new(LogService::open(&EngineConfig::new("/var/log/app"))?);
//!     let server = LogServer::new(Arc::clone(&service), 100);
//!
//!     let addr = "0.0.0.0:8080".parse()?;
//!     server
//!         .serve_with_shutdown(addr, async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!
//!     service.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/logs?timestamp=YYYY-MM-DDTHH:MM:SS.mmm` | GET | Line with exactly that timestamp |
//! | `/health` | GET | Liveness plus indexed file count |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use rate_limit::RateLimiter;
pub use server::LogServer;
pub use state::AppState;
