//! Web layer
//!
//! Routes:
//!
//! - `POST /clear`: drop every cached preview
//! - `GET /health`: liveness and cache counters
//! - anything else: `/{width}/{height}/{origin}` previews, any method

use anyhow::Result;
use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::services::PreviewService;

pub mod handlers;
pub mod middleware;
pub mod responses;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub preview: Arc<PreviewService>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(preview: Arc<PreviewService>) -> Self {
        Self {
            preview,
            started_at: chrono::Utc::now(),
        }
    }
}

/// Build the application router
pub fn create_router(state: AppState, max_request_body: usize) -> Router {
    Router::new()
        .route("/clear", post(handlers::cache::clear_cache))
        .route("/health", get(handlers::health::health_check))
        .fallback(handlers::preview::preview)
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_logging_middleware))
                .layer(RequestBodyLimitLayer::new(max_request_body)),
        )
        .with_state(state)
}

pub struct WebServer {
    app: Router,
    addr: SocketAddr,
    shutdown_timeout: Duration,
}

impl WebServer {
    pub fn new(config: &Config, state: AppState) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;
        let app = create_router(state, config.web.max_request_body);

        Ok(Self {
            app,
            addr,
            shutdown_timeout: config.web.shutdown_timeout()?,
        })
    }

    /// Serve until `cancellation_token` fires, then give in-flight requests
    /// `shutdown_timeout` to finish before dropping them
    pub async fn serve_with_cancellation(
        self,
        ready_signal: tokio::sync::oneshot::Sender<Result<SocketAddr>>,
        cancellation_token: CancellationToken,
    ) -> Result<()> {
        let listener = match tokio::net::TcpListener::bind(&self.addr).await {
            Ok(listener) => listener,
            Err(bind_error) => {
                let bind_err_msg = format!("Failed to bind to {}: {}", self.addr, bind_error);
                let _ = ready_signal.send(Err(anyhow::anyhow!("{}", bind_err_msg)));
                return Err(anyhow::anyhow!("{}", bind_err_msg));
            }
        };

        // Signal that we're now actually listening on the port
        let local_addr = listener.local_addr()?;
        let _ = ready_signal.send(Ok(local_addr));

        let serve = axum::serve(
            listener,
            self.app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(cancellation_token.clone().cancelled_owned());
        let mut server = tokio::spawn(serve.into_future());

        tokio::select! {
            result = &mut server => {
                result??;
                return Ok(());
            }
            _ = cancellation_token.cancelled() => {
                info!(
                    "Web server received cancellation signal, \
                     waiting up to {} for in-flight requests",
                    humantime::format_duration(self.shutdown_timeout)
                );
            }
        }

        match tokio::time::timeout(self.shutdown_timeout, &mut server).await {
            Ok(result) => {
                result??;
                info!("Web server shut down gracefully");
            }
            Err(_) => {
                warn!("In-flight requests did not finish in time, forcing shutdown");
                server.abort();
            }
        }

        Ok(())
    }
}
