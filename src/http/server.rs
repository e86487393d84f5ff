//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the backend client from the timeout config
//! - Activate the relay from the activation mapping
//! - Mount the relay in front of the default pass-through handler
//! - Wire up middleware (request ID, tracing)
//! - Serve until shutdown, cancelling open streams on the way out
//!
//! # Design Decisions
//! - A relay that fails activation is logged and skipped; the host still serves
//! - No request timeout layer: relayed streams are unbounded

use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{StatusCode, Uri},
    middleware::{self, Next},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::{HostConfig, TimeoutConfig, HANDLER_NAME};
use crate::http::request::{propagate_request_id_layer, request_span, set_request_id_layer};
use crate::observability::{SharedLogger, TracingLogger};
use crate::relay::{Dispatch, SseRelay};

/// HTTP server hosting the relay.
pub struct HttpServer {
    router: Router,
    relay: Option<SseRelay>,
}

impl HttpServer {
    /// Create the server, activating the relay from `config.extra_config`.
    ///
    /// `cancel` is the parent of every relay session's cancellation token.
    pub fn new(config: &HostConfig, cancel: CancellationToken) -> Result<Self, reqwest::Error> {
        let client = backend_client(&config.timeouts)?;
        let logger: SharedLogger = Arc::new(TracingLogger);

        let relay = match SseRelay::activate(&config.extra_config, client, logger, cancel) {
            Ok(relay) => {
                let relay = relay.with_max_line(config.limits.max_line_bytes);
                tracing::info!(
                    handler = HANDLER_NAME,
                    endpoint = %relay.route().endpoint,
                    backend_host = %relay.route().backend_host,
                    "Relay activated"
                );
                Some(relay)
            }
            Err(e) => {
                tracing::error!(
                    handler = HANDLER_NAME,
                    error = %e,
                    "Relay not activated, passing every request through"
                );
                None
            }
        };

        Ok(Self::with_relay(relay))
    }

    /// Create the server around an already built relay (or none).
    pub fn with_relay(relay: Option<SseRelay>) -> Self {
        let app = Router::new().fallback(pass_through);
        let app = match &relay {
            Some(relay) => mount(app, relay.clone()),
            None => app,
        };
        let router = app
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(set_request_id_layer());

        Self { router, relay }
    }

    pub fn relay(&self) -> Option<&SseRelay> {
        self.relay.as_ref()
    }

    /// The assembled router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Put the relay in front of `app`.
///
/// Requests the relay does not own reach `app` unchanged.
pub fn mount(app: Router, relay: SseRelay) -> Router {
    app.layer(middleware::from_fn_with_state(relay, relay_middleware))
}

/// Outbound client shared by all sessions.
pub fn backend_client(timeouts: &TimeoutConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .build()
}

async fn relay_middleware(State(relay): State<SseRelay>, request: Request, next: Next) -> Response {
    match relay.handle(request).await {
        Dispatch::Relayed(response) => response,
        Dispatch::PassThrough(request) => next.run(request).await,
    }
}

/// Default handler for requests nobody owns.
async fn pass_through(uri: Uri) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("no handler for {}", uri.path()))
}
