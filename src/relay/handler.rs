//! Request dispatch for the relay.
//!
//! # Responsibilities
//! - Decide whether a request belongs to the relay
//! - Issue the backend GET
//! - Hand the connected backend body to a [`RelaySession`]
//!
//! # Design Decisions
//! - Requests the relay does not own are returned untouched to the caller
//! - Connect failures produce one 502 before any stream header is sent
//! - Every session gets a child of the relay's cancellation token

use std::io;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::http::Request;
use axum::response::Response;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

use crate::config::{validate, ConfigError, ExtraConfig, RouteConfig, HANDLER_NAME};
use crate::http::response;
use crate::observability::{metrics, SharedLogger};
use crate::relay::error::RelayError;
use crate::relay::session::{CloseReason, RelaySession, MAX_LINE_BYTES};
use crate::routing::{resolve, RouteMatch};

/// Plain-text body of the 502 sent when the backend cannot be reached.
pub const BACKEND_UNREACHABLE: &str = "failed to connect to downstream SSE server";

/// Backend body as a line-readable byte stream.
pub type BackendBody = StreamReader<BoxStream<'static, io::Result<Bytes>>, Bytes>;

/// What the relay decided to do with a request.
#[derive(Debug)]
pub enum Dispatch {
    /// The relay owns the request; send this response.
    Relayed(Response),
    /// Not ours; the request is handed back unchanged.
    PassThrough(Request<Body>),
}

/// The relay handler. Cheap to clone; all clones share one immutable route.
#[derive(Clone)]
pub struct SseRelay {
    inner: Arc<Inner>,
    max_line: u64,
}

struct Inner {
    route: RouteConfig,
    client: reqwest::Client,
    logger: SharedLogger,
    cancel: CancellationToken,
}

impl SseRelay {
    /// Build a relay around an already validated route.
    pub fn new(
        route: RouteConfig,
        client: reqwest::Client,
        logger: SharedLogger,
        cancel: CancellationToken,
    ) -> Self {
        logger.debug(format_args!("[{}] Logger loaded", HANDLER_NAME));
        logger.debug(format_args!(
            "{} is now hijacking the endpoint {}",
            HANDLER_NAME, route.endpoint
        ));

        Self {
            inner: Arc::new(Inner {
                route,
                client,
                logger,
                cancel,
            }),
            max_line: MAX_LINE_BYTES,
        }
    }

    /// Set the longest backend line a session accepts.
    pub fn with_max_line(mut self, max_line: u64) -> Self {
        self.max_line = max_line;
        self
    }

    /// Validate the activation mapping and build the relay.
    pub fn activate(
        extra: &ExtraConfig,
        client: reqwest::Client,
        logger: SharedLogger,
        cancel: CancellationToken,
    ) -> Result<Self, ConfigError> {
        let route = validate(extra)?;
        Ok(Self::new(route, client, logger, cancel))
    }

    pub fn route(&self) -> &RouteConfig {
        &self.inner.route
    }

    /// Relay the request if its path matches the endpoint template.
    pub async fn handle(&self, request: Request<Body>) -> Dispatch {
        match resolve(&self.inner.route, request.uri().path()) {
            RouteMatch::NoMatch => {
                self.inner.logger.debug(format_args!(
                    "{} {} no match",
                    self.inner.route.endpoint,
                    request.uri().path()
                ));
                Dispatch::PassThrough(request)
            }
            RouteMatch::Owned {
                variable,
                backend_url,
            } => {
                drop(request);
                self.inner.logger.debug(format_args!(
                    "{} matched with id {:?}",
                    self.inner.route.endpoint, variable
                ));
                Dispatch::Relayed(self.relay(&backend_url).await)
            }
        }
    }

    /// Connect to `backend_url` and stream its body back line by line.
    ///
    /// Cancellation is observed while waiting for the backend's response
    /// headers too; a cancelled connect is answered like a failed one.
    pub async fn relay(&self, backend_url: &str) -> Response {
        let started = Instant::now();
        let cancel = self.inner.cancel.child_token();
        self.inner
            .logger
            .debug(format_args!("server URL {}", backend_url));

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            sent = self.inner.client.get(backend_url).send() => Some(sent),
        };

        let upstream = match sent {
            None => {
                self.inner.logger.info(format_args!(
                    "relay to {} cancelled while connecting",
                    backend_url
                ));
                metrics::record_outcome(CloseReason::Cancelled.as_str(), started);
                return response::bad_gateway(BACKEND_UNREACHABLE);
            }
            Some(Ok(upstream)) => upstream,
            Some(Err(source)) => {
                let err = RelayError::BackendUnreachable {
                    url: backend_url.to_string(),
                    source,
                };
                self.inner.logger.critical(format_args!("{}", err));
                metrics::record_outcome(CloseReason::ConnectError.as_str(), started);
                return response::bad_gateway(BACKEND_UNREACHABLE);
            }
        };

        let status = upstream.status();
        if !status.is_success() {
            self.inner.logger.warning(format_args!(
                "backend {} answered {}, relaying body anyway",
                backend_url, status
            ));
        }

        let body: BoxStream<'static, io::Result<Bytes>> =
            upstream.bytes_stream().map_err(io::Error::other).boxed();
        let session = RelaySession::new(
            backend_url,
            StreamReader::new(body),
            cancel,
            self.inner.logger.clone(),
        )
        .with_max_line(self.max_line);

        response::event_stream(Body::from_stream(session.into_stream()))
    }
}
