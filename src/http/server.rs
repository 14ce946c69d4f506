//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the vault handler on every path
//! - Wire up middleware (tracing, limits, request ID, cache control)
//! - Bind server to listener
//! - Dispatch requests to the gatekeeper

use axum::{
    body::Body,
    extract::{ConnectInfo, Query, State},
    http::{header, HeaderValue, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::VaultConfig;
use crate::entitlements::EntitlementTable;
use crate::http::gatekeeper::Gatekeeper;
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;
use crate::security::{AddressResolver, RawHeaderSet};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gatekeeper: Arc<Gatekeeper>,
}

/// Query parameters understood by the vault.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct VaultQuery {
    pub keyname: Option<String>,
    pub testaddr: Option<String>,
}

impl VaultQuery {
    /// The first occurrence of each parameter wins; unknown names are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (name, value) in pairs {
            let slot = match name.as_str() {
                "keyname" => &mut query.keyname,
                "testaddr" => &mut query.testaddr,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// HTTP server for the vault.
pub struct VaultServer {
    router: Router,
    config: VaultConfig,
}

impl VaultServer {
    /// Create a new HTTP server serving the given table.
    pub fn new(config: VaultConfig, table: Arc<EntitlementTable>) -> Self {
        let resolver = AddressResolver::standard(config.access.allow_test_addr);
        let state = AppState {
            gatekeeper: Arc::new(Gatekeeper::new(table, resolver)),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &VaultConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/", any(vault_handler))
            .route("/{*path}", any(vault_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        let router = if config.security.no_store {
            router.layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            ))
        } else {
            router
        };

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until Ctrl+C or SIGTERM.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run the server until `signal` completes.
    pub async fn run_until<F>(self, listener: TcpListener, signal: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }
}

/// Main vault handler.
/// Resolves the client address and answers from the entitlement table.
async fn vault_handler(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let query = VaultQuery::from_pairs(pairs);

    // Absent when the router is driven without a socket (tests)
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let raw = RawHeaderSet::from_request_parts(
        request.headers(),
        remote_addr,
        query.testaddr.as_deref(),
    );

    let verdict = state
        .gatekeeper
        .handle(request.method(), query.keyname.as_deref(), &raw);

    tracing::debug!(
        request_id = %request_id(&request),
        method = %request.method(),
        path = %request.uri().path(),
        status = verdict.decision.status().as_u16(),
        "Request decided"
    );
    metrics::record_decision(verdict.decision.outcome(), start_time);

    verdict.into_response()
}
