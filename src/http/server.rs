//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Run the filter chain on every request head
//! - Resolve the route and backend, forward upstream
//! - Swap the runtime atomically when a new config arrives
//!
//! # Design Decisions
//! - Handlers read one `Arc<GatewayRuntime>` snapshot per request, so a reload
//!   never mixes an old route table with a new filter chain
//! - Listener address and timeouts are fixed at startup; reloads cover auth,
//!   routes and backends

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{AuthenticationFilter, FilterError};
use crate::config::GatewayConfig;
use crate::http::chain::{FilterChain, Outcome};
use crate::http::forward::{self, HttpClient};
use crate::http::request::GatewayRequest;
use crate::http::response;
use crate::load_balancer::BackendManager;
use crate::observability::metrics;
use crate::routing::RouteTable;

const X_REQUEST_ID: &str = "x-request-id";

/// Everything a request needs, compiled from one config.
#[derive(Debug)]
pub struct GatewayRuntime {
    pub chain: FilterChain,
    pub routes: RouteTable,
    pub backends: BackendManager,
}

impl GatewayRuntime {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, FilterError> {
        let auth = AuthenticationFilter::from_config(&config.auth)?;
        Ok(Self {
            chain: FilterChain::new(vec![Box::new(auth)]),
            routes: RouteTable::from_config(&config.routes),
            backends: BackendManager::new(&config.backends, config.load_balancing.strategy),
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<ArcSwap<GatewayRuntime>>,
    pub client: HttpClient,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, FilterError> {
        let runtime = GatewayRuntime::from_config(&config)?;
        let state = AppState {
            runtime: Arc::new(ArcSwap::from_pointee(runtime)),
            client: forward::build_client(Duration::from_secs(config.timeouts.connect_secs)),
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            state,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "request",
                request_id = %request_id,
                method = %request.method(),
                path = %request.uri().path(),
            )
        });

        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(trace)
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::REQUEST_TIMEOUT,
                        Duration::from_secs(config.timeouts.request_secs),
                    )),
            )
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the live runtime.
    pub fn runtime(&self) -> Arc<ArcSwap<GatewayRuntime>> {
        self.state.runtime.clone()
    }

    /// Run the server until `shutdown` fires, applying configs from `config_updates`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.config.routes.len(),
            "HTTP server starting"
        );

        let runtime = self.state.runtime.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                apply_config(&runtime, &config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Compile `config` and swap it in. A config that fails to compile leaves the
/// current runtime serving.
pub fn apply_config(runtime: &ArcSwap<GatewayRuntime>, config: &GatewayConfig) -> bool {
    match GatewayRuntime::from_config(config) {
        Ok(next) => {
            runtime.store(Arc::new(next));
            tracing::info!(routes = config.routes.len(), "Configuration reloaded");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Rejected configuration reload, keeping current runtime");
            false
        }
    }
}

/// Main gateway handler.
/// Runs the filter chain, resolves the route, selects a backend and forwards.
/// Authentication runs before routing, so a protected path under an unknown
/// service answers 401 rather than 404.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let runtime = state.runtime.load_full();

    let (parts, body) = request.into_parts();
    let method = parts.method.to_string();
    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    // 1. Filter chain
    let forwarded = match runtime.chain.process(GatewayRequest::from_parts(&parts)) {
        Outcome::Forward(request) => request,
        Outcome::Reject(rejection) => {
            tracing::warn!(
                request_id = %request_id,
                path = %parts.uri.path(),
                reason = %rejection,
                "Request rejected"
            );
            metrics::record_auth_rejection(rejection.as_str());
            metrics::record_request(&method, rejection.status().as_u16(), "none", start_time);
            return rejection.into_response();
        }
    };

    // 2. Match route
    let Some(route) = runtime.routes.resolve(forwarded.inbound_path()) else {
        tracing::warn!(request_id = %request_id, path = %forwarded.inbound_path(), "No route matched");
        metrics::record_request(&method, 404, "none", start_time);
        return response::empty(StatusCode::NOT_FOUND);
    };

    // 3. Select backend
    let Some(backend) = runtime.backends.get(&route.backend) else {
        tracing::warn!(request_id = %request_id, service = %route.backend, "No available backend");
        metrics::record_request(&method, 503, &route.backend, start_time);
        return response::empty(StatusCode::SERVICE_UNAVAILABLE);
    };
    let backend_addr = backend.addr.to_string();

    tracing::debug!(
        request_id = %request_id,
        route = %route.name,
        backend = %backend_addr,
        path = %forwarded.path(),
        "Forwarding request"
    );

    // 4. Forward; the backend guard rides along in the response body
    match forward::send(&state.client, backend, forwarded, body).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), &backend_addr, start_time);
            response
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, backend = %backend_addr, error = %e, "Upstream error");
            metrics::record_request(&method, 502, &backend_addr, start_time);
            response::empty(StatusCode::BAD_GATEWAY)
        }
    }
}
