//! HTTP listener worker.
//!
//! # Responsibilities
//! - Bind the listener during startup, before any worker launches
//! - Serve health, status and metrics endpoints
//! - Stop accepting on cancellation, drain in-flight requests, then report
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A serve error still ends in a completion report

use std::net::SocketAddr;
use std::time::Duration;
use axum::{
    extract::State,
    http::{HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures_util::future::{BoxFuture, FutureExt};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::config::HttpConfig;
use crate::lifecycle::{CancellationHandle, CompletionReporter, LifecycleState, Worker};
use crate::observability::metrics;
use crate::services::health::HealthService;
use crate::services::ServiceError;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub health: HealthService,
    pub metrics: Option<PrometheusHandle>,
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub state: LifecycleState,
}

/// Generates a UUID v4 `x-request-id` for requests that lack one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

async fn health_handler(State(state): State<AppState>) -> Response {
    match state.health.check() {
        Ok(report) => {
            metrics::record_health_check(true);
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => {
            metrics::record_health_check(false);
            let body = serde_json::json!({
                "status": "unavailable",
                "reason": e.to_string(),
                "state": state.health.state(),
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

async fn status_handler(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        state: state.health.state(),
    })
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

/// HTTP server run under the supervisor.
pub struct HttpWorker {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
}

impl HttpWorker {
    /// Bind the configured address.
    pub async fn bind(config: &HttpConfig, state: AppState) -> Result<Self, ServiceError> {
        let bind_error = |source| ServiceError::Bind {
            address: config.bind_address.clone(),
            source,
        };

        let listener = TcpListener::bind(&config.bind_address).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        tracing::info!(address = %local_addr, "HTTP listener bound");

        Ok(Self {
            listener,
            router: build_router(state, Duration::from_secs(config.request_timeout_secs)),
            local_addr,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Worker for HttpWorker {
    fn name(&self) -> &str {
        "http"
    }

    fn start(self: Box<Self>, cancel: CancellationHandle, report: CompletionReporter) -> BoxFuture<'static, ()> {
        async move {
            let HttpWorker {
                listener,
                router,
                local_addr,
            } = *self;

            tracing::info!(address = %local_addr, "HTTP server starting");

            let shutdown = async move {
                cancel.cancelled().await;
                tracing::info!("HTTP server draining in-flight requests");
            };

            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!(error = %e, "HTTP server failed");
            }

            tracing::info!("HTTP server stopped");
            report.report();
        }
        .boxed()
    }
}
