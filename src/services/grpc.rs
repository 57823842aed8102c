//! gRPC listener worker.
//!
//! # Responsibilities
//! - Bind the listener during startup, before any worker launches
//! - Serve the standard `grpc.health.v1.Health` service
//! - Flip health to `NOT_SERVING` on cancellation, drain calls, then report
//!
//! # Design Decisions
//! - The health service is generated by `tonic-health`, so no build step
//! - A serve error still ends in a completion report

use std::net::SocketAddr;
use futures_util::future::{BoxFuture, FutureExt};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic_health::ServingStatus;

use crate::config::GrpcConfig;
use crate::lifecycle::{CancellationHandle, CompletionReporter, Worker};
use crate::services::ServiceError;

/// Service name whose status covers the whole server.
pub const SERVER_HEALTH: &str = "";

/// gRPC server run under the supervisor.
#[derive(Debug)]
pub struct GrpcWorker {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl GrpcWorker {
    /// Bind the configured address.
    pub async fn bind(config: &GrpcConfig) -> Result<Self, ServiceError> {
        let bind_error = |source| ServiceError::Bind {
            address: config.bind_address.clone(),
            source,
        };

        let listener = TcpListener::bind(&config.bind_address).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        tracing::info!(address = %local_addr, "gRPC listener bound");
        Ok(Self { listener, local_addr })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Worker for GrpcWorker {
    fn name(&self) -> &str {
        "grpc"
    }

    fn start(self: Box<Self>, cancel: CancellationHandle, report: CompletionReporter) -> BoxFuture<'static, ()> {
        async move {
            let GrpcWorker { listener, local_addr } = *self;

            let (mut health, health_service) = tonic_health::server::health_reporter();
            health.set_service_status(SERVER_HEALTH, ServingStatus::Serving).await;

            tracing::info!(address = %local_addr, "gRPC server starting");

            let shutdown = async move {
                cancel.cancelled().await;
                health.set_service_status(SERVER_HEALTH, ServingStatus::NotServing).await;
                tracing::info!("gRPC server draining in-flight calls");
            };

            if let Err(e) = Server::builder()
                .add_service(health_service)
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
                .await
            {
                tracing::error!(error = %e, "gRPC server failed");
            }

            tracing::info!("gRPC server stopped");
            report.report();
        }
        .boxed()
    }
}
