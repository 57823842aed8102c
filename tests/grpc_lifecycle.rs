//! gRPC worker under a running supervisor.

use std::time::Duration;
use service_supervisor::config::SupervisorConfig;
use service_supervisor::lifecycle::{startup, Interrupt, LifecycleState, ManualInterrupts};
use service_supervisor::ShutdownOutcome;
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_client::HealthClient;
use tonic_health::pb::HealthCheckRequest;

#[tokio::test]
async fn test_grpc_health_then_graceful_shutdown() {
    let mut config = SupervisorConfig::default();
    config.http.enabled = false;
    config.grpc.bind_address = "127.0.0.1:0".into();
    config.scheduler.enabled = false;
    config.observability.metrics_enabled = false;
    config.lifecycle.grace_window_ms = 2000;

    let boot = startup::assemble(&config, None).await.unwrap();
    let addr = boot.grpc_addr.expect("grpc enabled");
    let (source, interrupts) = ManualInterrupts::new();
    let supervisor = boot.supervisor.with_interrupts(Box::new(source));
    let mut state = supervisor.state();

    let run = tokio::spawn(supervisor.run());
    state.wait_for(|s| *s == LifecycleState::Running).await.unwrap();

    let mut client = tonic::transport::Endpoint::new(format!("http://{addr}"))
        .unwrap()
        .connect()
        .await
        .map(HealthClient::new)
        .expect("server unreachable");
    let response = client
        .check(HealthCheckRequest {
            service: String::new(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.status, ServingStatus::Serving as i32);
    drop(client);

    assert!(interrupts.send(Interrupt::Interrupt));
    let report = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("supervisor did not stop")
        .unwrap()
        .unwrap();
    assert_eq!(report.outcome, ShutdownOutcome::GracefulExit);
    assert!(report.abandoned.is_empty());

    let after = tonic::transport::Endpoint::new(format!("http://{addr}"))
        .unwrap()
        .connect()
        .await
        .map(HealthClient::new);
    assert!(after.is_err(), "listener should be closed after shutdown");
}
