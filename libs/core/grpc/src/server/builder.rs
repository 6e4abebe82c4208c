use super::config::ServerConfig;
use tonic_health::ServingStatus;
use tonic_health::pb::health_server::{Health, HealthServer};
use tonic_health::server::HealthReporter;
use tracing::info;

/// Helpers shared by the gRPC binaries.
///
/// # Example
///
/// ```ignore
/// let (health_reporter, health_service) = GrpcServer::health_service();
/// GrpcServer::setup_health_multiple(&health_reporter, &[USERS, AUTHN]).await;
/// GrpcServer::log_startup_multiple(&config, &[USERS, AUTHN]);
/// ```
pub struct GrpcServer;

impl GrpcServer {
    /// Create the `grpc.health.v1.Health` service and its reporter.
    pub fn health_service() -> (HealthReporter, HealthServer<impl Health>) {
        tonic_health::server::health_reporter()
    }

    pub fn log_startup_multiple(config: &ServerConfig, service_names: &[&str]) {
        info!(
            addr = %config.addr_string(),
            services = ?service_names,
            compression = config.enable_compression,
            max_message_size = config.max_decoding_message_size,
            "gRPC server starting"
        );
    }

    /// Mark every service, plus the empty name used by k8s probes, as serving.
    pub async fn setup_health_multiple(health_reporter: &HealthReporter, service_names: &[&str]) {
        Self::set_status(health_reporter, service_names, ServingStatus::Serving).await;
        info!(services = ?service_names, "Services marked as serving");
    }

    /// Flip every service to NOT_SERVING so probes fail while draining.
    pub async fn mark_not_serving(health_reporter: &HealthReporter, service_names: &[&str]) {
        Self::set_status(health_reporter, service_names, ServingStatus::NotServing).await;
        info!(services = ?service_names, "Services marked as not serving");
    }

    async fn set_status(
        health_reporter: &HealthReporter,
        service_names: &[&str],
        status: ServingStatus,
    ) {
        for service_name in service_names {
            health_reporter
                .set_service_status(*service_name, status)
                .await;
        }
        health_reporter.set_service_status("", status).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_setup_and_drain_health() {
        let (reporter, _service) = GrpcServer::health_service();

        GrpcServer::setup_health_multiple(&reporter, &["users.v1.UserService"]).await;
        GrpcServer::mark_not_serving(&reporter, &["users.v1.UserService"]).await;
    }

    #[test]
    fn test_log_startup_does_not_panic() {
        GrpcServer::log_startup_multiple(&ServerConfig::default(), &["a", "b"]);
    }
}
