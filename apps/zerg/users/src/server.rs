//! gRPC server initialization and lifecycle management
//!
//! Startup order:
//! 1. color-eyre and tracing (JSON for prod, pretty for dev)
//! 2. gRPC, database and digest configuration from the environment
//! 3. Postgres connection with retry, migrations, `SELECT 1` probe
//! 4. Domain services and their gRPC adapters
//! 5. Health reporting, then serve until SIGINT/SIGTERM

use std::future::Future;
use std::sync::Arc;

use core_config::{Environment, FromEnv};
use database::postgres::{self, PostgresConfig};
use domain_users::{
    AuthenticationService, AuthorizationService, CredentialDigest, DigestConfig,
    PgUnitOfWorkFactory, PgUserQueryService, UnitOfWorkFactory, UserQueryService, UserService,
};
use eyre::{Result, WrapErr};
use grpc_client::RequestIdInterceptor;
use grpc_client::server::{GrpcServer, ServerConfig};
use migration::Migrator;
use rpc::users::{
    authentication_service_server::{self, AuthenticationServiceServer},
    authorization_service_server::{self, AuthorizationServiceServer},
    user_service_server::{self, UserServiceServer},
};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::codec::CompressionEncoding;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::Server;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::service::{AuthenticationGrpc, AuthorizationGrpc, UsersGrpc};

const SERVICES: [&str; 3] = [
    user_service_server::SERVICE_NAME,
    authentication_service_server::SERVICE_NAME,
    authorization_service_server::SERVICE_NAME,
];

/// Run the users service against Postgres until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if configuration is missing or malformed, the database is
/// unreachable after retries, migrations fail, or the server cannot bind.
pub async fn run() -> Result<()> {
    core_config::tracing::install_color_eyre();
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    let server_config =
        ServerConfig::from_env().wrap_err("Failed to load gRPC server configuration")?;
    let db_config = PostgresConfig::from_env().wrap_err("Failed to load database configuration")?;
    let digest = DigestConfig::from_env()
        .wrap_err("Failed to load credential digest configuration")?
        .into_digest();

    info!("Connecting to database...");
    let db = postgres::connect_from_config_with_retry(&db_config, None)
        .await
        .wrap_err("Failed to connect to database")?;

    if db_config.run_migrations {
        postgres::run_migrations::<Migrator>(&db, "zerg_users")
            .await
            .wrap_err("Failed to run database migrations")?;
    }

    let latency = postgres::check_health(&db)
        .await
        .wrap_err("Database health check failed")?;
    info!(latency_ms = latency.as_millis() as u64, "Database reachable");

    let addr = server_config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("Failed to bind {}", addr))?;

    serve(
        listener,
        &server_config,
        PgUnitOfWorkFactory::new(db.clone()),
        PgUserQueryService::new(db),
        digest,
        shutdown_signal(),
    )
    .await
}

/// Serve the three user services plus `grpc.health.v1.Health` on `listener`.
///
/// Storage is injected so tests can run the full stack over the in-memory
/// store. When `shutdown` resolves, every service is marked NOT_SERVING and
/// in-flight calls are drained.
pub async fn serve<F, Q, D>(
    listener: TcpListener,
    config: &ServerConfig,
    factory: F,
    query: Q,
    digest: D,
    shutdown: impl Future<Output = ()> + Send,
) -> Result<()>
where
    F: UnitOfWorkFactory + 'static,
    Q: UserQueryService + 'static,
    D: CredentialDigest + 'static,
{
    let query = Arc::new(query);
    let digest = Arc::new(digest);

    let authn = AuthenticationGrpc::new(AuthenticationService::new(
        Arc::clone(&query),
        Arc::clone(&digest),
    ));
    let authz = AuthorizationGrpc::new(AuthorizationService::new(query));
    let users = UsersGrpc::new(
        UserService::from_arc(Arc::new(factory), digest),
        authn.clone(),
        authz.clone(),
    );

    let (health_reporter, health_service) = GrpcServer::health_service();
    GrpcServer::setup_health_multiple(&health_reporter, &SERVICES).await;
    GrpcServer::log_startup_multiple(config, &SERVICES);

    let mut users = UserServiceServer::new(users)
        .max_decoding_message_size(config.max_decoding_message_size)
        .max_encoding_message_size(config.max_encoding_message_size);
    let mut authn = AuthenticationServiceServer::new(authn)
        .max_decoding_message_size(config.max_decoding_message_size)
        .max_encoding_message_size(config.max_encoding_message_size);
    let mut authz = AuthorizationServiceServer::new(authz)
        .max_decoding_message_size(config.max_decoding_message_size)
        .max_encoding_message_size(config.max_encoding_message_size);

    if config.enable_compression {
        users = users
            .accept_compressed(CompressionEncoding::Zstd)
            .send_compressed(CompressionEncoding::Zstd);
        authn = authn
            .accept_compressed(CompressionEncoding::Zstd)
            .send_compressed(CompressionEncoding::Zstd);
        authz = authz
            .accept_compressed(CompressionEncoding::Zstd)
            .send_compressed(CompressionEncoding::Zstd);
    }

    let drain = async move {
        shutdown.await;
        GrpcServer::mark_not_serving(&health_reporter, &SERVICES).await;
        info!("Draining in-flight requests");
    };

    Server::builder()
        .http2_keepalive_interval(Some(config.keepalive))
        .layer(TraceLayer::new_for_grpc())
        .add_service(health_service)
        .add_service(InterceptedService::new(users, RequestIdInterceptor::new()))
        .add_service(InterceptedService::new(authn, RequestIdInterceptor::new()))
        .add_service(InterceptedService::new(authz, RequestIdInterceptor::new()))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), drain)
        .await
        .wrap_err("gRPC server failed")?;

    info!("Users service stopped");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating shutdown..."),
    }
}
