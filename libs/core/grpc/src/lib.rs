//! # gRPC Support Library
//!
//! Shared tonic plumbing for the service binaries:
//!
//! - [`error`]: server bootstrap errors and `Result` → `tonic::Status` helpers
//! - [`interceptors`]: request-id propagation for log correlation
//! - `server` (feature `server`): env-driven [`server::ServerConfig`], health
//!   reporting and startup logging
//!
//! ## Quick Start
//!
//! ```ignore
//! use core_config::FromEnv;
//! use grpc_client::interceptors::RequestIdInterceptor;
//! use grpc_client::server::{GrpcServer, ServerConfig};
//! use tonic::service::interceptor::InterceptedService;
//!
//! let config = ServerConfig::from_env()?;
//! let (health_reporter, health_service) = GrpcServer::health_service();
//! GrpcServer::setup_health_multiple(&health_reporter, &[SERVICE_NAME]).await;
//!
//! tonic::transport::Server::builder()
//!     .add_service(health_service)
//!     .add_service(InterceptedService::new(my_server, RequestIdInterceptor::new()))
//!     .serve(config.socket_addr()?)
//!     .await?;
//! ```

pub mod error;
pub mod interceptors;
#[cfg(feature = "server")]
pub mod server;

pub use error::{GrpcError, GrpcResult, ToTonicResult};
pub use interceptors::{REQUEST_ID_HEADER, RequestId, RequestIdInterceptor};
