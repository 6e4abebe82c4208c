//! gRPC server bootstrap: env-driven config, health reporting and
//! startup logging.

mod builder;
mod config;

pub use builder::GrpcServer;
pub use config::ServerConfig;
