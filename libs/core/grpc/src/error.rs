use std::fmt::Display;
use thiserror::Error;

pub type GrpcResult<T> = Result<T, GrpcError>;

/// Errors raised while configuring or starting a gRPC server
#[derive(Error, Debug)]
pub enum GrpcError {
    /// Environment configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] core_config::ConfigError),

    /// Host/port do not form a socket address
    #[error("Invalid bind address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// The transport failed to bind or serve
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

impl From<GrpcError> for tonic::Status {
    fn from(err: GrpcError) -> Self {
        match err {
            GrpcError::Config(_) | GrpcError::InvalidAddress { .. } => {
                tonic::Status::invalid_argument(err.to_string())
            }
            GrpcError::Transport(_) => tonic::Status::unavailable(err.to_string()),
        }
    }
}

// ============================================================================
// Generic Error Conversion Traits
// ============================================================================

/// Extension trait turning any displayable error into a `tonic::Status`.
///
/// # Example
/// ```ignore
/// use grpc_client::ToTonicResult;
///
/// let id: Uuid = raw.parse::<Uuid>().to_tonic()?;
/// let user = repo.find(id).await.to_tonic_with_code(tonic::Code::NotFound)?;
/// ```
pub trait ToTonicResult<T> {
    /// Convert the error to a status with INVALID_ARGUMENT code
    fn to_tonic(self) -> Result<T, tonic::Status>;

    /// Convert the error to a status with `code`, keeping its message
    fn to_tonic_with_code(self, code: tonic::Code) -> Result<T, tonic::Status>;
}

impl<T, E: Display> ToTonicResult<T> for Result<T, E> {
    fn to_tonic(self) -> Result<T, tonic::Status> {
        self.to_tonic_with_code(tonic::Code::InvalidArgument)
    }

    fn to_tonic_with_code(self, code: tonic::Code) -> Result<T, tonic::Status> {
        self.map_err(|e| tonic::Status::new(code, e.to_string()))
    }
}
