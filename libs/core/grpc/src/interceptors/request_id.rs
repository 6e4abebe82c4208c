use tonic::metadata::MetadataValue;
use tonic::{Request, Status};

/// Metadata key carrying the correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id attached to each request's extensions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Read the id the interceptor stored on `request`
    pub fn of<T>(request: &Request<T>) -> Option<&str> {
        request
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.as_str())
    }
}

/// Server-side interceptor for log correlation
///
/// Keeps a caller-supplied `x-request-id` when it is valid ASCII, otherwise
/// mints a v4 UUID and writes it back into the metadata. The id is also stored
/// as a [`RequestId`] extension so handlers can add it to their spans.
///
/// # Example
/// ```ignore
/// use grpc_client::interceptors::RequestIdInterceptor;
/// use tonic::service::interceptor::InterceptedService;
///
/// let svc = InterceptedService::new(UserServiceServer::new(handler), RequestIdInterceptor::new());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestIdInterceptor;

impl RequestIdInterceptor {
    pub fn new() -> Self {
        Self
    }
}

impl tonic::service::Interceptor for RequestIdInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let incoming = request
            .metadata()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_owned);

        let request_id = match incoming {
            Some(id) => id,
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                let value = MetadataValue::try_from(id.as_str())
                    .map_err(|_| Status::internal("Failed to create request ID"))?;
                request.metadata_mut().insert(REQUEST_ID_HEADER, value);
                id
            }
        };

        tracing::debug!(
            target: "grpc_server",
            request_id = %request_id,
            "Incoming gRPC request"
        );

        request.extensions_mut().insert(RequestId(request_id));
        Ok(request)
    }
}
