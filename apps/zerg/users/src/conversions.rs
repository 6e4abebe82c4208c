//! Proto ↔ domain conversion helpers

use domain_users::{Role, UserError, UserId, UserResult};
use grpc_client::ToTonicResult;
use rpc::users::UserRole;
use tonic::{Code, Status};
use tracing::{error, warn};

pub fn role_from_proto(value: i32) -> Result<Role, Status> {
    match UserRole::try_from(value) {
        Ok(UserRole::Listener) => Ok(Role::Listener),
        Ok(UserRole::Creator) => Ok(Role::Creator),
        Err(_) => Err(to_status(UserError::UnknownRole(value))),
    }
}

pub fn role_to_proto(role: Role) -> UserRole {
    match role {
        Role::Listener => UserRole::Listener,
        Role::Creator => UserRole::Creator,
    }
}

pub fn parse_user_id(raw: &str) -> Result<UserId, Status> {
    raw.parse::<UserId>().to_tonic()
}

/// gRPC code for a domain error, classified by its root cause
pub fn status_code(err: &UserError) -> Code {
    match err.root() {
        UserError::NotFound(_) => Code::NotFound,
        UserError::AlreadyExists(_) => Code::AlreadyExists,
        UserError::IncorrectCredentials => Code::Unauthenticated,
        UserError::PermissionDenied(_) => Code::PermissionDenied,
        UserError::UnknownRole(_) | UserError::InvalidUserId(_) => Code::InvalidArgument,
        UserError::Transaction(_) => Code::Unavailable,
        UserError::Database(_) | UserError::RollbackFailed { .. } => Code::Internal,
    }
}

/// Storage details stay in the logs; callers get a generic message.
pub fn to_status(err: UserError) -> Status {
    match status_code(&err) {
        Code::Internal => {
            error!(error = %err, "Internal error while handling request");
            Status::internal("internal error")
        }
        Code::Unavailable => {
            warn!(error = %err, "Transaction aborted, request can be retried");
            Status::unavailable("temporarily unavailable")
        }
        code => Status::new(code, err.to_string()),
    }
}

/// `?`-friendly conversion of domain results at the handler boundary
pub trait UserResultExt<T> {
    fn or_status(self) -> Result<T, Status>;
}

impl<T> UserResultExt<T> for UserResult<T> {
    fn or_status(self) -> Result<T, Status> {
        self.map_err(to_status)
    }
}
