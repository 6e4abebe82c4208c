//! Read-only projection used by the authentication and authorization paths.
//!
//! Kept apart from [`crate::repository::UserRepository`] so that reads never
//! open a write transaction.

use async_trait::async_trait;
use std::fmt;

use crate::error::UserResult;
use crate::models::{Role, User, UserId};

#[derive(Clone, PartialEq, Eq)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub credential_digest: String,
    pub role: Role,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            credential_digest: user.credential_digest,
            role: user.role,
        }
    }
}

impl fmt::Debug for UserView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserView")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserQueryService: Send + Sync {
    async fn get_user(&self, id: UserId) -> UserResult<UserView>;

    async fn get_by_email(&self, email: &str) -> UserResult<UserView>;
}
