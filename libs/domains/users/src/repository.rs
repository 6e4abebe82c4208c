use async_trait::async_trait;

use crate::error::UserResult;
use crate::models::{User, UserId};

/// Write-side persistence for users.
///
/// An instance is scoped to whatever transaction it was obtained from
/// (see [`crate::unit_of_work::UnitOfWork::user_repository`]) and keeps no
/// transaction state of its own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Mint a fresh identifier
    fn new_id(&self) -> UserId {
        UserId::generate()
    }

    /// Fails with `NotFound` when no record has this id
    async fn find(&self, id: UserId) -> UserResult<User>;

    /// Exact-match lookup. Fails with `NotFound` when the email is unused
    async fn find_by_email(&self, email: &str) -> UserResult<User>;

    /// Upsert by id; last writer wins
    async fn store(&self, user: &User) -> UserResult<()>;

    /// Delete by id; a missing id is not an error
    async fn remove(&self, id: UserId) -> UserResult<()>;
}
