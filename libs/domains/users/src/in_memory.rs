use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedRwLockWriteGuard, RwLock};

use crate::error::{UserError, UserKey, UserResult};
use crate::models::{User, UserId};
use crate::query::{UserQueryService, UserView};
use crate::repository::UserRepository;
use crate::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

/// In-memory user store (for development/testing)
///
/// A unit of work holds the write lock for its whole lifetime, so units of work
/// run one at a time and reads wait for the open one to finish. Writes are
/// staged in a private copy and only published on commit.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryUserStore {
    async fn begin(&self) -> UserResult<Box<dyn UnitOfWork>> {
        let guard = Arc::clone(&self.users).write_owned().await;
        let staged = (*guard).clone();

        Ok(Box::new(InMemoryUnitOfWork {
            guard,
            repository: StagedUserRepository {
                users: Mutex::new(staged),
            },
        }))
    }
}

#[async_trait]
impl UserQueryService for InMemoryUserStore {
    async fn get_user(&self, id: UserId) -> UserResult<UserView> {
        let users = self.users.read().await;
        users
            .get(&id)
            .cloned()
            .map(UserView::from)
            .ok_or(UserError::NotFound(UserKey::Id(id)))
    }

    async fn get_by_email(&self, email: &str) -> UserResult<UserView> {
        let users = self.users.read().await;
        users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .map(UserView::from)
            .ok_or_else(|| UserError::NotFound(UserKey::Email(email.to_string())))
    }
}

struct InMemoryUnitOfWork {
    guard: OwnedRwLockWriteGuard<HashMap<UserId, User>>,
    repository: StagedUserRepository,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn user_repository(&self) -> &dyn UserRepository {
        &self.repository
    }

    async fn commit(self: Box<Self>) -> UserResult<()> {
        let InMemoryUnitOfWork {
            mut guard,
            repository,
        } = *self;
        *guard = repository.users.into_inner();
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> UserResult<()> {
        // Staged writes are discarded with the guard
        Ok(())
    }
}

struct StagedUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

#[async_trait]
impl UserRepository for StagedUserRepository {
    async fn find(&self, id: UserId) -> UserResult<User> {
        let users = self.users.lock().await;
        users
            .get(&id)
            .cloned()
            .ok_or(UserError::NotFound(UserKey::Id(id)))
    }

    async fn find_by_email(&self, email: &str) -> UserResult<User> {
        let users = self.users.lock().await;
        users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| UserError::NotFound(UserKey::Email(email.to_string())))
    }

    async fn store(&self, user: &User) -> UserResult<()> {
        let mut users = self.users.lock().await;
        users.insert(user.id, user.clone());

        tracing::debug!(user_id = %user.id, "Staged user");
        Ok(())
    }

    async fn remove(&self, id: UserId) -> UserResult<()> {
        let mut users = self.users.lock().await;
        users.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user(email: &str, role: Role) -> User {
        User::new(UserId::generate(), email, "digest", role)
    }

    #[tokio::test]
    async fn test_commit_publishes_staged_writes() {
        let store = InMemoryUserStore::new();
        let created = user("a@x.com", Role::Creator);

        let uow = store.begin().await.unwrap();
        uow.user_repository().store(&created).await.unwrap();
        uow.commit().await.unwrap();

        let view = store.get_user(created.id).await.unwrap();
        assert_eq!(view.email, "a@x.com");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_staged_writes() {
        let store = InMemoryUserStore::new();
        let created = user("a@x.com", Role::Creator);

        let uow = store.begin().await.unwrap();
        uow.user_repository().store(&created).await.unwrap();
        uow.rollback().await.unwrap();

        assert!(store.get_user(created.id).await.unwrap_err().is_not_found());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_dropping_open_unit_of_work_discards_writes() {
        let store = InMemoryUserStore::new();
        let created = user("a@x.com", Role::Listener);

        {
            let uow = store.begin().await.unwrap();
            uow.user_repository().store(&created).await.unwrap();
        }

        assert!(store.is_empty().await);
        // Lock was released; a new unit of work can start
        let uow = store.begin().await.unwrap();
        uow.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_repository_sees_its_own_staged_writes() {
        let store = InMemoryUserStore::new();
        let created = user("a@x.com", Role::Listener);

        let uow = store.begin().await.unwrap();
        let repo = uow.user_repository();
        repo.store(&created).await.unwrap();

        assert_eq!(repo.find(created.id).await.unwrap(), created);
        assert_eq!(repo.find_by_email("a@x.com").await.unwrap().id, created.id);
        uow.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_store_is_an_upsert_by_id() {
        let store = InMemoryUserStore::new();
        let mut created = user("a@x.com", Role::Listener);

        let uow = store.begin().await.unwrap();
        uow.user_repository().store(&created).await.unwrap();
        created.role = Role::Creator;
        uow.user_repository().store(&created).await.unwrap();
        uow.commit().await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get_user(created.id).await.unwrap().role, Role::Creator);
    }

    #[tokio::test]
    async fn test_remove_missing_id_is_not_an_error() {
        let store = InMemoryUserStore::new();

        let uow = store.begin().await.unwrap();
        uow.user_repository().remove(UserId::generate()).await.unwrap();
        uow.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_deletes_record() {
        let store = InMemoryUserStore::new();
        let created = user("a@x.com", Role::Listener);

        let uow = store.begin().await.unwrap();
        uow.user_repository().store(&created).await.unwrap();
        uow.commit().await.unwrap();

        let uow = store.begin().await.unwrap();
        uow.user_repository().remove(created.id).await.unwrap();
        uow.commit().await.unwrap();

        assert!(store.get_by_email("a@x.com").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_email_lookup_is_exact_match() {
        let store = InMemoryUserStore::new();

        let uow = store.begin().await.unwrap();
        uow.user_repository().store(&user("a@x.com", Role::Listener)).await.unwrap();
        uow.commit().await.unwrap();

        assert!(store.get_by_email("a@x.com").await.is_ok());
        assert!(store.get_by_email("A@X.COM").await.unwrap_err().is_not_found());
    }
}
