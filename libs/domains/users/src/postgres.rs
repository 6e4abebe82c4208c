use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IsolationLevel, QueryFilter, SqlErr, TransactionTrait,
};
use tracing::debug;

use crate::{
    entity,
    error::{UserError, UserKey, UserResult},
    models::{User, UserId},
    query::{UserQueryService, UserView},
    repository::UserRepository,
    unit_of_work::{UnitOfWork, UnitOfWorkFactory},
};

/// Repository over any SeaORM connection.
///
/// Inside a unit of work `C` is the [`DatabaseTransaction`], so every statement
/// joins that transaction.
pub struct PgUserRepository<C> {
    conn: C,
}

impl<C> PgUserRepository<C> {
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    pub fn into_inner(self) -> C {
        self.conn
    }
}

#[async_trait]
impl<C> UserRepository for PgUserRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn find(&self, id: UserId) -> UserResult<User> {
        entity::Entity::find_by_id(id.as_uuid())
            .one(&self.conn)
            .await?
            .ok_or(UserError::NotFound(UserKey::Id(id)))?
            .try_into()
    }

    async fn find_by_email(&self, email: &str) -> UserResult<User> {
        entity::Entity::find()
            .filter(entity::Column::Email.eq(email))
            .one(&self.conn)
            .await?
            .ok_or_else(|| UserError::NotFound(UserKey::Email(email.to_string())))?
            .try_into()
    }

    async fn store(&self, user: &User) -> UserResult<()> {
        let model = entity::ActiveModel::from(user);

        entity::Entity::insert(model)
            .on_conflict(
                OnConflict::column(entity::Column::Id)
                    .update_columns([
                        entity::Column::Email,
                        entity::Column::PasswordHash,
                        entity::Column::Role,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await
            .map_err(|err| match err.sql_err() {
                // Unique index on email: a concurrent registration won the race
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    UserError::AlreadyExists(user.email.clone())
                }
                _ => UserError::from(err),
            })?;

        debug!(user_id = %user.id, "Stored user");
        Ok(())
    }

    async fn remove(&self, id: UserId) -> UserResult<()> {
        let result = entity::Entity::delete_by_id(id.as_uuid())
            .exec(&self.conn)
            .await?;

        debug!(user_id = %id, rows = result.rows_affected, "Removed user");
        Ok(())
    }
}

/// Unit of work owning one database transaction.
///
/// Dropping it without `commit` rolls the transaction back.
pub struct PgUnitOfWork {
    repository: PgUserRepository<DatabaseTransaction>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    fn user_repository(&self) -> &dyn UserRepository {
        &self.repository
    }

    async fn commit(self: Box<Self>) -> UserResult<()> {
        self.repository
            .into_inner()
            .commit()
            .await
            .map_err(|e| UserError::Transaction(format!("commit failed: {}", e)))
    }

    async fn rollback(self: Box<Self>) -> UserResult<()> {
        self.repository
            .into_inner()
            .rollback()
            .await
            .map_err(|e| UserError::Transaction(format!("rollback failed: {}", e)))
    }
}

#[derive(Clone)]
pub struct PgUnitOfWorkFactory {
    db: DatabaseConnection,
    isolation_level: Option<IsolationLevel>,
}

impl PgUnitOfWorkFactory {
    /// Transactions use the server default isolation level.
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            isolation_level: None,
        }
    }

    pub fn with_isolation_level(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = Some(level);
        self
    }
}

#[async_trait]
impl UnitOfWorkFactory for PgUnitOfWorkFactory {
    async fn begin(&self) -> UserResult<Box<dyn UnitOfWork>> {
        let txn = self
            .db
            .begin_with_config(self.isolation_level, None)
            .await
            .map_err(|e| UserError::Transaction(format!("begin failed: {}", e)))?;

        Ok(Box::new(PgUnitOfWork {
            repository: PgUserRepository::new(txn),
        }))
    }
}

/// Read-only queries on the pool, outside any transaction.
#[derive(Clone)]
pub struct PgUserQueryService {
    db: DatabaseConnection,
}

impl PgUserQueryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserQueryService for PgUserQueryService {
    async fn get_user(&self, id: UserId) -> UserResult<UserView> {
        entity::Entity::find_by_id(id.as_uuid())
            .one(&self.db)
            .await?
            .ok_or(UserError::NotFound(UserKey::Id(id)))?
            .try_into()
    }

    async fn get_by_email(&self, email: &str) -> UserResult<UserView> {
        entity::Entity::find()
            .filter(entity::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .ok_or_else(|| UserError::NotFound(UserKey::Email(email.to_string())))?
            .try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::sqlstate;
    use crate::models::Role;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn row(user: &User) -> entity::Model {
        entity::Model {
            id: user.id.as_uuid(),
            email: user.email.clone(),
            password_hash: user.credential_digest.clone(),
            role: user.role.into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_email_maps_row() {
        let user = User::new(UserId::generate(), "a@x.com", "digest", Role::Creator);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(&user)]])
            .into_connection();

        let found = PgUserRepository::new(db).find_by_email("a@x.com").await.unwrap();

        assert_eq!(found, user);
    }

    #[tokio::test]
    async fn test_find_missing_id_is_not_found() {
        let id = UserId::generate();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<entity::Model>::new()])
            .into_connection();

        let result = PgUserRepository::new(db).find(id).await;

        assert!(matches!(result, Err(UserError::NotFound(UserKey::Id(missing))) if missing == id));
    }

    #[tokio::test]
    async fn test_store_serialization_failure_is_retryable() {
        let user = User::new(UserId::generate(), "race@x.com", "digest", Role::Listener);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([sqlstate::query_error(
                "40001",
                "could not serialize access due to read/write dependencies among transactions",
            )])
            .into_connection();

        let err = PgUserRepository::new(db).store(&user).await.unwrap_err();

        assert!(matches!(err, UserError::Transaction(_)), "{err:?}");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_remove_missing_id_is_ok() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        PgUserRepository::new(db).remove(UserId::generate()).await.unwrap();
    }

    #[tokio::test]
    async fn test_query_service_reads_view() {
        let user = User::new(UserId::generate(), "b@x.com", "digest", Role::Listener);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(&user)]])
            .into_connection();

        let view = PgUserQueryService::new(db).get_user(user.id).await.unwrap();

        assert_eq!(view.id, user.id);
        assert_eq!(view.role, Role::Listener);
        assert_eq!(view.email, "b@x.com");
    }

    #[tokio::test]
    async fn test_query_service_email_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<entity::Model>::new()])
            .into_connection();

        let result = PgUserQueryService::new(db).get_by_email("ghost@x.com").await;

        assert!(matches!(result, Err(UserError::NotFound(UserKey::Email(_)))));
    }
}
