//! Transaction boundary for write workflows.
//!
//! A [`UnitOfWork`] is *open* from [`UnitOfWorkFactory::begin`] until it is
//! consumed by `commit`, `rollback` or `complete`.
//! Consuming `Box<Self>` makes use-after-completion a compile error. Dropping an
//! open unit of work discards its writes.

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::{debug, error};

use crate::error::{UserError, UserResult};
use crate::repository::UserRepository;

#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Repository bound to this transaction
    fn user_repository(&self) -> &dyn UserRepository;

    async fn commit(self: Box<Self>) -> UserResult<()>;

    async fn rollback(self: Box<Self>) -> UserResult<()>;
}

impl dyn UnitOfWork {
    /// Resolve the unit of work from the outcome of the work done in it.
    ///
    /// `Ok` commits and a failed commit replaces the value. `Err` rolls back and
    /// returns the original error, wrapped in [`UserError::RollbackFailed`] if the
    /// rollback itself failed.
    pub async fn complete<T>(self: Box<Self>, result: UserResult<T>) -> UserResult<T> {
        match result {
            Ok(value) => {
                self.commit().await?;
                debug!("Unit of work committed");
                Ok(value)
            }
            Err(err) => match self.rollback().await {
                Ok(()) => {
                    debug!(error = %err, "Unit of work rolled back");
                    Err(err)
                }
                Err(rollback_err) => {
                    error!(error = %err, rollback_error = %rollback_err, "Rollback failed");
                    Err(UserError::RollbackFailed {
                        source: Box::new(err),
                        reason: rollback_err.to_string(),
                    })
                }
            },
        }
    }
}

#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// Open a transaction. Fails with [`UserError::Transaction`] when the store
    /// cannot start one.
    async fn begin(&self) -> UserResult<Box<dyn UnitOfWork>>;
}

/// Run `work` against a transaction-bound repository and always resolve the
/// unit of work before returning, whichever way `work` exits.
///
/// ```ignore
/// let id = run_in_unit_of_work(&factory, move |repo| {
///     Box::pin(async move {
///         let user = repo.find_by_email(&email).await?;
///         Ok(user.id)
///     })
/// })
/// .await?;
/// ```
pub async fn run_in_unit_of_work<F, T, W>(factory: &F, work: W) -> UserResult<T>
where
    F: UnitOfWorkFactory + ?Sized,
    T: Send,
    W: for<'r> FnOnce(&'r dyn UserRepository) -> BoxFuture<'r, UserResult<T>> + Send,
{
    let uow = factory.begin().await?;
    let result = work(uow.user_repository()).await;
    uow.complete(result).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User, UserId};
    use crate::repository::MockUserRepository;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Outcome {
        Committed,
        RolledBack,
    }

    struct RecordingUnitOfWork {
        repository: MockUserRepository,
        outcome: Arc<Mutex<Option<Outcome>>>,
        fail_commit: bool,
        fail_rollback: bool,
    }

    impl RecordingUnitOfWork {
        fn boxed(outcome: &Arc<Mutex<Option<Outcome>>>) -> Box<dyn UnitOfWork> {
            Box::new(Self {
                repository: MockUserRepository::new(),
                outcome: Arc::clone(outcome),
                fail_commit: false,
                fail_rollback: false,
            })
        }
    }

    #[async_trait]
    impl UnitOfWork for RecordingUnitOfWork {
        fn user_repository(&self) -> &dyn UserRepository {
            &self.repository
        }

        async fn commit(self: Box<Self>) -> UserResult<()> {
            if self.fail_commit {
                return Err(UserError::Transaction("commit refused".into()));
            }
            *self.outcome.lock().unwrap() = Some(Outcome::Committed);
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> UserResult<()> {
            if self.fail_rollback {
                return Err(UserError::Transaction("connection lost".into()));
            }
            *self.outcome.lock().unwrap() = Some(Outcome::RolledBack);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_complete_ok_commits() {
        let outcome = Arc::new(Mutex::new(None));
        let uow = RecordingUnitOfWork::boxed(&outcome);

        let value = uow.complete(Ok(7)).await.unwrap();

        assert_eq!(value, 7);
        assert_eq!(*outcome.lock().unwrap(), Some(Outcome::Committed));
    }

    #[tokio::test]
    async fn test_complete_err_rolls_back_and_returns_original_error() {
        let outcome = Arc::new(Mutex::new(None));
        let uow = RecordingUnitOfWork::boxed(&outcome);

        let result: UserResult<()> = uow
            .complete(Err(UserError::AlreadyExists("a@x.com".into())))
            .await;

        assert!(matches!(result, Err(UserError::AlreadyExists(_))));
        assert_eq!(*outcome.lock().unwrap(), Some(Outcome::RolledBack));
    }

    #[tokio::test]
    async fn test_complete_wraps_rollback_failure() {
        let outcome = Arc::new(Mutex::new(None));
        let uow: Box<dyn UnitOfWork> = Box::new(RecordingUnitOfWork {
            repository: MockUserRepository::new(),
            outcome: Arc::clone(&outcome),
            fail_commit: false,
            fail_rollback: true,
        });

        let err = uow
            .complete::<()>(Err(UserError::Database("disk full".into())))
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::RollbackFailed { .. }));
        assert!(matches!(err.root(), UserError::Database(_)));
        assert!(err.to_string().contains("connection lost"));
    }

    #[tokio::test]
    async fn test_complete_surfaces_commit_failure() {
        let outcome = Arc::new(Mutex::new(None));
        let uow: Box<dyn UnitOfWork> = Box::new(RecordingUnitOfWork {
            repository: MockUserRepository::new(),
            outcome: Arc::clone(&outcome),
            fail_commit: true,
            fail_rollback: false,
        });

        let result = uow.complete(Ok(())).await;

        assert!(matches!(result, Err(UserError::Transaction(_))));
        assert_eq!(*outcome.lock().unwrap(), None);
    }

    struct SingleUseFactory {
        outcome: Arc<Mutex<Option<Outcome>>>,
        user: User,
    }

    #[async_trait]
    impl UnitOfWorkFactory for SingleUseFactory {
        async fn begin(&self) -> UserResult<Box<dyn UnitOfWork>> {
            let mut repository = MockUserRepository::new();
            let user = self.user.clone();
            repository
                .expect_find_by_email()
                .returning(move |_| Ok(user.clone()));
            Ok(Box::new(RecordingUnitOfWork {
                repository,
                outcome: Arc::clone(&self.outcome),
                fail_commit: false,
                fail_rollback: false,
            }))
        }
    }

    #[tokio::test]
    async fn test_run_in_unit_of_work_rolls_back_on_early_return() {
        let outcome = Arc::new(Mutex::new(None));
        let factory = SingleUseFactory {
            outcome: Arc::clone(&outcome),
            user: User::new(UserId::generate(), "a@x.com", "digest", Role::Listener),
        };

        let result: UserResult<UserId> = run_in_unit_of_work(&factory, |repo| {
            Box::pin(async move {
                let user = repo.find_by_email("a@x.com").await?;
                Err(UserError::AlreadyExists(user.email))
            })
        })
        .await;

        assert!(matches!(result, Err(UserError::AlreadyExists(_))));
        assert_eq!(*outcome.lock().unwrap(), Some(Outcome::RolledBack));
    }

    #[tokio::test]
    async fn test_run_in_unit_of_work_commits_on_success() {
        let outcome = Arc::new(Mutex::new(None));
        let user = User::new(UserId::generate(), "a@x.com", "digest", Role::Creator);
        let expected = user.id;
        let factory = SingleUseFactory {
            outcome: Arc::clone(&outcome),
            user,
        };

        let id = run_in_unit_of_work(&factory, |repo| {
            Box::pin(async move { Ok(repo.find_by_email("a@x.com").await?.id) })
        })
        .await
        .unwrap();

        assert_eq!(id, expected);
        assert_eq!(*outcome.lock().unwrap(), Some(Outcome::Committed));
    }

    struct BrokenFactory;

    #[async_trait]
    impl UnitOfWorkFactory for BrokenFactory {
        async fn begin(&self) -> UserResult<Box<dyn UnitOfWork>> {
            Err(UserError::Transaction("pool exhausted".into()))
        }
    }

    #[tokio::test]
    async fn test_begin_failure_never_runs_work() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);

        let result: UserResult<()> = run_in_unit_of_work(&BrokenFactory, move |_repo| {
            flag.store(true, Ordering::SeqCst);
            Box::pin(async move { Ok(()) })
        })
        .await;

        assert!(matches!(result, Err(UserError::Transaction(_))));
        assert!(!ran.load(Ordering::SeqCst));
    }
}
