use std::sync::Arc;
use tracing::{info, instrument};

use crate::digest::CredentialDigest;
use crate::error::{UserError, UserResult};
use crate::models::{Role, User, UserId};
use crate::unit_of_work::{UnitOfWorkFactory, run_in_unit_of_work};

/// Registration workflow.
///
/// Email uniqueness is enforced here, inside one unit of work, rather than
/// assumed from storage.
pub struct UserService<F, D> {
    factory: Arc<F>,
    digest: Arc<D>,
}

impl<F, D> Clone for UserService<F, D> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            digest: Arc::clone(&self.digest),
        }
    }
}

impl<F, D> UserService<F, D>
where
    F: UnitOfWorkFactory,
    D: CredentialDigest,
{
    pub fn new(factory: F, digest: D) -> Self {
        Self::from_arc(Arc::new(factory), Arc::new(digest))
    }

    pub fn from_arc(factory: Arc<F>, digest: Arc<D>) -> Self {
        Self { factory, digest }
    }

    /// Register a user whose credential has already been digested.
    ///
    /// The existence check and the insert share one transaction; any failure
    /// rolls both back.
    #[instrument(skip(self, credential_digest), fields(email = %email, role = %role))]
    pub async fn add_user(
        &self,
        email: &str,
        credential_digest: &str,
        role: Role,
    ) -> UserResult<UserId> {
        let email = email.to_owned();
        let credential_digest = credential_digest.to_owned();

        let id = run_in_unit_of_work(self.factory.as_ref(), move |repo| {
            Box::pin(async move {
                match repo.find_by_email(&email).await {
                    Ok(_) => return Err(UserError::AlreadyExists(email)),
                    Err(UserError::NotFound(_)) => {}
                    Err(err) => return Err(err),
                }

                let user = User::new(repo.new_id(), email, credential_digest, role);
                repo.store(&user).await?;
                Ok(user.id)
            })
        })
        .await?;

        info!(user_id = %id, "Registered user");
        Ok(id)
    }

    /// Digest a plaintext password and register the user.
    pub async fn register(&self, email: &str, password: &str, role: Role) -> UserResult<UserId> {
        let credential_digest = self.digest.digest(password);
        self.add_user(email, &credential_digest, role).await
    }
}
