//! Credential checks and role-based authorization on the read side.

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::digest::CredentialDigest;
use crate::error::{UserError, UserResult};
use crate::models::{Role, UserId};
use crate::query::UserQueryService;

/// Identity resolved from a successful credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub role: Role,
}

pub struct AuthenticationService<Q, D> {
    query: Arc<Q>,
    digest: Arc<D>,
}

impl<Q, D> Clone for AuthenticationService<Q, D> {
    fn clone(&self) -> Self {
        Self {
            query: Arc::clone(&self.query),
            digest: Arc::clone(&self.digest),
        }
    }
}

impl<Q, D> AuthenticationService<Q, D>
where
    Q: UserQueryService,
    D: CredentialDigest,
{
    pub fn new(query: Arc<Q>, digest: Arc<D>) -> Self {
        Self { query, digest }
    }

    /// Verify an email/password pair.
    ///
    /// An unknown email surfaces as `NotFound`; a wrong password as
    /// `IncorrectCredentials`. The two cases are not merged.
    #[instrument(skip(self, password))]
    pub async fn authenticate_user(
        &self,
        email: &str,
        password: &str,
    ) -> UserResult<AuthenticatedUser> {
        let user = self.query.get_by_email(email).await?;

        if !self.digest.verify(password, &user.credential_digest) {
            warn!(user_id = %user.id, "Password mismatch");
            return Err(UserError::IncorrectCredentials);
        }

        debug!(user_id = %user.id, role = %user.role, "Authenticated");
        Ok(AuthenticatedUser {
            id: user.id,
            role: user.role,
        })
    }
}

pub struct AuthorizationService<Q> {
    query: Arc<Q>,
}

impl<Q> Clone for AuthorizationService<Q> {
    fn clone(&self) -> Self {
        Self {
            query: Arc::clone(&self.query),
        }
    }
}

impl<Q: UserQueryService> AuthorizationService<Q> {
    pub fn new(query: Arc<Q>) -> Self {
        Self { query }
    }

    /// Whether an already authenticated user may publish content.
    ///
    /// Never returns `Ok(false)`: denial is reported as
    /// [`UserError::PermissionDenied`] so callers cannot mistake it for a soft answer.
    #[instrument(skip(self))]
    pub async fn can_add_content(&self, user_id: UserId) -> UserResult<bool> {
        let user = self.query.get_user(user_id).await?;

        if !user.role.can_add_content() {
            debug!(role = %user.role, "Content creation denied");
            return Err(UserError::PermissionDenied(user.id));
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Sha256Digest;
    use crate::error::UserKey;
    use crate::query::{MockUserQueryService, UserView};
    use mockall::predicate::eq;

    fn view(email: &str, password: &str, role: Role) -> UserView {
        UserView {
            id: UserId::generate(),
            email: email.to_string(),
            credential_digest: Sha256Digest::new("salt").digest(password),
            role,
        }
    }

    fn authentication(query: MockUserQueryService) -> AuthenticationService<MockUserQueryService, Sha256Digest> {
        AuthenticationService::new(Arc::new(query), Arc::new(Sha256Digest::new("salt")))
    }

    #[tokio::test]
    async fn test_authenticate_returns_id_and_role() {
        let stored = view("a@x.com", "secret", Role::Creator);
        let expected = stored.id;
        let mut query = MockUserQueryService::new();
        query
            .expect_get_by_email()
            .with(eq("a@x.com"))
            .returning(move |_| Ok(stored.clone()));

        let user = authentication(query)
            .authenticate_user("a@x.com", "secret")
            .await
            .unwrap();

        assert_eq!(user.id, expected);
        assert_eq!(user.role, Role::Creator);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_wrong_password() {
        let stored = view("a@x.com", "secret", Role::Listener);
        let mut query = MockUserQueryService::new();
        query
            .expect_get_by_email()
            .returning(move |_| Ok(stored.clone()));

        let result = authentication(query)
            .authenticate_user("a@x.com", "wrong")
            .await;

        assert!(matches!(result, Err(UserError::IncorrectCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_never_compares_plaintext() {
        // A row whose stored value is the plaintext itself must not match
        let mut stored = view("a@x.com", "secret", Role::Listener);
        stored.credential_digest = "secret".to_string();
        let mut query = MockUserQueryService::new();
        query
            .expect_get_by_email()
            .returning(move |_| Ok(stored.clone()));

        let result = authentication(query)
            .authenticate_user("a@x.com", "secret")
            .await;

        assert!(matches!(result, Err(UserError::IncorrectCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_propagates_not_found() {
        let mut query = MockUserQueryService::new();
        query
            .expect_get_by_email()
            .returning(|email| Err(UserError::NotFound(UserKey::Email(email.to_string()))));

        let result = authentication(query)
            .authenticate_user("ghost@x.com", "secret")
            .await;

        assert!(matches!(result, Err(UserError::NotFound(UserKey::Email(ref e))) if e == "ghost@x.com"));
    }

    #[tokio::test]
    async fn test_creator_can_add_content() {
        let stored = view("c@x.com", "pw", Role::Creator);
        let id = stored.id;
        let mut query = MockUserQueryService::new();
        query
            .expect_get_user()
            .with(eq(id))
            .returning(move |_| Ok(stored.clone()));

        let allowed = AuthorizationService::new(Arc::new(query))
            .can_add_content(id)
            .await
            .unwrap();

        assert!(allowed);
    }

    #[tokio::test]
    async fn test_listener_is_denied() {
        let stored = view("l@x.com", "pw", Role::Listener);
        let id = stored.id;
        let mut query = MockUserQueryService::new();
        query
            .expect_get_user()
            .returning(move |_| Ok(stored.clone()));

        let result = AuthorizationService::new(Arc::new(query))
            .can_add_content(id)
            .await;

        assert!(matches!(result, Err(UserError::PermissionDenied(denied)) if denied == id));
    }

    #[tokio::test]
    async fn test_authorization_propagates_not_found() {
        let id = UserId::generate();
        let mut query = MockUserQueryService::new();
        query
            .expect_get_user()
            .returning(|id| Err(UserError::NotFound(UserKey::Id(id))));

        let result = AuthorizationService::new(Arc::new(query))
            .can_add_content(id)
            .await;

        assert!(matches!(result, Err(UserError::NotFound(UserKey::Id(missing))) if missing == id));
    }
}
