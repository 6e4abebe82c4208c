use domain_users::{
    AuthenticationService, AuthorizationService, CredentialDigest, UnitOfWorkFactory,
    UserQueryService, UserService,
};
use grpc_client::RequestId;
use rpc::users::{
    AddUserRequest, AddUserResponse, AuthenticateUserRequest, AuthenticateUserResponse,
    CanAddContentRequest, CanAddContentResponse,
    authentication_service_server::AuthenticationService as AuthenticationRpc,
    authorization_service_server::AuthorizationService as AuthorizationRpc,
    user_service_server::UserService as UserRpc,
};
use tonic::{Request, Response, Status};
use tracing::{info, instrument};

use crate::conversions::{UserResultExt, parse_user_id, role_from_proto, role_to_proto};

/// `users.v1.AuthenticationService`
pub struct AuthenticationGrpc<Q, D> {
    authn: AuthenticationService<Q, D>,
}

impl<Q, D> AuthenticationGrpc<Q, D> {
    pub fn new(authn: AuthenticationService<Q, D>) -> Self {
        Self { authn }
    }
}

impl<Q, D> Clone for AuthenticationGrpc<Q, D> {
    fn clone(&self) -> Self {
        Self {
            authn: self.authn.clone(),
        }
    }
}

#[tonic::async_trait]
impl<Q, D> AuthenticationRpc for AuthenticationGrpc<Q, D>
where
    Q: UserQueryService + 'static,
    D: CredentialDigest + 'static,
{
    #[instrument(skip_all, fields(request_id = RequestId::of(&request).unwrap_or_default()))]
    async fn authenticate_user(
        &self,
        request: Request<AuthenticateUserRequest>,
    ) -> Result<Response<AuthenticateUserResponse>, Status> {
        let req = request.into_inner();

        let user = self
            .authn
            .authenticate_user(&req.email, &req.password)
            .await
            .or_status()?;

        Ok(Response::new(AuthenticateUserResponse {
            user_id: user.id.to_string(),
            role: role_to_proto(user.role) as i32,
        }))
    }
}

/// `users.v1.AuthorizationService`
pub struct AuthorizationGrpc<Q> {
    authz: AuthorizationService<Q>,
}

impl<Q> AuthorizationGrpc<Q> {
    pub fn new(authz: AuthorizationService<Q>) -> Self {
        Self { authz }
    }
}

impl<Q> Clone for AuthorizationGrpc<Q> {
    fn clone(&self) -> Self {
        Self {
            authz: self.authz.clone(),
        }
    }
}

#[tonic::async_trait]
impl<Q> AuthorizationRpc for AuthorizationGrpc<Q>
where
    Q: UserQueryService + 'static,
{
    #[instrument(skip_all, fields(request_id = RequestId::of(&request).unwrap_or_default()))]
    async fn can_add_content(
        &self,
        request: Request<CanAddContentRequest>,
    ) -> Result<Response<CanAddContentResponse>, Status> {
        let user_id = parse_user_id(&request.get_ref().user_id)?;

        let can_add = self.authz.can_add_content(user_id).await.or_status()?;

        Ok(Response::new(CanAddContentResponse { can_add }))
    }
}

/// `users.v1.UserService`: registration plus the two read paths.
pub struct UsersGrpc<F, Q, D> {
    users: UserService<F, D>,
    authn: AuthenticationGrpc<Q, D>,
    authz: AuthorizationGrpc<Q>,
}

impl<F, Q, D> UsersGrpc<F, Q, D> {
    pub fn new(
        users: UserService<F, D>,
        authn: AuthenticationGrpc<Q, D>,
        authz: AuthorizationGrpc<Q>,
    ) -> Self {
        Self { users, authn, authz }
    }
}

#[tonic::async_trait]
impl<F, Q, D> UserRpc for UsersGrpc<F, Q, D>
where
    F: UnitOfWorkFactory + 'static,
    Q: UserQueryService + 'static,
    D: CredentialDigest + 'static,
{
    #[instrument(skip_all, fields(request_id = RequestId::of(&request).unwrap_or_default()))]
    async fn add_user(
        &self,
        request: Request<AddUserRequest>,
    ) -> Result<Response<AddUserResponse>, Status> {
        let req = request.into_inner();
        let role = role_from_proto(req.role)?;

        let user_id = self
            .users
            .register(&req.email, &req.password, role)
            .await
            .or_status()?;

        info!(user_id = %user_id, role = %role, "User registered");
        Ok(Response::new(AddUserResponse {
            user_id: user_id.to_string(),
        }))
    }

    async fn authenticate_user(
        &self,
        request: Request<AuthenticateUserRequest>,
    ) -> Result<Response<AuthenticateUserResponse>, Status> {
        AuthenticationRpc::authenticate_user(&self.authn, request).await
    }

    async fn can_add_content(
        &self,
        request: Request<CanAddContentRequest>,
    ) -> Result<Response<CanAddContentResponse>, Status> {
        AuthorizationRpc::can_add_content(&self.authz, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_users::{InMemoryUserStore, Role, Sha256Digest};
    use rpc::users::UserRole;
    use std::sync::Arc;
    use tonic::Code;

    type Grpc = UsersGrpc<InMemoryUserStore, InMemoryUserStore, Sha256Digest>;

    fn grpc() -> Grpc {
        let store = Arc::new(InMemoryUserStore::new());
        let digest = Arc::new(Sha256Digest::new("grpc-test"));

        UsersGrpc::new(
            UserService::from_arc(Arc::clone(&store), Arc::clone(&digest)),
            AuthenticationGrpc::new(AuthenticationService::new(Arc::clone(&store), digest)),
            AuthorizationGrpc::new(AuthorizationService::new(store)),
        )
    }

    async fn add(grpc: &Grpc, email: &str, password: &str, role: i32) -> Result<String, Status> {
        let request = Request::new(AddUserRequest {
            email: email.to_string(),
            password: password.to_string(),
            role,
        });
        Ok(grpc.add_user(request).await?.into_inner().user_id)
    }

    async fn authenticate(
        grpc: &Grpc,
        email: &str,
        password: &str,
    ) -> Result<AuthenticateUserResponse, Status> {
        let request = Request::new(AuthenticateUserRequest {
            email: email.to_string(),
            password: password.to_string(),
        });
        Ok(UserRpc::authenticate_user(grpc, request).await?.into_inner())
    }

    async fn can_add(grpc: &Grpc, user_id: &str) -> Result<bool, Status> {
        let request = Request::new(CanAddContentRequest {
            user_id: user_id.to_string(),
        });
        Ok(UserRpc::can_add_content(grpc, request).await?.into_inner().can_add)
    }

    #[tokio::test]
    async fn test_listener_flow() {
        let grpc = grpc();

        let id = add(&grpc, "a@x.com", "secret", UserRole::Listener as i32)
            .await
            .unwrap();
        assert!(id.parse::<domain_users::UserId>().is_ok());

        let again = add(&grpc, "a@x.com", "secret", UserRole::Listener as i32).await;
        assert_eq!(again.unwrap_err().code(), Code::AlreadyExists);

        let auth = authenticate(&grpc, "a@x.com", "secret").await.unwrap();
        assert_eq!(auth.user_id, id);
        assert_eq!(auth.role, UserRole::Listener as i32);

        let wrong = authenticate(&grpc, "a@x.com", "nope").await.unwrap_err();
        assert_eq!(wrong.code(), Code::Unauthenticated);

        let denied = can_add(&grpc, &id).await.unwrap_err();
        assert_eq!(denied.code(), Code::PermissionDenied);
    }

    #[tokio::test]
    async fn test_creator_flow() {
        let grpc = grpc();

        let id = add(&grpc, "b@x.com", "pw", UserRole::Creator as i32)
            .await
            .unwrap();

        let auth = authenticate(&grpc, "b@x.com", "pw").await.unwrap();
        assert_eq!(auth.role, UserRole::Creator as i32);
        assert!(can_add(&grpc, &id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_role_rejected_before_domain() {
        let grpc = grpc();

        let status = add(&grpc, "c@x.com", "pw", 42).await.unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);

        let missing = authenticate(&grpc, "c@x.com", "pw").await.unwrap_err();
        assert_eq!(missing.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn test_can_add_content_bad_ids() {
        let grpc = grpc();

        let malformed = can_add(&grpc, "not-a-uuid").await.unwrap_err();
        assert_eq!(malformed.code(), Code::InvalidArgument);

        let unknown = can_add(&grpc, &domain_users::UserId::generate().to_string())
            .await
            .unwrap_err();
        assert_eq!(unknown.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn test_standalone_services_share_the_store() {
        let store = Arc::new(InMemoryUserStore::new());
        let digest = Arc::new(Sha256Digest::new("grpc-test"));
        let users = UserService::from_arc(Arc::clone(&store), Arc::clone(&digest));
        let authn = AuthenticationGrpc::new(AuthenticationService::new(Arc::clone(&store), digest));
        let authz = AuthorizationGrpc::new(AuthorizationService::new(store));

        let id = users.register("d@x.com", "pw", Role::Creator).await.unwrap();

        let auth = authn
            .authenticate_user(Request::new(AuthenticateUserRequest {
                email: "d@x.com".into(),
                password: "pw".into(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(auth.user_id, id.to_string());

        let allowed = authz
            .can_add_content(Request::new(CanAddContentRequest {
                user_id: id.to_string(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert!(allowed.can_add);
    }
}
