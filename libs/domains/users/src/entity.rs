use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

use crate::error::UserError;
use crate::models::{Role, User};
use crate::query::UserView;

/// Sea-ORM Entity for the users table
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    /// 0 = listener, 1 = creator
    pub role: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// Rows holding a role outside the enumeration are rejected rather than coerced
impl TryFrom<Model> for User {
    type Error = UserError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(User::new(
            model.id.into(),
            model.email,
            model.password_hash,
            Role::try_from(model.role)?,
        ))
    }
}

impl TryFrom<Model> for UserView {
    type Error = UserError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        User::try_from(model).map(UserView::from)
    }
}

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        ActiveModel {
            id: Set(user.id.as_uuid()),
            email: Set(user.email.clone()),
            password_hash: Set(user.credential_digest.clone()),
            role: Set(user.role.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;

    #[test]
    fn test_model_to_user() {
        let id = UserId::generate();
        let model = Model {
            id: id.as_uuid(),
            email: "a@x.com".to_string(),
            password_hash: "abc".to_string(),
            role: 1,
        };

        let user = User::try_from(model).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::Creator);
        assert_eq!(user.credential_digest, "abc");
    }

    #[test]
    fn test_model_with_unknown_role_is_rejected() {
        let model = Model {
            id: Uuid::now_v7(),
            email: "a@x.com".to_string(),
            password_hash: "abc".to_string(),
            role: 9,
        };

        assert!(matches!(User::try_from(model), Err(UserError::UnknownRole(9))));
    }
}
