use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::UserError;

/// Opaque user identifier. Minted once by the repository, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Time-ordered v7 id, unique without coordination.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<UserId> for Uuid {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for UserId {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| UserError::InvalidUserId(s.to_string()))
    }
}

/// User roles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum Role {
    #[default]
    Listener = 0,
    Creator = 1,
}

impl Role {
    /// Only creators may publish content.
    pub fn can_add_content(self) -> bool {
        matches!(self, Role::Creator)
    }
}

impl From<Role> for i32 {
    fn from(role: Role) -> Self {
        role as i32
    }
}

impl TryFrom<i32> for Role {
    type Error = UserError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Role::Listener),
            1 => Ok(Role::Creator),
            other => Err(UserError::UnknownRole(other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Listener => write!(f, "listener"),
            Role::Creator => write!(f, "creator"),
        }
    }
}

/// User entity
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    /// Natural lookup key, unique across users, compared case-sensitively
    pub email: String,
    /// Output of the credential digest, never the plaintext
    pub credential_digest: String,
    pub role: Role,
}

impl User {
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        credential_digest: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            credential_digest: credential_digest.into(),
            role,
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("credential_digest", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}
