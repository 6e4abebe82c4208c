use core_config::{ConfigError, FromEnv, env_non_empty};
use std::fmt;

use crate::digest::Sha256Digest;

/// Salt for the credential digest, read once at startup.
#[derive(Clone)]
pub struct DigestConfig {
    pub salt: String,
}

impl DigestConfig {
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    pub fn into_digest(self) -> Sha256Digest {
        Sha256Digest::new(self.salt)
    }
}

impl FromEnv for DigestConfig {
    /// Requires `HASHER_SALT` to be set and non-empty
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            salt: env_non_empty("HASHER_SALT")?,
        })
    }
}

impl fmt::Debug for DigestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestConfig")
            .field("salt", &"<redacted>")
            .finish()
    }
}
