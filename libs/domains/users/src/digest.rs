//! One-way salted transform applied to secrets before they are stored or compared.

use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// Deterministic one-way transform from a plaintext secret to a storable value.
pub trait CredentialDigest: Send + Sync {
    fn digest(&self, secret: &str) -> String;

    /// Compare a presented secret against a stored digest.
    ///
    /// The plaintext is always run through [`CredentialDigest::digest`] first.
    fn verify(&self, secret: &str, stored: &str) -> bool {
        self.digest(secret).as_bytes() == stored.as_bytes()
    }
}

/// SHA-256 over `salt || secret`, hex encoded.
///
/// The salt is process-wide and fixed at construction.
#[derive(Clone)]
pub struct Sha256Digest {
    salt: Arc<str>,
}

impl Sha256Digest {
    pub fn new(salt: impl Into<String>) -> Self {
        Self {
            salt: Arc::from(salt.into()),
        }
    }
}

impl CredentialDigest for Sha256Digest {
    fn digest(&self, secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(secret.as_bytes());
        const_hex::encode(hasher.finalize())
    }
}

impl fmt::Debug for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sha256Digest")
            .field("salt", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_deterministic() {
        let digest = Sha256Digest::new("pepper");
        assert_eq!(digest.digest("secret"), digest.digest("secret"));
    }

    #[test]
    fn test_digest_never_returns_plaintext() {
        let digest = Sha256Digest::new("pepper");
        let out = digest.digest("secret");
        assert_ne!(out, "secret");
        assert_eq!(out.len(), 64);
        assert!(out.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_salt_changes_output() {
        let a = Sha256Digest::new("salt-a");
        let b = Sha256Digest::new("salt-b");
        assert_ne!(a.digest("secret"), b.digest("secret"));
    }

    #[test]
    fn test_known_vector() {
        // sha256("abc")
        let digest = Sha256Digest::new("");
        assert_eq!(
            digest.digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify() {
        let digest = Sha256Digest::new("pepper");
        let stored = digest.digest("secret");
        assert!(digest.verify("secret", &stored));
        assert!(!digest.verify("Secret", &stored));
        assert!(!digest.verify("secret", "secret"));
    }

    #[test]
    fn test_debug_hides_salt() {
        let digest = Sha256Digest::new("super-secret-salt");
        assert!(!format!("{:?}", digest).contains("super-secret-salt"));
    }
}
