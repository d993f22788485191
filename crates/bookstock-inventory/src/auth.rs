//! Credential checks that decide whether a session may mutate the table.
//!
//! The session only needs a yes/no answer, so the check is a trait passed in
//! at construction. [`SharedSecretAuthorizer`] keeps a SHA-256 digest of one
//! administrative secret and compares digests in constant time. The
//! comparison is ASCII case-insensitive: both sides are lower-cased before
//! hashing.

use sha2::{Digest, Sha256};

/// Decides whether a presented credential grants the mutation privilege.
pub trait Authorizer: Send + Sync {
    fn authorize(&self, credential: &str) -> bool;
}

/// Accepts a single shared secret.
#[derive(Clone)]
pub struct SharedSecretAuthorizer {
    expected_hash: String,
}

impl SharedSecretAuthorizer {
    pub fn new(secret: &str) -> Self {
        Self {
            expected_hash: digest(secret),
        }
    }
}

impl Authorizer for SharedSecretAuthorizer {
    fn authorize(&self, credential: &str) -> bool {
        constant_time_eq(digest(credential).as_bytes(), self.expected_hash.as_bytes())
    }
}

/// Rejects every credential. Used when no secret is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl Authorizer for DenyAll {
    fn authorize(&self, _credential: &str) -> bool {
        false
    }
}

/// Builds the authorizer for an optional configured secret.
pub fn authorizer_for(secret: Option<&str>) -> Box<dyn Authorizer> {
    match secret {
        Some(secret) => {
            tracing::info!("admin login enabled");
            Box::new(SharedSecretAuthorizer::new(secret))
        }
        None => {
            tracing::warn!("admin login disabled (BOOKSTOCK_ADMIN_SECRET not set)");
            Box::new(DenyAll)
        }
    }
}

fn digest(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_ascii_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time byte comparison (prevents timing attacks).
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_secret_is_case_insensitive() {
        let auth = SharedSecretAuthorizer::new("Root");
        assert!(auth.authorize("root"));
        assert!(auth.authorize("ROOT"));
        assert!(!auth.authorize("root "));
        assert!(!auth.authorize(""));
    }

    #[test]
    fn deny_all_rejects_everything() {
        assert!(!DenyAll.authorize("root"));
        assert!(!authorizer_for(None).authorize(""));
        assert!(authorizer_for(Some("s3cret")).authorize("S3CRET"));
    }

    #[test]
    fn constant_time_eq_lengths() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
