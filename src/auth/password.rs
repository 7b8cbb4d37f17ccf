//! Salted argon2id hashes for stored credentials.

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

fn hasher() -> Argon2<'static> {
    Argon2::default()
}

fn hash_error(what: &str, e: password_hash::Error) -> anyhow::Error {
    error!(error = %e, "argon2 {} failed", what);
    anyhow::anyhow!("argon2 {}: {}", what, e)
}

/// PHC string with a fresh salt; two calls on the same input never match.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| hash_error("hash", e))
}

/// `Ok(false)` on a mismatch, `Err` only when `stored` is not a PHC string.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| hash_error("parse", e))?;
    match hasher().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(hash_error("verify", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_hash_accepts_only_its_password() {
        let stored = hash_password("pw1").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(verify_password("pw1", &stored).unwrap());
        assert!(!verify_password("pw2", &stored).unwrap());
        assert!(!verify_password("", &stored).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash_password("pw1").unwrap(), hash_password("pw1").unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error_not_a_mismatch() {
        let err = verify_password("pw1", "plaintext-in-db").unwrap_err();
        assert!(err.to_string().contains("parse"));
    }
}
