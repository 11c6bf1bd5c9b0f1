//! Argon2id password hashing.
//!
//! Both operations are CPU-bound; the async wrappers move them onto the
//! blocking pool so request tasks keep making progress.

use anyhow::{Context, Result, anyhow};
use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{PasswordHash, SaltString, rand_core::OsRng},
};

/// Argon2id digest with the default cost parameters that matches no password.
///
/// Logins for unknown emails verify against it so they cost the same as a
/// wrong password for a known email.
pub(super) const DECOY_DIGEST: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash `plaintext` into a PHC string with a fresh random salt.
///
/// # Errors
/// Returns an error for empty input or if hashing fails.
pub fn hash_password(plaintext: &str) -> Result<String> {
    if plaintext.is_empty() {
        return Err(anyhow!("password must not be empty"));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// `false` covers wrong passwords, empty input and unparsable digests alike.
#[must_use]
pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    if plaintext.is_empty() {
        return false;
    }
    PasswordHash::new(digest).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    })
}

/// # Errors
/// Returns an error if hashing fails or the blocking task panics.
pub async fn hash_password_blocking(plaintext: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plaintext))
        .await
        .context("password hashing task failed")?
}

/// # Errors
/// Returns an error only if the blocking task panics.
pub async fn verify_password_blocking(plaintext: String, digest: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plaintext, &digest))
        .await
        .context("password verification task failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_phc_string() -> Result<()> {
        let first = hash_password("secret1")?;
        let second = hash_password("secret1")?;
        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn verify_accepts_only_the_right_password() -> Result<()> {
        let digest = hash_password("secret1")?;
        assert!(verify_password("secret1", &digest));
        assert!(!verify_password("secret2", &digest));
        assert!(!verify_password("Secret1", &digest));
        assert!(!verify_password("", &digest));
        Ok(())
    }

    #[test]
    fn decoy_digest_costs_a_full_verification() -> Result<()> {
        let decoy = PasswordHash::new(DECOY_DIGEST).map_err(|err| anyhow!("{err}"))?;
        let real = hash_password("secret1")?;
        let real = PasswordHash::new(&real).map_err(|err| anyhow!("{err}"))?;
        assert_eq!(decoy.algorithm, real.algorithm);
        assert_eq!(decoy.version, real.version);
        assert_eq!(decoy.params, real.params);
        assert!(decoy.hash.is_some());
        assert!(!verify_password("secret1", DECOY_DIGEST));
        Ok(())
    }

    #[test]
    fn empty_password_cannot_be_hashed() {
        assert!(hash_password("").is_err());
    }

    #[test]
    fn garbage_digest_never_verifies() {
        assert!(!verify_password("secret1", "not-a-phc-string"));
        assert!(!verify_password("secret1", ""));
    }

    #[tokio::test]
    async fn blocking_wrappers_round_trip() -> Result<()> {
        let digest = hash_password_blocking("secret1".to_string()).await?;
        assert!(verify_password_blocking("secret1".to_string(), digest.clone()).await?);
        assert!(!verify_password_blocking("nope".to_string(), digest).await?);
        Ok(())
    }
}
