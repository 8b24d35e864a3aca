/// Password hashing and verification using Argon2id
use crate::config::SecuritySettings;
use crate::error::{AppError, Result};
use crate::metrics;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::Arc;

const DECOY_PASSWORD: &str = "blog-service:decoy-credential";

/// Argon2id hasher with a cost taken from configuration
///
/// Both operations are CPU bound; the `*_blocking` variants move them onto
/// the blocking thread pool and are what request handlers should call.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Hash of a throwaway password with the same cost, checked when the
    /// account does not exist
    decoy_hash: Arc<str>,
}

impl PasswordHasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AppError::Internal(format!("Invalid Argon2 parameters: {}", e)))?;
        let mut hasher = Self {
            params,
            decoy_hash: Arc::from(""),
        };
        hasher.decoy_hash = Arc::from(hasher.hash(DECOY_PASSWORD)?);
        Ok(hasher)
    }

    pub fn from_settings(settings: &SecuritySettings) -> Result<Self> {
        Self::new(
            settings.argon2_memory_kib,
            settings.argon2_iterations,
            settings.argon2_parallelism,
        )
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt
    /// Returns the PHC string suitable for storage in database
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a stored hash
    ///
    /// Mismatch yields `AuthFailed`; a hash that does not parse is an internal error.
    pub fn verify(&self, password_hash: &str, password: &str) -> Result<()> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash format: {}", e)))?;
        metrics::inc_password_verifications();

        match self.argon2().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(()),
            Err(argon2::password_hash::Error::Password) => Err(AppError::AuthFailed),
            Err(e) => Err(AppError::Internal(format!(
                "Password verification failed: {}",
                e
            ))),
        }
    }

    pub async fn hash_blocking(&self, password: String) -> Result<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password)).await?
    }

    pub async fn verify_blocking(&self, password_hash: String, password: String) -> Result<()> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password_hash, &password)).await?
    }

    /// Spend a full verification on a password that has no account behind it.
    ///
    /// Always ends in `AuthFailed`, taking as long as a real mismatch.
    pub async fn verify_decoy_blocking(&self, password: String) -> Result<()> {
        let decoy_hash = self.decoy_hash.to_string();
        self.verify_blocking(decoy_hash, password).await?;
        Err(AppError::AuthFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_hasher() -> PasswordHasher {
        PasswordHasher::new(1024, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = cheap_hasher();
        let hash = hasher.hash("Sup3rSecret!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(&hash, "Sup3rSecret!").is_ok());
    }

    #[test]
    fn test_wrong_password() {
        let hasher = cheap_hasher();
        let hash = hasher.hash("Sup3rSecret!").unwrap();
        assert!(matches!(
            hasher.verify(&hash, "Sup3rSecret?"),
            Err(AppError::AuthFailed)
        ));
    }

    #[test]
    fn test_salt_is_random() {
        let hasher = cheap_hasher();
        let a = hasher.hash("same-password").unwrap();
        let b = hasher.hash("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_internal_error() {
        let hasher = cheap_hasher();
        assert!(matches!(
            hasher.verify("not-a-phc-string", "whatever"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(PasswordHasher::new(1024, 0, 1).is_err());
    }

    #[test]
    fn test_verify_uses_params_embedded_in_hash() {
        let stronger = PasswordHasher::new(2048, 2, 1).unwrap();
        let hash = stronger.hash("Sup3rSecret!").unwrap();
        assert!(cheap_hasher().verify(&hash, "Sup3rSecret!").is_ok());
    }

    #[tokio::test]
    async fn test_decoy_always_fails_after_verifying() {
        let hasher = cheap_hasher();
        assert!(hasher.decoy_hash.starts_with("$argon2id$"));
        assert!(hasher.decoy_hash.contains("m=1024,t=1,p=1"));

        let before = metrics::password_verifications();
        for password in ["Sup3rSecret!", DECOY_PASSWORD] {
            assert!(matches!(
                hasher.verify_decoy_blocking(password.to_string()).await,
                Err(AppError::AuthFailed)
            ));
        }
        assert!(metrics::password_verifications() >= before + 2);
    }

    #[tokio::test]
    async fn test_blocking_variants() {
        let hasher = cheap_hasher();
        let hash = hasher.hash_blocking("Sup3rSecret!".to_string()).await.unwrap();
        assert!(hasher
            .verify_blocking(hash.clone(), "Sup3rSecret!".to_string())
            .await
            .is_ok());
        assert!(matches!(
            hasher.verify_blocking(hash, "nope".to_string()).await,
            Err(AppError::AuthFailed)
        ));
    }
}
