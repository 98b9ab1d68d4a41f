//! Argon2id password hashing

use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as _;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use rand::Rng;

use crate::error::AuthError;

/// Hashes and verifies passwords as Argon2id PHC strings.
///
/// The async methods run on the blocking pool so request handlers never hash
/// on a runtime worker.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl PasswordHasher {
    /// Creates a hasher with explicit cost parameters.
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|err| AuthError::Hashing(err.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes `password` with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let mut bytes = [0u8; 16];
        rand::rng().fill(&mut bytes);
        let salt =
            SaltString::encode_b64(&bytes).map_err(|err| AuthError::Hashing(err.to_string()))?;

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| AuthError::Hashing(err.to_string()))
    }

    /// Checks `password` against a stored PHC string.
    ///
    /// A wrong password is `Ok(false)`; an unparseable hash is an error.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|err| AuthError::Hashing(err.to_string()))?;
        Ok(self
            .argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// [`hash`](Self::hash) on the blocking pool.
    pub async fn hash_async(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|err| AuthError::Hashing(err.to_string()))?
    }

    /// [`verify`](Self::verify) on the blocking pool.
    pub async fn verify_async(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let hasher = self.clone();
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|err| AuthError::Hashing(err.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_params(1024, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hasher().hash("Secret123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher().verify("Secret123", &hash).unwrap());
        assert!(!hasher().verify("secret123", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hasher().hash("Secret123").unwrap();
        let b = hasher().hash("Secret123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_unparseable_hash_is_error() {
        assert!(matches!(
            hasher().verify("Secret123", "plaintext"),
            Err(AuthError::Hashing(_))
        ));
    }

    #[tokio::test]
    async fn test_async_variants() {
        let hash = hasher().hash_async("Secret123").await.unwrap();
        assert!(hasher().verify_async("Secret123", &hash).await.unwrap());
    }
}
