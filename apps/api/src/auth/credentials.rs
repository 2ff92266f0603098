use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential hashing failed: {0}")]
    Hash(argon2::password_hash::Error),

    #[error("stored credential hash is malformed")]
    MalformedHash,
}

/// One-way argon2id hash with an embedded random salt.
pub fn hash_credential(plain: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(CredentialError::Hash)
}

/// Compares `plain` against a stored hash. A wrong secret is `Ok(false)`,
/// not an error.
pub fn verify_credential(plain: &str, stored: &str) -> Result<bool, CredentialError> {
    let parsed = PasswordHash::new(stored).map_err(|_| CredentialError::MalformedHash)?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CredentialError::Hash(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_credential("correct horse").unwrap();
        assert_ne!(hash, "correct horse");
        assert!(verify_credential("correct horse", &hash).unwrap());
        assert!(!verify_credential("battery staple", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_credential("same secret").unwrap();
        let b = hash_credential("same secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(matches!(
            verify_credential("anything", "not-a-phc-string"),
            Err(CredentialError::MalformedHash)
        ));
    }
}
