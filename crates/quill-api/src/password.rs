use anyhow::{Result, anyhow};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{self, SaltString},
};
use rand_core::OsRng;

/// Argon2id hashing with a fresh random salt per password. Hashes are PHC
/// strings, so verification reads its parameters from the stored hash.
#[derive(Debug, Clone, Default)]
pub struct Passwords {
    params: Params,
}

impl Passwords {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("password hashing failed: {}", e))?;
        Ok(hash.to_string())
    }

    /// `Ok(false)` on mismatch; `Err` only if the stored hash is unreadable.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| anyhow!("corrupt password hash: {}", e))?;

        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(anyhow!("password verification failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Passwords {
        Passwords::new(Params::new(8, 1, 1, None).unwrap())
    }

    #[test]
    fn hash_then_verify() {
        let passwords = cheap();
        let hash = passwords.hash("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(passwords.verify("correct horse", &hash).unwrap());
        assert!(!passwords.verify("correct hors", &hash).unwrap());
    }

    #[test]
    fn salts_differ() {
        let passwords = cheap();
        assert_ne!(passwords.hash("same").unwrap(), passwords.hash("same").unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(cheap().verify("x", "not-a-phc-string").is_err());
    }
}
