use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash as PhcString,
};
use rand::rngs::OsRng;

/// Argon2 PHC string as stored in `users.password_hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash a plain password with a fresh random salt.
    pub fn from_raw_password(raw_password: &str) -> anyhow::Result<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = Argon2::default()
            .hash_password(raw_password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("hash password: {e}"))?;
        Ok(Self(phc.to_string()))
    }

    /// Wrap a hash read back from the users table. Not checked until `verify`.
    pub fn from_stored(hash: &str) -> Self {
        Self(hash.to_string())
    }

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
    pub fn verify(&self, raw_password: &str) -> anyhow::Result<bool> {
        let parsed =
            PhcString::new(&self.0).map_err(|e| anyhow::anyhow!("parse stored hash: {e}"))?;
        Ok(Argon2::default()
            .verify_password(raw_password.as_bytes(), &parsed)
            .is_ok())
    }

    pub fn into_string(self) -> String {
        self.0
    }
}
