//! Password hashing and login validation.
//!
//! Passwords are stored as Argon2id PHC strings; every login also needs a
//! valid TOTP code for the user's two-factor secret.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

pub mod totp;

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("invalid two factor code")]
    InvalidTwoFactorCode,
    #[error("password hash error: {0}")]
    PasswordHash(argon2::password_hash::Error),
}

/// Credential checks used by login and by every route that re-authenticates
/// the user before minting secrets.
pub trait Authenticator: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String, AuthenticationError>;

    /// `Ok(false)` for a wrong password, `Err(InvalidTwoFactorCode)` for a
    /// wrong TOTP code.
    fn validate_login(
        &self,
        hashed_password: &str,
        password: &str,
        two_factor_secret: &str,
        totp_code: &str,
    ) -> Result<bool, AuthenticationError>;
}

#[derive(Clone, Debug, Default)]
pub struct Argon2Authenticator;

impl Authenticator for Argon2Authenticator {
    fn hash_password(&self, password: &str) -> Result<String, AuthenticationError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(AuthenticationError::PasswordHash)?;
        Ok(hash.to_string())
    }

    fn validate_login(
        &self,
        hashed_password: &str,
        password: &str,
        two_factor_secret: &str,
        totp_code: &str,
    ) -> Result<bool, AuthenticationError> {
        let parsed_hash =
            PasswordHash::new(hashed_password).map_err(AuthenticationError::PasswordHash)?;

        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_err()
        {
            return Ok(false);
        }

        if !totp::verify_code(two_factor_secret, totp_code) {
            return Err(AuthenticationError::InvalidTwoFactorCode);
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::random_string;

    #[test]
    fn test_hash_and_validate_login() {
        let auth = Argon2Authenticator;
        let secret = random_string();
        let hash = auth.hash_password("my-secure-password-123!").unwrap();
        assert!(hash.starts_with("$argon2"));

        let code = totp::current_code(&secret).unwrap();
        assert!(
            auth.validate_login(&hash, "my-secure-password-123!", &secret, &code)
                .unwrap()
        );
        assert!(
            !auth
                .validate_login(&hash, "wrong-password", &secret, &code)
                .unwrap()
        );
    }

    #[test]
    fn test_wrong_totp_code_is_an_error() {
        let auth = Argon2Authenticator;
        let secret = random_string();
        let hash = auth.hash_password("hunter2hunter2").unwrap();

        let result = auth.validate_login(&hash, "hunter2hunter2", &secret, "abcdef");
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidTwoFactorCode)
        ));
    }

    #[test]
    fn test_hash_produces_different_salts() {
        let auth = Argon2Authenticator;
        let hash1 = auth.hash_password("same-password").unwrap();
        let hash2 = auth.hash_password("same-password").unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_invalid_hash_format() {
        let auth = Argon2Authenticator;
        let result = auth.validate_login("not-a-valid-hash", "password", "ABC", "123456");
        assert!(matches!(result, Err(AuthenticationError::PasswordHash(_))));
    }
}
