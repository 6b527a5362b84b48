//! This file defines the type that handles password validation and hashing.

use std::fmt::Display;

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::Error;

/// The minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A salted and hashed password.
///
/// The hash is deliberately excluded from all response types; it only ever
/// travels between the request handlers and the database.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Validate `raw_password` and hash it with the library's default cost.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::PasswordTooShort] if the password has fewer than
    ///   [MIN_PASSWORD_LENGTH] characters,
    /// - [Error::HashingError] if the underlying hashing library fails.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        if raw_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::PasswordTooShort);
        }

        hash(raw_password, DEFAULT_COST)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Create a new `PasswordHash` from an existing hash string, without
    /// hashing or validation.
    ///
    /// The caller should ensure the string is a valid bcrypt hash, e.g. one
    /// read back from the database.
    pub fn new_unchecked(raw_password_hash: String) -> Self {
        Self(raw_password_hash)
    }

    /// Check that `raw_password` matches the stored hash.
    ///
    /// # Errors
    /// Returns an [Error::HashingError] if the underlying library fails,
    /// e.g. the stored string is not a valid hash.
    pub fn verify(&self, raw_password: &str) -> Result<bool, Error> {
        verify(raw_password, &self.0).map_err(|error| Error::HashingError(error.to_string()))
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod password_tests {
    use crate::Error;

    use super::{PasswordHash, MIN_PASSWORD_LENGTH};

    #[test]
    fn new_fails_on_short_password() {
        let raw_password = "a".repeat(MIN_PASSWORD_LENGTH - 1);

        assert_eq!(
            PasswordHash::new(&raw_password),
            Err(Error::PasswordTooShort)
        );
    }

    #[test]
    fn new_accepts_minimum_length_password() {
        let raw_password = "a".repeat(MIN_PASSWORD_LENGTH);

        assert!(PasswordHash::new(&raw_password).is_ok());
    }

    #[test]
    fn hash_does_not_contain_raw_password() {
        let raw_password = "averysafeandsecurepassword";

        let hash = PasswordHash::new(raw_password).unwrap();

        assert!(!hash.to_string().contains(raw_password));
    }

    #[test]
    fn verify_accepts_correct_password() {
        let raw_password = "averysafeandsecurepassword";
        let hash = PasswordHash::new(raw_password).unwrap();

        assert_eq!(hash.verify(raw_password), Ok(true));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = PasswordHash::new("averysafeandsecurepassword").unwrap();

        assert_eq!(hash.verify("definitelyNotThePassword"), Ok(false));
    }
}
