//! This file defines a validated, normalized email address type.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A normalized (trimmed, lowercased) email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Create and validate an email address.
    ///
    /// The address is trimmed and lowercased before validation, so two
    /// spellings of the same address compare equal and hit the same
    /// uniqueness constraint.
    ///
    /// An address is accepted when it is shaped like `local@domain.tld`:
    /// exactly one `@`, a non-empty local part, at least one `.` in the
    /// domain with characters on both sides, and no whitespace anywhere.
    ///
    /// # Errors
    /// Returns [Error::InvalidEmail] if `raw_email` does not have that shape.
    pub fn new(raw_email: &str) -> Result<Self, Error> {
        let normalized = raw_email.trim().to_lowercase();

        if normalized.chars().any(char::is_whitespace) {
            return Err(Error::InvalidEmail);
        }

        let (local, domain) = normalized.split_once('@').ok_or(Error::InvalidEmail)?;

        if local.is_empty() || domain.contains('@') {
            return Err(Error::InvalidEmail);
        }

        match domain.rsplit_once('.') {
            Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(Self(normalized)),
            _ => Err(Error::InvalidEmail),
        }
    }

    /// Create a new `Email` without any validation.
    ///
    /// This should only be used for addresses that were validated before
    /// persistence, e.g. when mapping database rows.
    pub fn new_unchecked(raw_email: String) -> Self {
        Self(raw_email)
    }

    /// The email address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
