//! This file defines the `Category` type and the validated types needed to
//! create one. A category is a user-scoped label with a display color;
//! transactions refer to categories by name only, not by ID.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    models::{DatabaseID, UserID},
    Error,
};

/// The name of a category.
///
/// Names are trimmed and must not be empty after trimming.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    /// Returns [Error::InvalidName] if `name` is empty after trimming.
    pub fn new(name: &str) -> Result<Self, Error> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            Err(Error::InvalidName)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is trimmed and non-empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A display color in `#rrggbb` hex notation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryColor(String);

impl CategoryColor {
    /// Create a category color.
    ///
    /// # Errors
    /// Returns [Error::InvalidColorFormat] unless `color` is a `#` followed
    /// by exactly six hex digits.
    pub fn new(color: &str) -> Result<Self, Error> {
        let digits = color.strip_prefix('#').ok_or(Error::InvalidColorFormat)?;

        if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(color.to_string()))
        } else {
            Err(Error::InvalidColorFormat)
        }
    }

    /// Create a category color without validation.
    ///
    /// The caller should ensure that the string is a valid `#rrggbb` color.
    pub fn new_unchecked(color: &str) -> Self {
        Self(color.to_string())
    }
}

impl AsRef<str> for CategoryColor {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A category for expenses and income, e.g. 'Groceries', 'Eating Out',
/// 'Wages'. Exclusively owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The ID of the category.
    pub id: DatabaseID,
    /// The ID of the user that owns this category.
    pub user_id: UserID,
    /// The name of the category, unique per owner.
    pub name: CategoryName,
    /// The category's display color.
    pub color: CategoryColor,
    /// When the category was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the category was last modified.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
