//! This file defines the type `Transaction`, the core type of the finance
//! tracking part of the application.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use time::{macros::format_description, Date, OffsetDateTime};

use crate::{
    models::{DatabaseID, UserID},
    Error,
};

/// Parse a calendar date in `YYYY-MM-DD` form.
///
/// # Errors
/// Returns [Error::InvalidDate] if `raw_date` does not parse as a valid
/// calendar date.
pub fn parse_date(raw_date: &str) -> Result<Date, Error> {
    Date::parse(raw_date, format_description!("[year]-[month]-[day]"))
        .map_err(|_| Error::InvalidDate)
}

/// The error returned when a string is not a valid transaction type.
#[derive(Debug, ThisError, PartialEq)]
#[error("'{0}' is not a valid transaction type")]
pub struct ParseTransactionTypeError(String);

/// Whether a transaction records money earned or money spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money was earned.
    Income,
    /// Money was spent.
    Expense,
}

impl TransactionType {
    /// The type as the string stored in the database and sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl FromStr for TransactionType {
    type Err = ParseTransactionTypeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(ParseTransactionTypeError(other.to_string())),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An income or expense, i.e. an event where money was either earned or
/// spent. Exclusively owned by one user.
///
/// `category` is a free-text string that matches a [Category](crate::models::Category)
/// name by convention only; renaming or deleting a category does not cascade
/// into existing transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseID,
    /// The ID of the user that owns this transaction.
    pub user_id: UserID,
    /// A short description of what the transaction was for.
    pub title: String,
    /// The amount of money earned or spent, always positive.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The name of the category this transaction belongs to.
    pub category: String,
    /// The calendar date the transaction happened.
    pub date: Date,
    /// When the transaction row was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction row was last modified.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The validated data needed to create a new [Transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// A short description of what the transaction was for.
    pub title: String,
    /// The amount of money earned or spent, always positive.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub transaction_type: TransactionType,
    /// The name of the category this transaction belongs to.
    pub category: String,
    /// The calendar date the transaction happened.
    pub date: Date,
}

#[cfg(test)]
mod transaction_type_tests {
    use super::TransactionType;

    #[test]
    fn parse_accepts_both_variants() {
        assert_eq!("income".parse(), Ok(TransactionType::Income));
        assert_eq!("expense".parse(), Ok(TransactionType::Expense));
    }

    #[test]
    fn parse_rejects_other_strings() {
        for raw in ["Income", "EXPENSE", "transfer", ""] {
            assert!(
                raw.parse::<TransactionType>().is_err(),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn serializes_to_lowercase() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Income).unwrap(),
            "\"income\""
        );
    }
}
