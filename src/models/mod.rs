//! The domain models of the application: users, categories and transactions,
//! along with the validated newtypes used to construct them.

mod category;
mod email;
mod password;
mod transaction;
mod user;

pub use category::{Category, CategoryColor, CategoryName};
pub use email::Email;
pub use password::PasswordHash;
pub use transaction::{
    parse_date, NewTransaction, ParseTransactionTypeError, Transaction, TransactionType,
};
pub use user::{User, UserID, UserProfile};

/// Alias for the integer type used for database primary keys.
pub type DatabaseID = i64;
