//! The SQLite-backed stores that persist the application's domain models.
//!
//! Each store owns a clone of the shared database connection and exposes the
//! operations the route handlers need, scoped to the owning user where the
//! model is user-owned.

mod category;
mod transaction;
mod user;

pub use category::{CategoryChanges, CategoryQuery, SQLiteCategoryStore};
pub use transaction::{
    SQLiteTransactionStore, SortField, SortOrder, TransactionChanges, TransactionQuery,
};
pub use user::SQLiteUserStore;
