//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;

use crate::{
    db::initialize,
    stores::{SQLiteCategoryStore, SQLiteTransactionStore, SQLiteUserStore},
    Error,
};

/// The keys for signing and verifying auth tokens, derived once from the
/// process-wide secret.
#[derive(Clone)]
struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

/// The state of the REST server.
///
/// The JWT secret is injected here at startup; a process without a secret
/// fails fast instead of discovering the gap per-request.
#[derive(Clone)]
pub struct AppState {
    /// The store for managing [users](crate::models::User).
    pub user_store: SQLiteUserStore,
    /// The store for managing user [categories](crate::models::Category).
    pub category_store: SQLiteCategoryStore,
    /// The store for managing user [transactions](crate::models::Transaction).
    pub transaction_store: SQLiteTransactionStore,
    jwt_keys: JwtKeys,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models.
    ///
    /// # Errors
    /// Returns an error if the database could not be initialized.
    pub fn new(db_connection: Connection, jwt_secret: &str) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            user_store: SQLiteUserStore::new(connection.clone()),
            category_store: SQLiteCategoryStore::new(connection.clone()),
            transaction_store: SQLiteTransactionStore::new(connection),
            jwt_keys: JwtKeys {
                encoding_key: EncodingKey::from_secret(jwt_secret.as_ref()),
                decoding_key: DecodingKey::from_secret(jwt_secret.as_ref()),
            },
        })
    }

    /// The encoding key for signing auth tokens.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.jwt_keys.encoding_key
    }

    /// The decoding key for verifying auth tokens.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.jwt_keys.decoding_key
    }
}
