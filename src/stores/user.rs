//! This file defines the SQLite store for user accounts.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    db::{CreateTable, MapRow},
    models::{Email, PasswordHash, User, UserID},
    Error,
};

/// Creates and retrieves user accounts in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new store that uses `connection` for persistence.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    /// Create and persist a new user account.
    ///
    /// # Errors
    /// Returns [Error::EmailExists] if another account already uses `email`,
    /// or [Error::SqlError] for any other SQL error.
    pub fn create(
        &self,
        name: String,
        email: Email,
        password_hash: PasswordHash,
    ) -> Result<User, Error> {
        let now = OffsetDateTime::now_utc();

        let user = self.connection.lock().unwrap().query_row(
            "INSERT INTO users (name, email, password_hash, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, name, email, password_hash, created_at, updated_at",
            (&name, email.as_str(), password_hash.to_string(), now, now),
            Self::map_row,
        )?;

        Ok(user)
    }

    /// Get the user with the given email address.
    ///
    /// # Errors
    /// Returns [Error::UserNotFound] if no account uses `email`.
    pub fn get_by_email(&self, email: &Email) -> Result<User, Error> {
        self.connection
            .lock()
            .unwrap()
            .query_row(
                "SELECT id, name, email, password_hash, created_at, updated_at
                FROM users
                WHERE email = ?1",
                [email.as_str()],
                Self::map_row,
            )
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::UserNotFound,
                error => error.into(),
            })
    }

    /// Get the user with the given ID.
    ///
    /// # Errors
    /// Returns [Error::UserNotFound] if no account has the ID `id`.
    pub fn get_by_id(&self, id: UserID) -> Result<User, Error> {
        self.connection
            .lock()
            .unwrap()
            .query_row(
                "SELECT id, name, email, password_hash, created_at, updated_at
                FROM users
                WHERE id = ?1",
                [id.as_i64()],
                Self::map_row,
            )
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::UserNotFound,
                error => error.into(),
            })
    }
}

impl CreateTable for SQLiteUserStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteUserStore {
    type ReturnType = User;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        Ok(User {
            id: UserID::new(row.get(offset)?),
            name: row.get(offset + 1)?,
            email: Email::new_unchecked(row.get(offset + 2)?),
            password_hash: PasswordHash::new_unchecked(row.get(offset + 3)?),
            created_at: row.get(offset + 4)?,
            updated_at: row.get(offset + 5)?,
        })
    }
}
