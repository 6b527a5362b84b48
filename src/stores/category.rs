//! This file defines the SQLite store for transaction categories.

use std::sync::{Arc, Mutex};

use rusqlite::{params_from_iter, Connection, Row, ToSql};
use time::OffsetDateTime;

use crate::{
    db::{CreateTable, MapRow},
    models::{Category, CategoryColor, CategoryName, DatabaseID, UserID},
    Error,
};

/// The filters and paging options for listing a user's categories.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryQuery {
    /// Case-insensitive substring match on the category name.
    pub search: Option<String>,
    /// The maximum number of rows to return.
    pub limit: i64,
    /// The number of rows to skip.
    pub offset: i64,
}

impl Default for CategoryQuery {
    fn default() -> Self {
        Self {
            search: None,
            limit: 10,
            offset: 0,
        }
    }
}

/// The fields of a category that a patch may change.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryChanges {
    pub name: Option<CategoryName>,
    pub color: Option<CategoryColor>,
}

/// Creates, retrieves, updates and deletes categories in a SQLite database.
///
/// Every operation other than `create` takes the owning user's ID and only
/// touches rows that belong to that user.
#[derive(Debug, Clone)]
pub struct SQLiteCategoryStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteCategoryStore {
    /// Create a new store that uses `connection` for persistence.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    /// Create and persist a new category owned by `user_id`.
    ///
    /// # Errors
    /// Returns [Error::DuplicateCategoryName] if the user already has a
    /// category called `name`, or [Error::SqlError] for any other SQL error.
    pub fn create(
        &self,
        user_id: UserID,
        name: CategoryName,
        color: CategoryColor,
    ) -> Result<Category, Error> {
        let now = OffsetDateTime::now_utc();

        self.connection
            .lock()
            .unwrap()
            .query_row(
                "INSERT INTO categories (user_id, name, color, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                RETURNING id, user_id, name, color, created_at, updated_at",
                (user_id.as_i64(), name.as_ref(), color.as_ref(), now, now),
                Self::map_row,
            )
            .map_err(|error| match error {
                rusqlite::Error::SqliteFailure(sql_error, _)
                    if sql_error.extended_code == 2067 =>
                {
                    Error::DuplicateCategoryName
                }
                error => error.into(),
            })
    }

    /// Get the category with the ID `id` belonging to `user_id`.
    ///
    /// # Errors
    /// Returns [Error::CategoryNotFound] if the category does not exist or
    /// belongs to another user.
    pub fn get(&self, id: DatabaseID, user_id: UserID) -> Result<Category, Error> {
        self.connection
            .lock()
            .unwrap()
            .query_row(
                "SELECT id, user_id, name, color, created_at, updated_at
                FROM categories
                WHERE id = ?1 AND user_id = ?2",
                (id, user_id.as_i64()),
                Self::map_row,
            )
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::CategoryNotFound,
                error => error.into(),
            })
    }

    /// List the categories belonging to `user_id`, newest first.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    pub fn get_for_user(&self, user_id: UserID, query: &CategoryQuery) -> Result<Vec<Category>, Error> {
        let mut sql = String::from(
            "SELECT id, user_id, name, color, created_at, updated_at
            FROM categories
            WHERE user_id = ?",
        );
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(user_id.as_i64())];

        if let Some(search) = &query.search {
            sql.push_str(" AND name LIKE ?");
            params.push(Box::new(format!("%{search}%")));
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");
        params.push(Box::new(query.limit));
        params.push(Box::new(query.offset));

        let connection = self.connection.lock().unwrap();
        let mut statement = connection.prepare(&sql)?;

        let categories = statement
            .query_map(params_from_iter(params.iter()), |row| Self::map_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// Apply `changes` to the category with the ID `id` belonging to
    /// `user_id` and return the updated row.
    ///
    /// The ownership check is part of the UPDATE itself, so a row owned by
    /// another user cannot be changed by racing the check.
    ///
    /// # Errors
    /// Returns [Error::CategoryNotFound] if the category does not exist or
    /// belongs to another user, or [Error::DuplicateName] if renaming would
    /// collide with another of the user's categories.
    pub fn update(
        &self,
        id: DatabaseID,
        user_id: UserID,
        changes: &CategoryChanges,
    ) -> Result<Category, Error> {
        let mut set_clauses = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(name) = &changes.name {
            set_clauses.push("name = ?");
            params.push(Box::new(name.as_ref().to_owned()));
        }

        if let Some(color) = &changes.color {
            set_clauses.push("color = ?");
            params.push(Box::new(color.as_ref().to_owned()));
        }

        set_clauses.push("updated_at = ?");
        params.push(Box::new(OffsetDateTime::now_utc()));

        let sql = format!(
            "UPDATE categories SET {}
            WHERE id = ? AND user_id = ?
            RETURNING id, user_id, name, color, created_at, updated_at",
            set_clauses.join(", ")
        );
        params.push(Box::new(id));
        params.push(Box::new(user_id.as_i64()));

        self.connection
            .lock()
            .unwrap()
            .query_row(&sql, params_from_iter(params.iter()), Self::map_row)
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::CategoryNotFound,
                rusqlite::Error::SqliteFailure(sql_error, _)
                    if sql_error.extended_code == 2067 =>
                {
                    Error::DuplicateName
                }
                error => error.into(),
            })
    }

    /// Delete the category with the ID `id` belonging to `user_id` and
    /// return the deleted row.
    ///
    /// Transactions refer to categories by name only, so deleting a category
    /// leaves the user's transactions untouched.
    ///
    /// # Errors
    /// Returns [Error::CategoryNotFound] if the category does not exist or
    /// belongs to another user.
    pub fn delete(&self, id: DatabaseID, user_id: UserID) -> Result<Category, Error> {
        self.connection
            .lock()
            .unwrap()
            .query_row(
                "DELETE FROM categories
                WHERE id = ?1 AND user_id = ?2
                RETURNING id, user_id, name, color, created_at, updated_at",
                (id, user_id.as_i64()),
                Self::map_row,
            )
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::CategoryNotFound,
                error => error.into(),
            })
    }
}

impl CreateTable for SQLiteCategoryStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                name TEXT NOT NULL,
                color TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(user_id, name)
            )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteCategoryStore {
    type ReturnType = Category;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        Ok(Category {
            id: row.get(offset)?,
            user_id: UserID::new(row.get(offset + 1)?),
            name: CategoryName::new_unchecked(&row.get::<_, String>(offset + 2)?),
            color: CategoryColor::new_unchecked(&row.get::<_, String>(offset + 3)?),
            created_at: row.get(offset + 4)?,
            updated_at: row.get(offset + 5)?,
        })
    }
}
