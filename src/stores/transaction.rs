//! This file defines the SQLite store for transactions, including the query
//! options for the filtered, sorted, paginated transaction list and the sum
//! queries backing the financial summary.

use std::sync::{Arc, Mutex};

use rusqlite::{params_from_iter, Connection, Row, ToSql};
use time::{Date, OffsetDateTime};

use crate::{
    db::{CreateTable, MapRow},
    models::{DatabaseID, NewTransaction, Transaction, TransactionType, UserID},
    Error,
};

/// The column a transaction list is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Date,
    Amount,
    Title,
    CreatedAt,
}

impl SortField {
    /// Map a query string value to a sort field.
    ///
    /// Unrecognized values fall back to sorting by date rather than failing
    /// the request.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw {
            Some("amount") => SortField::Amount,
            Some("title") => SortField::Title,
            Some("createdAt") => SortField::CreatedAt,
            _ => SortField::Date,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            SortField::Date => "date",
            SortField::Amount => "amount",
            SortField::Title => "title",
            SortField::CreatedAt => "created_at",
        }
    }
}

/// The direction a transaction list is sorted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    /// Map a query string value to a sort order, defaulting to descending.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw {
            Some("asc") => SortOrder::Ascending,
            _ => SortOrder::Descending,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// The filters, sorting and paging options for listing a user's transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionQuery {
    /// Case-insensitive substring match on the transaction title.
    pub search: Option<String>,
    /// Only return transactions of this type.
    pub transaction_type: Option<TransactionType>,
    /// Only return transactions with exactly this category name.
    pub category: Option<String>,
    /// Only return transactions on or after this date.
    pub start_date: Option<Date>,
    /// Only return transactions on or before this date.
    pub end_date: Option<Date>,
    pub sort: SortField,
    pub order: SortOrder,
    /// The maximum number of rows to return.
    pub limit: i64,
    /// The number of rows to skip.
    pub offset: i64,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            search: None,
            transaction_type: None,
            category: None,
            start_date: None,
            end_date: None,
            sort: SortField::default(),
            order: SortOrder::default(),
            limit: 10,
            offset: 0,
        }
    }
}

/// The fields of a transaction that a patch may change.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionChanges {
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub transaction_type: Option<TransactionType>,
    pub category: Option<String>,
    pub date: Option<Date>,
}

/// Creates, retrieves, updates and deletes transactions in a SQLite database.
///
/// Every operation other than `create` takes the owning user's ID and only
/// touches rows that belong to that user.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store that uses `connection` for persistence.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    /// Create and persist a new transaction owned by `user_id`.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    pub fn create(
        &self,
        user_id: UserID,
        transaction: NewTransaction,
    ) -> Result<Transaction, Error> {
        let now = OffsetDateTime::now_utc();

        let transaction = self.connection.lock().unwrap().query_row(
            "INSERT INTO transactions (user_id, title, amount, type, category, date, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING id, user_id, title, amount, type, category, date, created_at, updated_at",
            (
                user_id.as_i64(),
                &transaction.title,
                transaction.amount,
                transaction.transaction_type.as_str(),
                &transaction.category,
                transaction.date,
                now,
                now,
            ),
            Self::map_row,
        )?;

        Ok(transaction)
    }

    /// List the transactions belonging to `user_id` that match `query`,
    /// sorted by the requested field with the row ID as a tie-breaker.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    pub fn get_for_user(
        &self,
        user_id: UserID,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, Error> {
        let mut sql = String::from(
            "SELECT id, user_id, title, amount, type, category, date, created_at, updated_at
            FROM transactions
            WHERE user_id = ?",
        );
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(user_id.as_i64())];

        if let Some(search) = &query.search {
            sql.push_str(" AND title LIKE ?");
            params.push(Box::new(format!("%{search}%")));
        }

        if let Some(transaction_type) = query.transaction_type {
            sql.push_str(" AND type = ?");
            params.push(Box::new(transaction_type.as_str()));
        }

        if let Some(category) = &query.category {
            sql.push_str(" AND category = ?");
            params.push(Box::new(category.clone()));
        }

        if let Some(start_date) = query.start_date {
            sql.push_str(" AND date >= ?");
            params.push(Box::new(start_date));
        }

        if let Some(end_date) = query.end_date {
            sql.push_str(" AND date <= ?");
            params.push(Box::new(end_date));
        }

        sql.push_str(&format!(
            " ORDER BY {} {}, id ASC LIMIT ? OFFSET ?",
            query.sort.column(),
            query.order.keyword()
        ));
        params.push(Box::new(query.limit));
        params.push(Box::new(query.offset));

        let connection = self.connection.lock().unwrap();
        let mut statement = connection.prepare(&sql)?;

        let transactions = statement
            .query_map(params_from_iter(params.iter()), |row| Self::map_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Apply `changes` to the transaction with the ID `id` belonging to
    /// `user_id` and return the updated row.
    ///
    /// The ownership check is part of the UPDATE itself, so a row owned by
    /// another user cannot be changed by racing the check.
    ///
    /// # Errors
    /// Returns [Error::TransactionNotFound] if the transaction does not
    /// exist or belongs to another user.
    pub fn update(
        &self,
        id: DatabaseID,
        user_id: UserID,
        changes: &TransactionChanges,
    ) -> Result<Transaction, Error> {
        let mut set_clauses = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(title) = &changes.title {
            set_clauses.push("title = ?");
            params.push(Box::new(title.clone()));
        }

        if let Some(amount) = changes.amount {
            set_clauses.push("amount = ?");
            params.push(Box::new(amount));
        }

        if let Some(transaction_type) = changes.transaction_type {
            set_clauses.push("type = ?");
            params.push(Box::new(transaction_type.as_str()));
        }

        if let Some(category) = &changes.category {
            set_clauses.push("category = ?");
            params.push(Box::new(category.clone()));
        }

        if let Some(date) = changes.date {
            set_clauses.push("date = ?");
            params.push(Box::new(date));
        }

        set_clauses.push("updated_at = ?");
        params.push(Box::new(OffsetDateTime::now_utc()));

        let sql = format!(
            "UPDATE transactions SET {}
            WHERE id = ? AND user_id = ?
            RETURNING id, user_id, title, amount, type, category, date, created_at, updated_at",
            set_clauses.join(", ")
        );
        params.push(Box::new(id));
        params.push(Box::new(user_id.as_i64()));

        self.connection
            .lock()
            .unwrap()
            .query_row(&sql, params_from_iter(params.iter()), Self::map_row)
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound,
                error => error.into(),
            })
    }

    /// Delete the transaction with the ID `id` belonging to `user_id` and
    /// return the deleted row.
    ///
    /// # Errors
    /// Returns [Error::TransactionNotFound] if the transaction does not
    /// exist or belongs to another user.
    pub fn delete(&self, id: DatabaseID, user_id: UserID) -> Result<Transaction, Error> {
        self.connection
            .lock()
            .unwrap()
            .query_row(
                "DELETE FROM transactions
                WHERE id = ?1 AND user_id = ?2
                RETURNING id, user_id, title, amount, type, category, date, created_at, updated_at",
                (id, user_id.as_i64()),
                Self::map_row,
            )
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound,
                error => error.into(),
            })
    }

    /// Sum the amounts of the user's transactions of `transaction_type`,
    /// optionally restricted to a date range. Returns zero when no rows
    /// match.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    pub fn sum_for_user(
        &self,
        user_id: UserID,
        transaction_type: TransactionType,
        start_date: Option<Date>,
        end_date: Option<Date>,
    ) -> Result<f64, Error> {
        let mut sql = String::from(
            "SELECT COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE user_id = ? AND type = ?",
        );
        let mut params: Vec<Box<dyn ToSql>> = vec![
            Box::new(user_id.as_i64()),
            Box::new(transaction_type.as_str()),
        ];

        if let Some(start_date) = start_date {
            sql.push_str(" AND date >= ?");
            params.push(Box::new(start_date));
        }

        if let Some(end_date) = end_date {
            sql.push_str(" AND date <= ?");
            params.push(Box::new(end_date));
        }

        let total = self.connection.lock().unwrap().query_row(
            &sql,
            params_from_iter(params.iter()),
            |row| row.get(0),
        )?;

        Ok(total)
    }
}

impl CreateTable for SQLiteTransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                title TEXT NOT NULL,
                amount REAL NOT NULL,
                type TEXT NOT NULL,
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteTransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_type: String = row.get(offset + 4)?;
        let transaction_type = raw_type.parse().map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 4,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })?;

        Ok(Transaction {
            id: row.get(offset)?,
            user_id: UserID::new(row.get(offset + 1)?),
            title: row.get(offset + 2)?,
            amount: row.get(offset + 3)?,
            transaction_type,
            category: row.get(offset + 5)?,
            date: row.get(offset + 6)?,
            created_at: row.get(offset + 7)?,
            updated_at: row.get(offset + 8)?,
        })
    }
}

#[cfg(test)]
mod transaction_store_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::{Date, Month};

    use crate::{
        db::initialize,
        models::{Email, NewTransaction, PasswordHash, TransactionType, UserID},
        stores::SQLiteUserStore,
        Error,
    };

    use super::{
        SQLiteTransactionStore, SortField, SortOrder, TransactionChanges, TransactionQuery,
    };

    fn get_store_and_user() -> (SQLiteTransactionStore, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        let user = SQLiteUserStore::new(connection.clone())
            .create(
                "Test".to_owned(),
                Email::new_unchecked("foo@bar.baz".to_owned()),
                PasswordHash::new_unchecked("definitelyahash".to_owned()),
            )
            .unwrap();

        (SQLiteTransactionStore::new(connection), user.id)
    }

    fn date(year: i32, month: Month, day: u8) -> Date {
        Date::from_calendar_date(year, month, day).unwrap()
    }

    fn new_transaction(
        title: &str,
        amount: f64,
        transaction_type: TransactionType,
        transaction_date: Date,
    ) -> NewTransaction {
        NewTransaction {
            title: title.to_owned(),
            amount,
            transaction_type,
            category: "General".to_owned(),
            date: transaction_date,
        }
    }

    #[test]
    fn create_returns_the_persisted_transaction() {
        let (store, user_id) = get_store_and_user();
        let transaction_date = date(2024, Month::March, 1);

        let transaction = store
            .create(
                user_id,
                new_transaction("Coffee", 4.5, TransactionType::Expense, transaction_date),
            )
            .unwrap();

        assert_eq!(transaction.user_id, user_id);
        assert_eq!(transaction.title, "Coffee");
        assert_eq!(transaction.amount, 4.5);
        assert_eq!(transaction.transaction_type, TransactionType::Expense);
        assert_eq!(transaction.category, "General");
        assert_eq!(transaction.date, transaction_date);
    }

    #[test]
    fn get_for_user_filters_by_type_and_category() {
        let (store, user_id) = get_store_and_user();
        let transaction_date = date(2024, Month::March, 1);
        store
            .create(
                user_id,
                new_transaction("Wages", 1000.0, TransactionType::Income, transaction_date),
            )
            .unwrap();
        store
            .create(
                user_id,
                new_transaction("Coffee", 4.5, TransactionType::Expense, transaction_date),
            )
            .unwrap();

        let transactions = store
            .get_for_user(
                user_id,
                &TransactionQuery {
                    transaction_type: Some(TransactionType::Expense),
                    category: Some("General".to_owned()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].title, "Coffee");
    }

    #[test]
    fn get_for_user_filters_by_date_range() {
        let (store, user_id) = get_store_and_user();
        for day in 1..=5 {
            store
                .create(
                    user_id,
                    new_transaction(
                        &format!("Day {day}"),
                        1.0,
                        TransactionType::Expense,
                        date(2024, Month::March, day),
                    ),
                )
                .unwrap();
        }

        let transactions = store
            .get_for_user(
                user_id,
                &TransactionQuery {
                    start_date: Some(date(2024, Month::March, 2)),
                    end_date: Some(date(2024, Month::March, 4)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(transactions.len(), 3);
    }

    #[test]
    fn get_for_user_filters_by_title_search() {
        let (store, user_id) = get_store_and_user();
        let transaction_date = date(2024, Month::March, 1);
        store
            .create(
                user_id,
                new_transaction("Morning coffee", 4.5, TransactionType::Expense, transaction_date),
            )
            .unwrap();
        store
            .create(
                user_id,
                new_transaction("Groceries", 80.0, TransactionType::Expense, transaction_date),
            )
            .unwrap();

        let transactions = store
            .get_for_user(
                user_id,
                &TransactionQuery {
                    search: Some("coffee".to_owned()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].title, "Morning coffee");
    }

    #[test]
    fn get_for_user_sorts_by_amount_ascending() {
        let (store, user_id) = get_store_and_user();
        let transaction_date = date(2024, Month::March, 1);
        for amount in [30.0, 10.0, 20.0] {
            store
                .create(
                    user_id,
                    new_transaction("Item", amount, TransactionType::Expense, transaction_date),
                )
                .unwrap();
        }

        let transactions = store
            .get_for_user(
                user_id,
                &TransactionQuery {
                    sort: SortField::Amount,
                    order: SortOrder::Ascending,
                    ..Default::default()
                },
            )
            .unwrap();

        let amounts: Vec<f64> = transactions.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn get_for_user_defaults_to_newest_date_first() {
        let (store, user_id) = get_store_and_user();
        for day in [3, 1, 2] {
            store
                .create(
                    user_id,
                    new_transaction(
                        &format!("Day {day}"),
                        1.0,
                        TransactionType::Expense,
                        date(2024, Month::March, day),
                    ),
                )
                .unwrap();
        }

        let transactions = store
            .get_for_user(user_id, &TransactionQuery::default())
            .unwrap();

        let titles: Vec<&str> = transactions.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Day 3", "Day 2", "Day 1"]);
    }

    #[test]
    fn get_for_user_applies_limit_and_offset() {
        let (store, user_id) = get_store_and_user();
        for day in 1..=5 {
            store
                .create(
                    user_id,
                    new_transaction(
                        &format!("Day {day}"),
                        1.0,
                        TransactionType::Expense,
                        date(2024, Month::March, day),
                    ),
                )
                .unwrap();
        }

        let transactions = store
            .get_for_user(
                user_id,
                &TransactionQuery {
                    limit: 2,
                    offset: 2,
                    ..Default::default()
                },
            )
            .unwrap();

        let titles: Vec<&str> = transactions.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Day 3", "Day 2"]);
    }

    #[test]
    fn update_changes_only_the_given_fields() {
        let (store, user_id) = get_store_and_user();
        let transaction = store
            .create(
                user_id,
                new_transaction("Coffee", 4.5, TransactionType::Expense, date(2024, Month::March, 1)),
            )
            .unwrap();

        let updated = store
            .update(
                transaction.id,
                user_id,
                &TransactionChanges {
                    amount: Some(5.0),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.amount, 5.0);
        assert_eq!(updated.title, "Coffee");
        assert_eq!(updated.date, transaction.date);
        assert_eq!(updated.created_at, transaction.created_at);
    }

    #[test]
    fn update_with_no_fields_refreshes_updated_at_only() {
        let (store, user_id) = get_store_and_user();
        let transaction = store
            .create(
                user_id,
                new_transaction("Coffee", 4.5, TransactionType::Expense, date(2024, Month::March, 1)),
            )
            .unwrap();

        let updated = store
            .update(transaction.id, user_id, &TransactionChanges::default())
            .unwrap();

        assert_eq!(updated.title, transaction.title);
        assert_eq!(updated.amount, transaction.amount);
        assert_eq!(updated.transaction_type, transaction.transaction_type);
        assert_eq!(updated.category, transaction.category);
        assert_eq!(updated.date, transaction.date);
        assert_eq!(updated.created_at, transaction.created_at);
        assert!(updated.updated_at > transaction.updated_at);
    }

    #[test]
    fn update_fails_for_another_users_transaction() {
        let (store, user_id) = get_store_and_user();
        let other_user_id = SQLiteUserStore::new(store.connection.clone())
            .create(
                "Other".to_owned(),
                Email::new_unchecked("other@bar.baz".to_owned()),
                PasswordHash::new_unchecked("definitelyahash".to_owned()),
            )
            .unwrap()
            .id;
        let transaction = store
            .create(
                user_id,
                new_transaction("Coffee", 4.5, TransactionType::Expense, date(2024, Month::March, 1)),
            )
            .unwrap();

        let result = store.update(
            transaction.id,
            other_user_id,
            &TransactionChanges {
                title: Some("Stolen".to_owned()),
                ..Default::default()
            },
        );

        assert_eq!(result.err(), Some(Error::TransactionNotFound));
    }

    #[test]
    fn delete_returns_the_deleted_transaction() {
        let (store, user_id) = get_store_and_user();
        let transaction = store
            .create(
                user_id,
                new_transaction("Coffee", 4.5, TransactionType::Expense, date(2024, Month::March, 1)),
            )
            .unwrap();

        let deleted = store.delete(transaction.id, user_id).unwrap();

        assert_eq!(deleted.id, transaction.id);
        assert_eq!(
            store.delete(transaction.id, user_id).err(),
            Some(Error::TransactionNotFound)
        );
    }

    #[test]
    fn sum_for_user_totals_by_type() {
        let (store, user_id) = get_store_and_user();
        let transaction_date = date(2024, Month::March, 1);
        store
            .create(
                user_id,
                new_transaction("Wages", 1000.0, TransactionType::Income, transaction_date),
            )
            .unwrap();
        store
            .create(
                user_id,
                new_transaction("Coffee", 4.5, TransactionType::Expense, transaction_date),
            )
            .unwrap();
        store
            .create(
                user_id,
                new_transaction("Groceries", 80.5, TransactionType::Expense, transaction_date),
            )
            .unwrap();

        let income = store
            .sum_for_user(user_id, TransactionType::Income, None, None)
            .unwrap();
        let expenses = store
            .sum_for_user(user_id, TransactionType::Expense, None, None)
            .unwrap();

        assert_eq!(income, 1000.0);
        assert_eq!(expenses, 85.0);
    }

    #[test]
    fn sum_for_user_returns_zero_without_matching_rows() {
        let (store, user_id) = get_store_and_user();

        let total = store
            .sum_for_user(user_id, TransactionType::Income, None, None)
            .unwrap();

        assert_eq!(total, 0.0);
    }

    #[test]
    fn sum_for_user_respects_date_range() {
        let (store, user_id) = get_store_and_user();
        for day in 1..=5 {
            store
                .create(
                    user_id,
                    new_transaction(
                        &format!("Day {day}"),
                        10.0,
                        TransactionType::Expense,
                        date(2024, Month::March, day),
                    ),
                )
                .unwrap();
        }

        let total = store
            .sum_for_user(
                user_id,
                TransactionType::Expense,
                Some(date(2024, Month::March, 2)),
                Some(date(2024, Month::March, 4)),
            )
            .unwrap();

        assert_eq!(total, 30.0);
    }
}
