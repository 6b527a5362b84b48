//! The HTTP routes of the REST API.
//!
//! Each submodule holds the handlers for one resource. Handlers validate the
//! raw JSON payloads field by field so that each failure maps to its own
//! machine-readable error code.

mod category;
mod summary;
mod transaction;
mod user;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::{AppState, Error};

/// Assemble the application's endpoints into a router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/signup", post(user::signup))
        .route("/login", post(user::login))
        .route("/logout", post(user::logout))
        .route("/profile", get(user::profile))
        .route(
            "/categories",
            get(category::get_categories).post(category::create_category),
        )
        .route(
            "/categories/:category_id",
            patch(category::update_category).delete(category::delete_category),
        )
        .route(
            "/transactions",
            get(transaction::get_transactions).post(transaction::create_transaction),
        )
        .route(
            "/transactions/:transaction_id",
            patch(transaction::update_transaction).delete(transaction::delete_transaction),
        )
        .route("/summary", get(summary::get_summary))
        .with_state(state)
}

/// Reject payloads that try to set the owner of a row.
///
/// Row ownership always comes from the auth token, never from the request
/// body.
fn reject_user_id_field(payload: &serde_json::Value) -> Result<(), Error> {
    if payload.get("userId").is_some() || payload.get("user_id").is_some() {
        return Err(Error::UserIdNotAllowed);
    }

    Ok(())
}

/// Parse a path segment as a row ID.
fn parse_id_param(raw_id: &str) -> Result<crate::models::DatabaseID, Error> {
    raw_id.parse().map_err(|_| Error::InvalidId)
}

/// Clamp the `limit` query parameter to at most 100 rows, defaulting to 10.
///
/// Negative limits are clamped to zero; SQLite would otherwise treat them as
/// "no limit".
fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(10).clamp(0, 100)
}

#[cfg(test)]
pub(crate) mod testing {
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{json, Value};

    use crate::{build_router, AppState};

    pub fn new_test_server() -> TestServer {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "testsecret")
            .expect("Could not create app state.");

        TestServer::new(build_router(state)).expect("Could not create test server.")
    }

    /// Sign up a user and return the auth token from the response.
    pub async fn sign_up_test_user(server: &TestServer, email: &str) -> String {
        let response = server
            .post("/signup")
            .json(&json!({
                "name": "Test User",
                "email": email,
                "password": "averysecurepassword",
            }))
            .await;

        response.json::<Value>()["token"]
            .as_str()
            .expect("Signup response should contain a token.")
            .to_owned()
    }
}
