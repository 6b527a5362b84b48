//! The endpoints for account creation, login, logout, and the user's own
//! profile.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::{
    auth::{encode_jwt, AuthenticatedUser},
    models::{Email, PasswordHash, UserProfile},
    AppState, Error,
};

/// Handler for creating a new user account.
///
/// Responds with the new user's profile and a signed auth token, so the
/// client is logged in immediately after signing up.
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, Error> {
    let name = payload
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(Error::MissingName)?;

    let raw_email = payload
        .get("email")
        .and_then(Value::as_str)
        .filter(|email| !email.is_empty())
        .ok_or(Error::MissingEmail)?;

    let raw_password = payload
        .get("password")
        .and_then(Value::as_str)
        .filter(|password| !password.is_empty())
        .ok_or(Error::MissingPassword)?;

    let email = Email::new(raw_email)?;
    let password_hash = PasswordHash::new(raw_password)?;

    // The UNIQUE constraint on the email column reports duplicates, so there
    // is no lookup that could race a concurrent signup.
    let user = state
        .user_store
        .create(name.to_owned(), email, password_hash)?;

    let token = encode_jwt(user.id, &user.email, state.encoding_key())?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": UserProfile::from(&user),
            "token": token,
        })),
    ))
}

/// Handler for logging in with an email and password.
///
/// An unknown email and a wrong password both produce
/// [Error::InvalidCredentials] so the response does not reveal which emails
/// have accounts.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, Error> {
    let raw_email = payload
        .get("email")
        .and_then(Value::as_str)
        .filter(|email| !email.is_empty())
        .ok_or(Error::MissingEmail)?;

    let raw_password = payload
        .get("password")
        .and_then(Value::as_str)
        .filter(|password| !password.is_empty())
        .ok_or(Error::MissingPassword)?;

    let email = Email::new(raw_email)?;

    let user = state
        .user_store
        .get_by_email(&email)
        .map_err(|error| match error {
            Error::UserNotFound => Error::InvalidCredentials,
            error => error,
        })?;

    if !user.password_hash.verify(raw_password)? {
        return Err(Error::InvalidCredentials);
    }

    let token = encode_jwt(user.id, &user.email, state.encoding_key())?;

    Ok(Json(json!({
        "user": UserProfile::from(&user),
        "token": token,
    })))
}

/// Handler for logging out.
///
/// Auth is stateless, so the server has nothing to invalidate; discarding
/// the token is the client's responsibility. The endpoint exists so clients
/// have a uniform logout call.
pub async fn logout() -> Json<Value> {
    Json(json!({"message": "Logged out successfully"}))
}

/// Handler for fetching the authenticated user's own profile.
pub async fn profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserProfile>, Error> {
    let user = state.user_store.get_by_id(user.user_id)?;

    Ok(Json(UserProfile::from(&user)))
}
