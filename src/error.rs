//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// The errors that may occur while handling a request.
///
/// Every variant maps to a stable machine-readable code and an HTTP status so
/// that clients can key off the code rather than the message text.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The signup payload did not contain a name.
    #[error("Name is required")]
    MissingName,

    /// The payload did not contain an email address.
    #[error("Email is required")]
    MissingEmail,

    /// The payload did not contain a password.
    #[error("Password is required")]
    MissingPassword,

    /// The supplied email address is not shaped like `local@domain.tld`.
    #[error("Invalid email format")]
    InvalidEmail,

    /// The supplied password is shorter than the minimum length.
    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,

    /// Another account already uses the normalized email address.
    #[error("Email already exists")]
    EmailExists,

    /// The email/password combination did not match an account.
    ///
    /// This variant deliberately covers both "no such user" and "wrong
    /// password" so the two cases cannot be told apart by the caller.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The request had no bearer authorization header, or the header was
    /// malformed or empty.
    #[error("Authorization token required")]
    MissingToken,

    /// The bearer token was malformed, had an invalid signature, or expired.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token verified but did not encode a user ID.
    #[error("Invalid token payload")]
    InvalidTokenPayload,

    /// The user ID from a structurally valid token no longer maps to a user.
    #[error("User not found")]
    UserNotFound,

    /// The category payload did not contain a color.
    #[error("Color is required")]
    MissingColor,

    /// The category color is not a 6-digit hex string.
    #[error("Color must be in hex format (#rrggbb)")]
    InvalidColorFormat,

    /// The owner already has a category with this name.
    #[error("Category name already exists")]
    DuplicateCategoryName,

    /// The payload tried to set the owner of a row (`userId`/`user_id`).
    #[error("User ID cannot be provided in request body")]
    UserIdNotAllowed,

    /// The path parameter could not be parsed as a numeric ID.
    #[error("Valid ID is required")]
    InvalidId,

    /// A category patch contained a name that is not a non-empty string.
    #[error("Category name is required and must be a non-empty string")]
    InvalidName,

    /// Renaming a category would collide with another of the owner's
    /// categories.
    #[error("Category name already exists")]
    DuplicateName,

    /// A category patch contained a color that is not a 6-digit hex string.
    #[error("Color must be a valid hex format #rrggbb")]
    InvalidColor,

    /// The category does not exist, or belongs to another user.
    ///
    /// Ownership failures are reported as not-found on purpose so that the
    /// existence of other users' rows is not revealed.
    #[error("Category not found")]
    CategoryNotFound,

    /// The transaction title is missing or not a non-empty string.
    #[error("Title is required and must be a non-empty string")]
    InvalidTitle,

    /// The transaction amount is missing, not a number, or not positive.
    #[error("Amount is required and must be a positive number")]
    InvalidAmount,

    /// The transaction type is not `income` or `expense`.
    #[error("Type is required and must be either 'income' or 'expense'")]
    InvalidType,

    /// The transaction category is missing or not a non-empty string.
    #[error("Category is required and must be a non-empty string")]
    InvalidCategory,

    /// The transaction date is missing or not a string.
    #[error("Date is required and must be a valid date string")]
    InvalidDate,

    /// The transaction date string does not parse as a calendar date.
    #[error("Date must be a valid date format")]
    InvalidDateFormat,

    /// The transaction does not exist, or belongs to another user.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// A token could not be signed. This indicates a server misconfiguration
    /// rather than a client mistake.
    #[error("could not create an authentication token")]
    TokenCreation,

    /// An unexpected error in the password hashing library.
    ///
    /// The inner string should only be logged on the server, never returned
    /// to the client.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl Error {
    /// The machine-readable code clients dispatch on.
    pub fn code(&self) -> &'static str {
        match self {
            Error::MissingName => "MISSING_NAME",
            Error::MissingEmail => "MISSING_EMAIL",
            Error::MissingPassword => "MISSING_PASSWORD",
            Error::InvalidEmail => "INVALID_EMAIL",
            Error::PasswordTooShort => "PASSWORD_TOO_SHORT",
            Error::EmailExists => "EMAIL_EXISTS",
            Error::InvalidCredentials => "INVALID_CREDENTIALS",
            Error::MissingToken => "MISSING_TOKEN",
            Error::InvalidToken => "INVALID_TOKEN",
            Error::InvalidTokenPayload => "INVALID_TOKEN_PAYLOAD",
            Error::UserNotFound => "USER_NOT_FOUND",
            Error::MissingColor => "MISSING_COLOR",
            Error::InvalidColorFormat => "INVALID_COLOR_FORMAT",
            Error::DuplicateCategoryName => "DUPLICATE_CATEGORY_NAME",
            Error::UserIdNotAllowed => "USER_ID_NOT_ALLOWED",
            Error::InvalidId => "INVALID_ID",
            Error::InvalidName => "INVALID_NAME",
            Error::DuplicateName => "DUPLICATE_NAME",
            Error::InvalidColor => "INVALID_COLOR",
            Error::CategoryNotFound => "CATEGORY_NOT_FOUND",
            Error::InvalidTitle => "INVALID_TITLE",
            Error::InvalidAmount => "INVALID_AMOUNT",
            Error::InvalidType => "INVALID_TYPE",
            Error::InvalidCategory => "INVALID_CATEGORY",
            Error::InvalidDate => "INVALID_DATE",
            Error::InvalidDateFormat => "INVALID_DATE_FORMAT",
            Error::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            Error::TokenCreation => "SERVER_CONFIGURATION_ERROR",
            Error::HashingError(_) | Error::SqlError(_) => "INTERNAL_ERROR",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingName
            | Error::MissingEmail
            | Error::MissingPassword
            | Error::InvalidEmail
            | Error::PasswordTooShort
            | Error::MissingColor
            | Error::InvalidColorFormat
            | Error::UserIdNotAllowed
            | Error::InvalidId
            | Error::InvalidName
            | Error::InvalidColor
            | Error::InvalidTitle
            | Error::InvalidAmount
            | Error::InvalidType
            | Error::InvalidCategory
            | Error::InvalidDate
            | Error::InvalidDateFormat => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials
            | Error::MissingToken
            | Error::InvalidToken
            | Error::InvalidTokenPayload => StatusCode::UNAUTHORIZED,
            Error::UserNotFound | Error::CategoryNotFound | Error::TransactionNotFound => {
                StatusCode::NOT_FOUND
            }
            Error::EmailExists | Error::DuplicateCategoryName | Error::DuplicateName => {
                StatusCode::CONFLICT
            }
            Error::TokenCreation | Error::HashingError(_) | Error::SqlError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("users.email") =>
            {
                Error::EmailExists
            }
            error => Error::SqlError(error),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Internal errors are logged in full and replaced with a generic
        // message so no library detail reaches the client.
        let message = match &self {
            Error::HashingError(_) | Error::SqlError(_) => {
                tracing::error!("an unexpected error occurred: {}", self);
                "Internal server error".to_owned()
            }
            Error::TokenCreation => {
                tracing::error!("could not sign an authentication token");
                "Internal server error".to_owned()
            }
            error => error.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::http::StatusCode;

    use super::Error;

    #[test]
    fn ownership_failures_map_to_not_found() {
        assert_eq!(Error::CategoryNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::TransactionNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn duplicate_keys_map_to_conflict() {
        assert_eq!(Error::EmailExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            Error::DuplicateCategoryName.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(Error::DuplicateName.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn auth_failures_share_the_unauthorized_status() {
        for error in [
            Error::MissingToken,
            Error::InvalidToken,
            Error::InvalidTokenPayload,
            Error::InvalidCredentials,
        ] {
            assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
        }
    }
}
