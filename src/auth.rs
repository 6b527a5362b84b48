//! Token issuance, verification, and the auth gate applied to every
//! protected endpoint.
//!
//! Tokens are JWTs signed with a process-wide secret. The [AuthenticatedUser]
//! extractor resolves the bearer token on a request into the owning user's
//! ID; every repository and aggregator operation is then scoped to that ID.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    models::{Email, UserID},
    AppState, Error,
};

/// How long an issued token stays valid.
pub const TOKEN_DURATION: Duration = Duration::days(7);

/// The contents of an auth token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The expiry time of the token as a unix timestamp.
    pub exp: usize,
    /// The time the token was issued as a unix timestamp.
    pub iat: usize,
    /// The ID of the user the token was issued to.
    ///
    /// Optional on the wire so that a structurally valid token without a
    /// user ID can be rejected with its own error code.
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// The email associated with the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
}

/// Sign a token asserting the identity of `user_id` for [TOKEN_DURATION].
///
/// # Errors
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_jwt(
    user_id: UserID,
    email: &Email,
    encoding_key: &EncodingKey,
) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        exp: (now + TOKEN_DURATION).unix_timestamp() as usize,
        iat: now.unix_timestamp() as usize,
        user_id: Some(user_id.as_i64()),
        email: Some(email.clone()),
    };

    encode(&Header::default(), &claims, encoding_key).map_err(|_| Error::TokenCreation)
}

/// Verify a token's signature and expiry and return its claims.
///
/// # Errors
/// Returns [Error::InvalidToken] if the token is malformed, has an invalid
/// signature, or expired.
pub fn decode_jwt(token: &str, decoding_key: &DecodingKey) -> Result<TokenData<Claims>, Error> {
    decode(token, decoding_key, &Validation::default()).map_err(|_| Error::InvalidToken)
}

/// The identity resolved from a request's bearer token.
///
/// Use this as an extractor on protected route handlers. Requests without a
/// well-formed `Authorization: Bearer <token>` header are rejected with
/// [Error::MissingToken], tokens that fail verification with
/// [Error::InvalidToken], and verified tokens without a user ID with
/// [Error::InvalidTokenPayload].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthenticatedUser {
    /// The ID of the user the request's token was issued to.
    pub user_id: UserID,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| Error::MissingToken)?;

        if bearer.token().is_empty() {
            return Err(Error::MissingToken);
        }

        let state = AppState::from_ref(state);
        let token_data = decode_jwt(bearer.token(), state.decoding_key())?;

        match token_data.claims.user_id {
            Some(id) => Ok(Self {
                user_id: UserID::new(id),
            }),
            None => Err(Error::InvalidTokenPayload),
        }
    }
}

#[cfg(test)]
mod jwt_tests {
    use jsonwebtoken::{encode, DecodingKey, EncodingKey, Header};
    use serde_json::json;
    use time::OffsetDateTime;

    use crate::{
        models::{Email, UserID},
        Error,
    };

    use super::{decode_jwt, encode_jwt};

    fn get_test_keys() -> (EncodingKey, DecodingKey) {
        let secret = "foobar";

        (
            EncodingKey::from_secret(secret.as_ref()),
            DecodingKey::from_secret(secret.as_ref()),
        )
    }

    #[test]
    fn decode_jwt_gives_back_user_id_and_email() {
        let (encoding_key, decoding_key) = get_test_keys();
        let email = Email::new("averyemail@email.com").unwrap();

        let jwt = encode_jwt(UserID::new(42), &email, &encoding_key).unwrap();
        let claims = decode_jwt(&jwt, &decoding_key).unwrap().claims;

        assert_eq!(claims.user_id, Some(42));
        assert_eq!(claims.email, Some(email));
    }

    #[test]
    fn decode_jwt_fails_with_wrong_secret() {
        let (encoding_key, _) = get_test_keys();
        let email = Email::new("averyemail@email.com").unwrap();
        let jwt = encode_jwt(UserID::new(42), &email, &encoding_key).unwrap();

        let result = decode_jwt(&jwt, &DecodingKey::from_secret("notthesecret".as_ref()));

        assert_eq!(result.err(), Some(Error::InvalidToken));
    }

    #[test]
    fn decode_jwt_fails_with_garbage_token() {
        let (_, decoding_key) = get_test_keys();

        let result = decode_jwt("not.a.token", &decoding_key);

        assert_eq!(result.err(), Some(Error::InvalidToken));
    }

    #[test]
    fn decode_jwt_fails_with_expired_token() {
        let (encoding_key, decoding_key) = get_test_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = json!({
            "userId": 42,
            "iat": now - 120,
            "exp": now - 60,
        });
        let jwt = encode(&Header::default(), &claims, &encoding_key).unwrap();

        let result = decode_jwt(&jwt, &decoding_key);

        assert_eq!(result.err(), Some(Error::InvalidToken));
    }

    #[test]
    fn decode_jwt_accepts_token_without_user_id() {
        // The extractor is responsible for rejecting these with
        // INVALID_TOKEN_PAYLOAD; decoding itself should succeed.
        let (encoding_key, decoding_key) = get_test_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = json!({
            "iat": now,
            "exp": now + 3600,
        });
        let jwt = encode(&Header::default(), &claims, &encoding_key).unwrap();

        let claims = decode_jwt(&jwt, &decoding_key).unwrap().claims;

        assert_eq!(claims.user_id, None);
    }
}
