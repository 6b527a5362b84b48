//! The endpoints for recording and managing a user's transactions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    auth::AuthenticatedUser,
    models::{parse_date, NewTransaction, Transaction, TransactionType},
    stores::{SortField, SortOrder, TransactionChanges, TransactionQuery},
    AppState, Error,
};

use super::{clamp_limit, parse_id_param, reject_user_id_field};

/// The accepted query parameters for the transaction list.
///
/// `sort` and `order` are free strings so that unknown values can fall back
/// to the defaults instead of failing the request; the same goes for `type`,
/// which is ignored unless it names a real transaction type.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListParams {
    search: Option<String>,
    #[serde(rename = "type")]
    transaction_type: Option<String>,
    category: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    sort: Option<String>,
    order: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// Handler for listing the authenticated user's transactions with optional
/// filtering, sorting and paging.
pub async fn get_transactions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<TransactionListParams>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let query = TransactionQuery {
        search: params.search,
        transaction_type: params
            .transaction_type
            .as_deref()
            .and_then(|raw| raw.parse().ok()),
        category: params.category,
        start_date: params.start_date.as_deref().map(parse_date).transpose()?,
        end_date: params.end_date.as_deref().map(parse_date).transpose()?,
        sort: SortField::parse_or_default(params.sort.as_deref()),
        order: SortOrder::parse_or_default(params.order.as_deref()),
        limit: clamp_limit(params.limit),
        offset: params.offset.unwrap_or(0),
    };

    let transactions = state
        .transaction_store
        .get_for_user(user.user_id, &query)?;

    Ok(Json(transactions))
}

/// Handler for recording a new transaction for the authenticated user.
pub async fn create_transaction(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, Error> {
    reject_user_id_field(&payload)?;

    let title = payload
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .ok_or(Error::InvalidTitle)?;

    let amount = payload
        .get("amount")
        .and_then(Value::as_f64)
        .filter(|&amount| amount > 0.0)
        .ok_or(Error::InvalidAmount)?;

    let transaction_type: TransactionType = payload
        .get("type")
        .and_then(Value::as_str)
        .ok_or(Error::InvalidType)?
        .parse()
        .map_err(|_| Error::InvalidType)?;

    let category = payload
        .get("category")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .ok_or(Error::InvalidCategory)?;

    let raw_date = payload
        .get("date")
        .and_then(Value::as_str)
        .ok_or(Error::InvalidDate)?;
    let date = parse_date(raw_date).map_err(|_| Error::InvalidDateFormat)?;

    let transaction = state.transaction_store.create(
        user.user_id,
        NewTransaction {
            title: title.to_owned(),
            amount,
            transaction_type,
            category: category.to_owned(),
            date,
        },
    )?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Handler for patching one of the authenticated user's transactions.
///
/// The patch fields are validated before the row is touched; the ownership
/// check is part of the update statement itself.
pub async fn update_transaction(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(raw_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Transaction>, Error> {
    let id = parse_id_param(&raw_id)?;
    reject_user_id_field(&payload)?;

    let amount = match payload.get("amount") {
        Some(raw_amount) => Some(
            raw_amount
                .as_f64()
                .filter(|&amount| amount > 0.0)
                .ok_or(Error::InvalidAmount)?,
        ),
        None => None,
    };

    let transaction_type = match payload.get("type") {
        Some(raw_type) => Some(
            raw_type
                .as_str()
                .ok_or(Error::InvalidType)?
                .parse::<TransactionType>()
                .map_err(|_| Error::InvalidType)?,
        ),
        None => None,
    };

    let date = match payload.get("date") {
        Some(raw_date) => {
            let raw_date = raw_date.as_str().ok_or(Error::InvalidDate)?;
            Some(parse_date(raw_date)?)
        }
        None => None,
    };

    let title = match payload.get("title") {
        Some(raw_title) => Some(
            raw_title
                .as_str()
                .map(str::trim)
                .filter(|title| !title.is_empty())
                .ok_or(Error::InvalidTitle)?
                .to_owned(),
        ),
        None => None,
    };

    let category = match payload.get("category") {
        Some(raw_category) => Some(
            raw_category
                .as_str()
                .map(str::trim)
                .filter(|category| !category.is_empty())
                .ok_or(Error::InvalidCategory)?
                .to_owned(),
        ),
        None => None,
    };

    let transaction = state.transaction_store.update(
        id,
        user.user_id,
        &TransactionChanges {
            title,
            amount,
            transaction_type,
            category,
            date,
        },
    )?;

    Ok(Json(transaction))
}

/// Handler for deleting one of the authenticated user's transactions.
///
/// The deleted row is echoed back so clients can offer an undo.
pub async fn delete_transaction(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, Error> {
    let id = parse_id_param(&raw_id)?;

    let transaction = state.transaction_store.delete(id, user.user_id)?;

    Ok(Json(json!({
        "message": "Transaction deleted successfully",
        "transaction": transaction,
    })))
}
