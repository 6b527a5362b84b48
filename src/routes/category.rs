//! The endpoints for managing a user's transaction categories.

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
    models::{Category, CategoryColor, CategoryName},
    stores::{CategoryChanges, CategoryQuery},
    AppState, Error,
};

use super::{clamp_limit, parse_id_param, reject_user_id_field};

/// The accepted query parameters for the category list.
#[derive(Debug, Deserialize)]
pub struct CategoryListParams {
    search: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// Handler for listing the authenticated user's categories, newest first.
pub async fn get_categories(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<CategoryListParams>,
) -> Result<Json<Vec<Category>>, Error> {
    let query = CategoryQuery {
        search: params.search,
        limit: clamp_limit(params.limit),
        offset: params.offset.unwrap_or(0),
    };

    let categories = state.category_store.get_for_user(user.user_id, &query)?;

    Ok(Json(categories))
}

/// Handler for creating a category for the authenticated user.
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, Error> {
    reject_user_id_field(&payload)?;

    let name = payload
        .get("name")
        .and_then(Value::as_str)
        .ok_or(Error::MissingName)
        .and_then(|name| CategoryName::new(name).map_err(|_| Error::MissingName))?;

    let color = payload
        .get("color")
        .and_then(Value::as_str)
        .ok_or(Error::MissingColor)
        .and_then(CategoryColor::new)?;

    let category = state.category_store.create(user.user_id, name, color)?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Handler for patching one of the authenticated user's categories.
///
/// The category's existence is checked before the patch fields are
/// validated, so a patch against a missing or foreign category reports
/// not-found rather than a validation error.
pub async fn update_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(raw_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Category>, Error> {
    let id = parse_id_param(&raw_id)?;
    reject_user_id_field(&payload)?;

    state.category_store.get(id, user.user_id)?;

    let name = match payload.get("name") {
        Some(raw_name) => {
            let raw_name = raw_name.as_str().ok_or(Error::InvalidName)?;
            Some(CategoryName::new(raw_name)?)
        }
        None => None,
    };

    let color = match payload.get("color") {
        Some(raw_color) => {
            let raw_color = raw_color.as_str().ok_or(Error::InvalidColor)?;
            Some(CategoryColor::new(raw_color).map_err(|_| Error::InvalidColor)?)
        }
        None => None,
    };

    let category = state
        .category_store
        .update(id, user.user_id, &CategoryChanges { name, color })?;

    Ok(Json(category))
}

/// Handler for deleting one of the authenticated user's categories.
///
/// The deleted row is echoed back so clients can offer an undo, and the
/// user's transactions keep their category names.
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, Error> {
    let id = parse_id_param(&raw_id)?;

    let category = state.category_store.delete(id, user.user_id)?;

    Ok(Json(json!({
        "message": "Category deleted successfully",
        "deletedCategory": category,
    })))
}
