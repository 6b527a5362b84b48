//! The endpoint that aggregates a user's transactions into a financial
//! summary.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthenticatedUser,
    models::{parse_date, TransactionType},
    AppState, Error,
};

/// The accepted query parameters for the summary.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
    start_date: Option<String>,
    end_date: Option<String>,
}

/// A user's financial position, optionally restricted to a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// The sum of all matching income amounts.
    pub total_income: f64,
    /// The sum of all matching expense amounts.
    pub total_expenses: f64,
    /// Income minus expenses. Negative when the user spent more than they
    /// earned.
    pub current_balance: f64,
}

/// Handler for computing the authenticated user's financial summary.
pub async fn get_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<SummaryParams>,
) -> Result<Json<Summary>, Error> {
    let start_date = params.start_date.as_deref().map(parse_date).transpose()?;
    let end_date = params.end_date.as_deref().map(parse_date).transpose()?;

    let total_income = state.transaction_store.sum_for_user(
        user.user_id,
        TransactionType::Income,
        start_date,
        end_date,
    )?;
    let total_expenses = state.transaction_store.sum_for_user(
        user.user_id,
        TransactionType::Expense,
        start_date,
        end_date,
    )?;

    Ok(Json(Summary {
        total_income,
        total_expenses,
        current_balance: total_income - total_expenses,
    }))
}
