//! A REST API for tracking personal finances.
//!
//! Users sign up with an email and password and receive a bearer token; every
//! other endpoint is scoped to the user that token was issued to. The API
//! manages expense/income categories, the transactions recorded against them,
//! and a summary endpoint that reports total income, total expenses, and the
//! resulting balance.

use std::time::Duration;

use axum_server::Handle;
use tokio::signal;

pub mod auth;
pub mod db;
pub mod models;
pub mod routes;
pub mod stores;

mod error;
mod state;

pub use error::Error;
pub use routes::build_router;
pub use state::AppState;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
