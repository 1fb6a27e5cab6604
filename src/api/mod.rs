//! REST API over the billing and savings calculations.
//!
//! Provides:
//! - `GET /bill?usage=&afa=`: itemised bill
//! - `GET /solve?bill=&afa=`: usage that produces a bill
//! - `GET /incentive?usage=`: incentive band rate
//! - `POST /savings`: savings comparison, with or without battery

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::tariff::RateTable;

pub use types::{IncentiveResponse, SavingsRequest, SolveResponse};

/// Immutable application state shared across all request handlers.
///
/// Only the tariff is shared; every request computes a fresh result, so
/// concurrent requests never interfere.
pub struct AppState {
    /// Tariff applied to every calculation.
    pub rates: RateTable,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/bill", get(handlers::get_bill))
        .route("/solve", get(handlers::get_solve))
        .route("/incentive", get(handlers::get_incentive))
        .route("/savings", post(handlers::post_savings))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
