//! Handler for the metrics exposition endpoint.

use axum::{extract::State, http::header, response::IntoResponse};

use crate::application::services::metrics_service::EXPOSITION_CONTENT_TYPE;
use crate::error::AppError;
use crate::state::AppState;

/// Renders every counter and histogram in text exposition format.
///
/// # Endpoint
///
/// `GET /metrics`
///
/// # Errors
///
/// Returns 500 Internal Server Error if the metrics store is unreachable.
pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.render().await?;
    Ok(([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], body))
}
