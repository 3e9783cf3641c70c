//! Handlers for link management endpoints (create, show, ban, delete).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::link::{CreateLinkRequest, CreatedLinkResponse, LinkResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a signed short link.
///
/// # Endpoint
///
/// `POST /api/v1/links`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/page",
///   "expires_at": "2030-01-01T00:00:00Z",
///   "max_clicks": 100,
///   "domain_scope": ["example.com"]
/// }
/// ```
///
/// Only `url` is required.
///
/// # Errors
///
/// Returns 400 Bad Request if the URL or any limit is rejected.
pub async fn create_link_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<CreatedLinkResponse>), AppError> {
    if let Err(e) = payload.validate() {
        state
            .metrics
            .counter_inc("link_create_total", &[("result", "invalid")], 1.0)
            .await?;
        return Err(e.into());
    }

    let link = state.link_service.create(payload.into()).await?;
    let short_url = state.short_url(&link.slug);

    Ok((
        StatusCode::CREATED,
        Json(CreatedLinkResponse::new(link, short_url)),
    ))
}

/// Returns a link with its click counter.
///
/// # Endpoint
///
/// `GET /api/v1/links/{id}`
///
/// # Errors
///
/// Returns 404 Not Found if the link does not exist or was deleted.
pub async fn show_link_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.show(id).await?;
    let short_url = state.short_url(&link.slug);

    Ok(Json(LinkResponse::new(link, short_url)))
}

/// Soft-deletes a link.
///
/// # Endpoint
///
/// `DELETE /api/v1/links/{id}`
///
/// # Errors
///
/// Returns 404 Not Found if the link does not exist or was already deleted.
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Bans a link; its slug stops resolving immediately.
///
/// # Endpoint
///
/// `POST /api/v1/links/{id}/ban`
///
/// # Errors
///
/// Returns 404 Not Found if the link does not exist or was deleted.
pub async fn ban_link_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.link_service.ban(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
