//! API route configuration.

use crate::api::handlers::{
    ban_link_handler, create_link_handler, delete_link_handler, ping_handler, show_link_handler,
    stats_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Link management and statistics routes, nested under `/api`.
///
/// # Endpoints
///
/// - `GET    /ping`                 - Liveness probe
/// - `POST   /v1/links`             - Create a signed link
/// - `GET    /v1/links/{id}`        - Show a link and its click counter
/// - `DELETE /v1/links/{id}`        - Soft-delete a link
/// - `POST   /v1/links/{id}/ban`    - Ban a link
/// - `GET    /v1/links/{id}/stats`  - Hourly series and k-anonymous breakdowns
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/v1/links", post(create_link_handler))
        .route(
            "/v1/links/{id}",
            get(show_link_handler).delete(delete_link_handler),
        )
        .route("/v1/links/{id}/ban", post(ban_link_handler))
        .route("/v1/links/{id}/stats", get(stats_handler))
}
