//! Handler for short link redirects.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use crate::application::services::{VisitMode, Visitor};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Resolves a signed slug to its destination.
///
/// # Endpoint
///
/// `GET /r/{slug}` counts a visit; `HEAD /r/{slug}` only checks that the
/// link would resolve and leaves its counter untouched.
///
/// # Responses
///
/// - **302 Found**: `Location` set, `Cache-Control: no-store`
/// - **404 Not Found**: malformed, forged, missing, banned, expired or
///   exhausted links, all indistinguishable
/// - **500 Internal Server Error**: storage failure
pub async fn redirect_handler(
    method: Method,
    Path(slug): Path<String>,
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let mode = if method == Method::HEAD {
        VisitMode::Probe
    } else {
        VisitMode::Count
    };

    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let visitor = Visitor {
        referrer: header_str(header::REFERER),
        user_agent: header_str(header::USER_AGENT),
        ip: Some(client_ip(&headers, addr, state.behind_proxy)),
    };

    let resolution = state.redirect_service.resolve(&slug, mode, visitor).await?;

    match resolution.location {
        Some(location) if resolution.outcome.is_ok() => Ok(found(location)),
        _ => Ok(not_found()),
    }
}

fn found(location: String) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, location),
            (header::CACHE_CONTROL, "no-store".to_string()),
            (
                header::REFERRER_POLICY,
                "strict-origin-when-cross-origin".to_string(),
            ),
        ],
    )
        .into_response()
}

/// The single response used for every rejected slug.
fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}
