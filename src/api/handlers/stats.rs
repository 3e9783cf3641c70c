//! Handler for per-link click statistics.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::api::dto::stats::{StatsQuery, StatsResponse};
use crate::application::services::StatsRange;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the hourly series and k-anonymous breakdowns of a link.
///
/// # Endpoint
///
/// `GET /api/v1/links/{id}/stats?range=1d|7d|30d`
///
/// # Response
///
/// ```json
/// {
///   "range": "7d",
///   "from": "2025-11-05T10:00:00Z",
///   "to": "2025-11-12T10:00:00Z",
///   "series": [{ "ts_hour": "2025-11-12T09:00:00Z", "count": 12 }],
///   "by_referrer": [{ "bucket": "direct", "count": 9 }],
///   "by_country": [{ "bucket": "unknown", "count": 12 }],
///   "by_device": [{ "bucket": "mobile", "count": 7 }],
///   "k_anon": 5
/// }
/// ```
///
/// Breakdown buckets below `k_anon` are omitted, so their sums may be lower
/// than the series total.
///
/// # Errors
///
/// Returns 404 Not Found if the link does not exist or was deleted.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    let range = StatsRange::parse(query.range.as_deref());
    let report = state.stats_service.link_stats(id, range).await?;

    Ok(Json(report.into()))
}
