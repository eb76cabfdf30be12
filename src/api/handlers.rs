use axum::{extract::State, Json};
use serde_json::json;

use super::error::ApiError;
use super::state::AppState;
use crate::db::queries::fetch_all_rankings;
use crate::services::aggregator::refill_user_funding;
use crate::types::models::RankingRecord;

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn get_rankings(
    State(ctx): State<AppState>,
) -> Result<Json<Vec<RankingRecord>>, ApiError> {
    let rankings = fetch_all_rankings(&ctx.db)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
    Ok(Json(rankings))
}

// Admin entry point for the historical re-credit job; not on the schedule.
pub async fn refill_funding(
    State(ctx): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let processed = refill_user_funding(&ctx)
        .await
        .map_err(|e| ApiError::UpstreamError(e.to_string()))?;
    Ok(Json(json!({ "events_processed": processed })))
}
