use axum::{extract::State, Extension};
use serde::Deserialize;

use super::or_not_found;
use crate::database::models::{CoveredTopic, CoveredTopicInput, CoveredTopicStatus};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CoveredTopicRequest {
    #[serde(alias = "WeeklyTopicId", alias = "weeklyTopicId")]
    pub weekly_topic_id: Option<i64>,
    #[serde(alias = "IsFavorite", alias = "isFavorite")]
    pub is_favorite: Option<bool>,
    #[serde(alias = "IsRevised", alias = "isRevised")]
    pub is_revised: Option<bool>,
}

/// GET /api/coveredTopics - every topic of the caller's courses with its covered flags
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<CoveredTopicStatus>> {
    let topics = state.store.list_covered_topics(auth.user_id).await?;
    Ok(ApiResponse::success(topics))
}

/// POST /api/coveredTopics - create or update the caller's mark on a weekly topic
pub async fn upsert(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<CoveredTopicRequest>,
) -> ApiResult<CoveredTopic> {
    let weekly_topic_id = body
        .weekly_topic_id
        .ok_or_else(|| ApiError::invalid_field("weekly_topic_id", "Weekly topic id is required"))?;

    let covered = state
        .store
        .upsert_covered_topic(
            auth.user_id,
            CoveredTopicInput {
                weekly_topic_id,
                is_favorite: body.is_favorite,
                is_revised: body.is_revised,
            },
        )
        .await
        .map_err(or_not_found("Weekly topic not found or unauthorized"))?;

    Ok(ApiResponse::success(covered).with_message("Covered topic saved"))
}
