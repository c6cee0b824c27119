// handlers/protected/weekly_topics.rs - per-week syllabus entries
//
// Topics have no owner column of their own; the store resolves ownership
// through the parent course.

use axum::{extract::State, Extension};
use serde::Deserialize;
use serde_json::Value;

use super::or_not_found;
use crate::database::models::{CourseTopics, NewWeeklyTopic, WeeklyTopic, WeeklyTopicStatus};
use crate::error::ApiError;
use crate::handlers::public::auth::validation::present;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

const TOPIC_NOT_FOUND: &str = "Weekly topic not found or unauthorized";

#[derive(Debug, Deserialize)]
pub struct NewWeeklyTopicRequest {
    #[serde(alias = "WeekNumber", alias = "weekNumber")]
    pub week_number: Option<i32>,
    #[serde(alias = "Topic")]
    pub topic: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWeeklyTopicRequest {
    #[serde(alias = "Topic")]
    pub topic: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WeeklyTopicStatusRequest {
    #[serde(alias = "IsFavorite", alias = "isFavorite")]
    pub is_favorite: Option<bool>,
    #[serde(alias = "IsDone", alias = "isDone")]
    pub is_done: Option<bool>,
}

fn required_topic(topic: Option<String>) -> Result<String, ApiError> {
    present(topic).ok_or_else(|| ApiError::invalid_field("topic", "Topic is required"))
}

/// GET /api/weeklyTopics - the caller's courses, each with its topics by week
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<CourseTopics>> {
    let grouped = state.store.list_course_topics(auth.user_id).await?;
    Ok(ApiResponse::success(grouped))
}

/// POST /api/weeklyTopics/:courseId
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(course_id): ApiPath<i64>,
    ApiJson(body): ApiJson<NewWeeklyTopicRequest>,
) -> ApiResult<WeeklyTopic> {
    let week_number = match body.week_number {
        Some(week) if week >= 1 => week,
        _ => return Err(ApiError::invalid_field("week_number", "Week number must be 1 or greater")),
    };
    let topic = required_topic(body.topic)?;

    let created = state
        .store
        .create_weekly_topic(auth.user_id, course_id, NewWeeklyTopic { week_number, topic })
        .await
        .map_err(or_not_found("Course not found or unauthorized"))?;

    tracing::info!(user_id = auth.user_id, course_id, topic_id = created.id, "weekly topic created");
    Ok(ApiResponse::created(created).with_message("Weekly topic added"))
}

/// PUT /api/weeklyTopics/:id - edit the topic text
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateWeeklyTopicRequest>,
) -> ApiResult<WeeklyTopic> {
    let topic = required_topic(body.topic)?;
    let updated = state
        .store
        .update_weekly_topic(auth.user_id, id, topic)
        .await
        .map_err(or_not_found(TOPIC_NOT_FOUND))?;
    Ok(ApiResponse::success(updated).with_message("Weekly topic updated"))
}

/// PATCH /api/weeklyTopics/:id[/status] - favorite/done flags; omitted flags keep their value
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<WeeklyTopicStatusRequest>,
) -> ApiResult<WeeklyTopic> {
    if body.is_favorite.is_none() && body.is_done.is_none() {
        return Err(ApiError::bad_request("Provide is_favorite and/or is_done"));
    }

    let status = WeeklyTopicStatus {
        is_favorite: body.is_favorite,
        is_done: body.is_done,
    };
    let updated = state
        .store
        .update_weekly_topic_status(auth.user_id, id, status)
        .await
        .map_err(or_not_found(TOPIC_NOT_FOUND))?;
    Ok(ApiResponse::success(updated).with_message("Weekly topic status updated"))
}

/// DELETE /api/weeklyTopics/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Value> {
    state
        .store
        .delete_weekly_topic(auth.user_id, id)
        .await
        .map_err(or_not_found(TOPIC_NOT_FOUND))?;
    Ok(ApiResponse::message("Weekly topic deleted"))
}
