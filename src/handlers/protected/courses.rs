use axum::{extract::State, Extension};
use serde::Deserialize;
use serde_json::Value;

use super::or_not_found;
use crate::database::models::{Course, CourseInput};
use crate::error::ApiError;
use crate::handlers::public::auth::validation::present;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

const COURSE_NOT_FOUND: &str = "Course not found or unauthorized";

#[derive(Debug, Deserialize)]
pub struct CourseRequest {
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Code")]
    pub code: Option<String>,
    #[serde(alias = "OutlineFileUrl", alias = "outlineFileUrl")]
    pub outline_file_url: Option<String>,
}

impl CourseRequest {
    fn into_input(self) -> Result<CourseInput, ApiError> {
        let name = present(self.name).ok_or_else(|| ApiError::invalid_field("name", "Course name is required"))?;
        let code = present(self.code).ok_or_else(|| ApiError::invalid_field("code", "Course code is required"))?;
        Ok(CourseInput {
            name,
            code,
            outline_file_url: present(self.outline_file_url),
        })
    }
}

/// GET /api/courses - the caller's courses, oldest first
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<Course>> {
    let courses = state.store.list_courses(auth.user_id).await?;
    Ok(ApiResponse::success(courses))
}

/// GET /api/courses/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Course> {
    let course = state
        .store
        .get_course(auth.user_id, id)
        .await
        .map_err(or_not_found(COURSE_NOT_FOUND))?;
    Ok(ApiResponse::success(course))
}

/// POST /api/courses
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<CourseRequest>,
) -> ApiResult<Course> {
    let course = state
        .store
        .create_course(auth.user_id, body.into_input()?)
        .await
        .map_err(or_not_found("User not found"))?;
    tracing::info!(user_id = auth.user_id, course_id = course.id, "course created");
    Ok(ApiResponse::created(course).with_message("Course created successfully"))
}

/// PUT /api/courses/:id - replaces name, code and outline
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<CourseRequest>,
) -> ApiResult<Course> {
    let course = state
        .store
        .update_course(auth.user_id, id, body.into_input()?)
        .await
        .map_err(or_not_found(COURSE_NOT_FOUND))?;
    Ok(ApiResponse::success(course).with_message("Course updated successfully"))
}

/// DELETE /api/courses/:id - also removes the course's weekly and covered topics
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Value> {
    state
        .store
        .delete_course(auth.user_id, id)
        .await
        .map_err(or_not_found(COURSE_NOT_FOUND))?;
    tracing::info!(user_id = auth.user_id, course_id = id, "course deleted");
    Ok(ApiResponse::message("Course deleted successfully"))
}
