// handlers/protected/users.rs - the caller's own account
//
// `/api/users/:id` exists for older clients and only ever resolves the
// caller's own id; any other id is indistinguishable from a missing user.

use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::or_not_found;
use crate::auth::password::hash_password;
use crate::database::models::{User, UserUpdate};
use crate::database::StoreError;
use crate::error::ApiError;
use crate::handlers::public::auth::validation::{
    normalize_email, present, validate_email_format, validate_password,
};
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

const USER_NOT_FOUND: &str = "User not found";

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Email")]
    pub email: Option<String>,
    #[serde(alias = "Password")]
    pub password: Option<String>,
    #[serde(alias = "profilePicUrl", alias = "ProfilePicUrl")]
    pub profile_pic_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdated {
    pub user: User,
    /// Set when the login email changed
    #[serde(rename = "forceRelogin")]
    pub force_relogin: bool,
}

/// GET /api/users/me
pub async fn me_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<User> {
    let user = state
        .store
        .get_user(auth.user_id)
        .await
        .map_err(or_not_found(USER_NOT_FOUND))?;
    Ok(ApiResponse::success(user))
}

/// PUT /api/users/me
pub async fn me_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> ApiResult<ProfileUpdated> {
    update_profile(&state, auth.user_id, body).await
}

/// DELETE /api/users/me - removes the account and everything it owns
pub async fn me_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Value> {
    delete_account(&state, auth.user_id).await
}

/// GET /api/users/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<User> {
    ensure_self(auth, id)?;
    me_get(State(state), Extension(auth)).await
}

/// PUT /api/users/:id
pub async fn put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> ApiResult<ProfileUpdated> {
    ensure_self(auth, id)?;
    update_profile(&state, auth.user_id, body).await
}

/// DELETE /api/users/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Value> {
    ensure_self(auth, id)?;
    delete_account(&state, auth.user_id).await
}

fn ensure_self(auth: AuthUser, id: i64) -> Result<(), ApiError> {
    if auth.user_id != id {
        tracing::debug!(user_id = auth.user_id, requested = id, "user lookup outside own account");
        return Err(ApiError::not_found(USER_NOT_FOUND));
    }
    Ok(())
}

async fn update_profile(state: &AppState, user_id: i64, body: UpdateUserRequest) -> ApiResult<ProfileUpdated> {
    let email = match present(body.email) {
        Some(raw) => {
            let email = normalize_email(&raw);
            validate_email_format(&email)?;
            Some(email)
        }
        None => None,
    };

    let password_hash = match body.password.filter(|p| !p.is_empty()) {
        Some(password) => {
            validate_password(&password)?;
            Some(hash_password(password, state.config.security.bcrypt_cost).await?)
        }
        None => None,
    };

    let update = UserUpdate {
        name: present(body.name),
        email,
        profile_pic_url: present(body.profile_pic_url),
        password_hash,
    };

    let updated = state
        .store
        .update_user(user_id, update)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::conflict("Email is already registered"),
            other => or_not_found(USER_NOT_FOUND)(other),
        })?;

    if updated.email_changed {
        tracing::info!(user_id, "login email changed");
    }

    Ok(ApiResponse::success(ProfileUpdated {
        user: updated.user,
        force_relogin: updated.email_changed,
    })
    .with_message("Profile updated"))
}

async fn delete_account(state: &AppState, user_id: i64) -> ApiResult<Value> {
    state
        .store
        .delete_user(user_id)
        .await
        .map_err(or_not_found(USER_NOT_FOUND))?;
    tracing::info!(user_id, "account deleted");
    Ok(ApiResponse::message("User deleted successfully"))
}
