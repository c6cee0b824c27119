// handlers/public/auth/signup.rs - POST /signup and POST /api/users

use axum::extract::State;
use serde::Deserialize;

use super::validation::{normalize_email, present, validate_email_format, validate_password};
use crate::auth::password::hash_password;
use crate::database::models::{NewUser, User};
use crate::database::StoreError;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

/// Account creation body. The browser client sends PascalCase keys.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Email")]
    pub email: Option<String>,
    #[serde(alias = "Password")]
    pub password: Option<String>,
    #[serde(alias = "profilePicUrl", alias = "ProfilePicUrl")]
    pub profile_pic_url: Option<String>,
}

/**
 * POST /signup - Create an account from the browser signup form
 *
 * Expected Input:
 * ```json
 * { "Name": "Ada", "Email": "ada@uni.edu", "Password": "at least 8 chars" }
 * ```
 *
 * Expected Output (201):
 * ```json
 * { "success": true, "message": "User created successfully", "data": { "id": 1, "name": "Ada", ... } }
 * ```
 *
 * 400 when a field is missing or invalid, 409 when the email is taken.
 */
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> ApiResult<User> {
    let user = create_account(&state, body).await?;
    Ok(ApiResponse::created(user).with_message("User created successfully"))
}

/// POST /api/users - programmatic registration, same rules as `/signup`
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> ApiResult<User> {
    let user = create_account(&state, body).await?;
    Ok(ApiResponse::created(user).with_message("User registered successfully"))
}

async fn create_account(state: &AppState, body: SignupRequest) -> Result<User, ApiError> {
    let (Some(name), Some(email), Some(password)) =
        (present(body.name), present(body.email), body.password.filter(|p| !p.is_empty()))
    else {
        return Err(ApiError::bad_request("All fields are required"));
    };

    let email = normalize_email(&email);
    validate_email_format(&email)?;
    validate_password(&password)?;

    let password_hash = hash_password(password, state.config.security.bcrypt_cost).await?;

    let user = state
        .store
        .create_user(NewUser {
            name,
            email,
            password_hash,
            profile_pic_url: present(body.profile_pic_url),
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::conflict("Email is already registered"),
            other => other.into(),
        })?;

    tracing::info!(user_id = user.id, "account created");
    Ok(user)
}
