// handlers/public/auth/login.rs - POST /login

use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{normalize_email, present};
use crate::auth::password::verify_password;
use crate::error::ApiError;
use crate::middleware::ApiJson;
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "Email")]
    pub email: Option<String>,
    #[serde(alias = "Password")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Login keeps a flat body: the browser client reads `token` at the top level.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: LoginUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/**
 * POST /login - Verify credentials and issue a bearer token
 *
 * Expected Input:
 * ```json
 * { "Email": "ada@uni.edu", "Password": "..." }
 * ```
 *
 * Expected Output:
 * ```json
 * {
 *   "success": true,
 *   "message": "Login successful",
 *   "user": { "id": 1, "name": "Ada", "email": "ada@uni.edu" },
 *   "token": "eyJhbGciOiJIUzI1NiI...",
 *   "expires_at": "2024-01-08T00:00:00Z"
 * }
 * ```
 *
 * Unknown email and wrong password give the same 401.
 */
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(email), Some(password)) = (present(body.email), body.password.filter(|p| !p.is_empty()))
    else {
        return Err(ApiError::bad_request("All fields are required"));
    };

    let email = normalize_email(&email);
    let Some(credentials) = state.store.find_user_by_email(&email).await? else {
        tracing::info!("login failed: unknown email");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    if !verify_password(password, credentials.password_hash).await? {
        tracing::info!(user_id = credentials.id, "login failed: wrong password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let issued = state.authenticator.issue(credentials.id)?;
    tracing::info!(user_id = credentials.id, "login succeeded");

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful",
        user: LoginUser {
            id: credentials.id,
            name: credentials.name,
            email: credentials.email,
        },
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}
