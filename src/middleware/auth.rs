use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::Claims;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller extracted from a verified bearer token.
///
/// Lives in request extensions for the duration of one request only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self { user_id: claims.user_id }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context.
///
/// Applied once as a route layer over every protected route; handlers read the
/// result through `Extension<AuthUser>` and never parse headers themselves.
/// Rejections short-circuit before any handler (and so any store access) runs.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = state.authenticator.authenticate(request.headers()).map_err(|e| {
        tracing::warn!(path = %request.uri().path(), reason = %e, "request rejected by auth middleware");
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}
