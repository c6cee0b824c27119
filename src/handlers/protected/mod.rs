// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// The auth route layer has already verified the token; handlers take the
// caller from `Extension<AuthUser>` and pass its id into every store call.
// Records that are missing and records owned by someone else both answer 404.
pub mod courses;
pub mod covered_topics;
pub mod users;
pub mod weekly_topics;

use crate::database::StoreError;
use crate::error::ApiError;

/// Map `NotFound` to a resource-specific 404, everything else through `From`.
pub(crate) fn or_not_found(message: &'static str) -> impl Fn(StoreError) -> ApiError {
    move |err| match err {
        StoreError::NotFound => ApiError::not_found(message),
        other => other.into(),
    }
}
