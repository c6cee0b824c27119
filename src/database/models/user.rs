use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Public view of an account; never carries the password digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub profile_pic_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row used only by the login flow.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub profile_pic_url: Option<String>,
}

/// Partial profile update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub profile_pic_url: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserUpdated {
    pub user: User,
    /// The login email changed, so the client should sign in again
    pub email_changed: bool,
}
