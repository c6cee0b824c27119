use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub code: String,
    pub outline_file_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CourseInput {
    pub name: String,
    pub code: String,
    pub outline_file_url: Option<String>,
}
