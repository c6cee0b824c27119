use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CoveredTopic {
    pub id: i64,
    pub weekly_topic_id: i64,
    pub user_id: i64,
    pub is_favorite: bool,
    pub is_revised: bool,
}

/// A weekly topic seen through one user's revision status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CoveredTopicStatus {
    pub weekly_topic_id: i64,
    pub course_id: i64,
    pub week_number: i32,
    pub topic: String,
    pub covered_topic_id: Option<i64>,
    pub is_favorite: bool,
    pub is_revised: bool,
}

#[derive(Debug, Clone)]
pub struct CoveredTopicInput {
    pub weekly_topic_id: i64,
    pub is_favorite: Option<bool>,
    pub is_revised: Option<bool>,
}
