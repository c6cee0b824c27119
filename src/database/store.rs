use async_trait::async_trait;
use thiserror::Error;

use super::models::{
    Course, CourseInput, CourseTopics, CoveredTopic, CoveredTopicInput, CoveredTopicStatus, NewUser,
    NewWeeklyTopic, User, UserCredentials, UserUpdate, UserUpdated, WeeklyTopic, WeeklyTopicStatus,
};

/// Errors from a [`StudyStore`].
///
/// `NotFound` deliberately covers both "does not exist" and "belongs to
/// someone else" so callers cannot probe for other users' ids.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(
            err,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
        ) {
            return StoreError::Unavailable(err.to_string());
        }
        StoreError::Database(err)
    }
}

/// Persistence for accounts and study data.
///
/// Every method that takes a `user_id` is scoped to rows owned by that user;
/// the ownership predicate is evaluated before anything is written.
#[async_trait]
pub trait StudyStore: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    // Users
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserCredentials>, StoreError>;
    async fn get_user(&self, user_id: i64) -> Result<User, StoreError>;
    async fn update_user(&self, user_id: i64, update: UserUpdate) -> Result<UserUpdated, StoreError>;
    async fn delete_user(&self, user_id: i64) -> Result<(), StoreError>;

    // Courses
    async fn list_courses(&self, user_id: i64) -> Result<Vec<Course>, StoreError>;
    async fn get_course(&self, user_id: i64, course_id: i64) -> Result<Course, StoreError>;
    async fn create_course(&self, user_id: i64, input: CourseInput) -> Result<Course, StoreError>;
    async fn update_course(
        &self,
        user_id: i64,
        course_id: i64,
        input: CourseInput,
    ) -> Result<Course, StoreError>;
    async fn delete_course(&self, user_id: i64, course_id: i64) -> Result<(), StoreError>;

    // Weekly topics (owned through their course)
    async fn list_course_topics(&self, user_id: i64) -> Result<Vec<CourseTopics>, StoreError>;
    async fn create_weekly_topic(
        &self,
        user_id: i64,
        course_id: i64,
        topic: NewWeeklyTopic,
    ) -> Result<WeeklyTopic, StoreError>;
    async fn update_weekly_topic(
        &self,
        user_id: i64,
        topic_id: i64,
        topic: String,
    ) -> Result<WeeklyTopic, StoreError>;
    async fn update_weekly_topic_status(
        &self,
        user_id: i64,
        topic_id: i64,
        status: WeeklyTopicStatus,
    ) -> Result<WeeklyTopic, StoreError>;
    async fn delete_weekly_topic(&self, user_id: i64, topic_id: i64) -> Result<(), StoreError>;

    // Covered topics
    async fn list_covered_topics(&self, user_id: i64) -> Result<Vec<CoveredTopicStatus>, StoreError>;
    async fn upsert_covered_topic(
        &self,
        user_id: i64,
        input: CoveredTopicInput,
    ) -> Result<CoveredTopic, StoreError>;
}
