use async_trait::async_trait;
use sqlx::PgPool;

use super::manager;
use super::models::{
    group_course_topics, Course, CourseInput, CourseTopics, CoveredTopic, CoveredTopicInput,
    CoveredTopicStatus, NewUser, NewWeeklyTopic, User, UserCredentials, UserUpdate, UserUpdated,
    WeeklyTopic, WeeklyTopicStatus,
};
use super::store::{StoreError, StudyStore};
use crate::config::DatabaseConfig;

const USER_COLUMNS: &str = "id, name, email, profile_pic_url, created_at";
const COURSE_COLUMNS: &str = "id, user_id, name, code, outline_file_url, created_at";
const TOPIC_COLUMNS: &str =
    "wt.id, wt.course_id, wt.week_number, wt.topic, wt.is_favorite, wt.is_done, wt.created_at";

/// Postgres-backed store. Ownership is enforced inside each statement's
/// WHERE clause, so a row owned by someone else is never touched.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        Ok(Self::new(manager::connect_pool(config).await?))
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        manager::run_migrations(&self.pool).await
    }
}

fn unique_conflict(err: sqlx::Error, message: &str) -> StoreError {
    let unique = err
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);
    if unique {
        StoreError::Conflict(message.to_string())
    } else {
        err.into()
    }
}

fn require_affected(rows: u64) -> Result<(), StoreError> {
    if rows == 0 {
        Err(StoreError::NotFound)
    } else {
        Ok(())
    }
}

#[async_trait]
impl StudyStore for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        manager::health_check(&self.pool).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash, profile_pic_url) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.profile_pic_url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_conflict(e, "Email already registered"))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserCredentials>, StoreError> {
        let row = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, name, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_user(&self, user_id: i64) -> Result<User, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn update_user(&self, user_id: i64, update: UserUpdate) -> Result<UserUpdated, StoreError> {
        let previous_email: String = sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        let UserUpdate { name, email, profile_pic_url, password_hash } = update;
        let sql = format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                email = COALESCE($3, email), \
                profile_pic_url = COALESCE($4, profile_pic_url), \
                password_hash = COALESCE($5, password_hash) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .bind(name)
            .bind(email)
            .bind(profile_pic_url)
            .bind(password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| unique_conflict(e, "Email already in use by another user"))?
            .ok_or(StoreError::NotFound)?;

        let email_changed = user.email != previous_email;
        Ok(UserUpdated { user, email_changed })
    }

    async fn delete_user(&self, user_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        require_affected(result.rows_affected())
    }

    async fn list_courses(&self, user_id: i64) -> Result<Vec<Course>, StoreError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE user_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, Course>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_course(&self, user_id: i64, course_id: i64) -> Result<Course, StoreError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Course>(&sql)
            .bind(course_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn create_course(&self, user_id: i64, input: CourseInput) -> Result<Course, StoreError> {
        let sql = format!(
            "INSERT INTO courses (user_id, name, code, outline_file_url) \
             SELECT $1, $2, $3, $4 \
             WHERE EXISTS (SELECT 1 FROM users WHERE id = $1) \
             RETURNING {COURSE_COLUMNS}"
        );
        sqlx::query_as::<_, Course>(&sql)
            .bind(user_id)
            .bind(input.name)
            .bind(input.code)
            .bind(input.outline_file_url)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn update_course(
        &self,
        user_id: i64,
        course_id: i64,
        input: CourseInput,
    ) -> Result<Course, StoreError> {
        let sql = format!(
            "UPDATE courses SET name = $3, code = $4, outline_file_url = $5 \
             WHERE id = $1 AND user_id = $2 RETURNING {COURSE_COLUMNS}"
        );
        sqlx::query_as::<_, Course>(&sql)
            .bind(course_id)
            .bind(user_id)
            .bind(input.name)
            .bind(input.code)
            .bind(input.outline_file_url)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete_course(&self, user_id: i64, course_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1 AND user_id = $2")
            .bind(course_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        require_affected(result.rows_affected())
    }

    async fn list_course_topics(&self, user_id: i64) -> Result<Vec<CourseTopics>, StoreError> {
        let courses = self.list_courses(user_id).await?;
        let sql = format!(
            "SELECT {TOPIC_COLUMNS} FROM weekly_topics wt \
             JOIN courses c ON c.id = wt.course_id \
             WHERE c.user_id = $1"
        );
        let topics = sqlx::query_as::<_, WeeklyTopic>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(group_course_topics(courses, topics))
    }

    async fn create_weekly_topic(
        &self,
        user_id: i64,
        course_id: i64,
        topic: NewWeeklyTopic,
    ) -> Result<WeeklyTopic, StoreError> {
        let sql = format!(
            "INSERT INTO weekly_topics AS wt (course_id, week_number, topic) \
             SELECT $1, $2, $3 \
             WHERE EXISTS (SELECT 1 FROM courses WHERE id = $1 AND user_id = $4) \
             RETURNING {TOPIC_COLUMNS}"
        );
        sqlx::query_as::<_, WeeklyTopic>(&sql)
            .bind(course_id)
            .bind(topic.week_number)
            .bind(topic.topic)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn update_weekly_topic(
        &self,
        user_id: i64,
        topic_id: i64,
        topic: String,
    ) -> Result<WeeklyTopic, StoreError> {
        let sql = format!(
            "UPDATE weekly_topics wt SET topic = $3 \
             FROM courses c \
             WHERE wt.id = $1 AND c.id = wt.course_id AND c.user_id = $2 \
             RETURNING {TOPIC_COLUMNS}"
        );
        sqlx::query_as::<_, WeeklyTopic>(&sql)
            .bind(topic_id)
            .bind(user_id)
            .bind(topic)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn update_weekly_topic_status(
        &self,
        user_id: i64,
        topic_id: i64,
        status: WeeklyTopicStatus,
    ) -> Result<WeeklyTopic, StoreError> {
        let sql = format!(
            "UPDATE weekly_topics wt SET \
                is_favorite = COALESCE($3, wt.is_favorite), \
                is_done = COALESCE($4, wt.is_done) \
             FROM courses c \
             WHERE wt.id = $1 AND c.id = wt.course_id AND c.user_id = $2 \
             RETURNING {TOPIC_COLUMNS}"
        );
        sqlx::query_as::<_, WeeklyTopic>(&sql)
            .bind(topic_id)
            .bind(user_id)
            .bind(status.is_favorite)
            .bind(status.is_done)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete_weekly_topic(&self, user_id: i64, topic_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query(
            "DELETE FROM weekly_topics wt USING courses c \
             WHERE wt.id = $1 AND c.id = wt.course_id AND c.user_id = $2",
        )
        .bind(topic_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        require_affected(result.rows_affected())
    }

    async fn list_covered_topics(&self, user_id: i64) -> Result<Vec<CoveredTopicStatus>, StoreError> {
        let rows = sqlx::query_as::<_, CoveredTopicStatus>(
            "SELECT wt.id AS weekly_topic_id, wt.course_id, wt.week_number, wt.topic, \
                    ct.id AS covered_topic_id, \
                    COALESCE(ct.is_favorite, false) AS is_favorite, \
                    COALESCE(ct.is_revised, false) AS is_revised \
             FROM weekly_topics wt \
             JOIN courses c ON c.id = wt.course_id AND c.user_id = $1 \
             LEFT JOIN covered_topics ct ON ct.weekly_topic_id = wt.id AND ct.user_id = $1 \
             ORDER BY wt.week_number, wt.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn upsert_covered_topic(
        &self,
        user_id: i64,
        input: CoveredTopicInput,
    ) -> Result<CoveredTopic, StoreError> {
        sqlx::query_as::<_, CoveredTopic>(
            "INSERT INTO covered_topics (weekly_topic_id, user_id, is_favorite, is_revised) \
             SELECT $1, $2, COALESCE($3, false), COALESCE($4, false) \
             WHERE EXISTS ( \
                 SELECT 1 FROM weekly_topics wt JOIN courses c ON c.id = wt.course_id \
                 WHERE wt.id = $1 AND c.user_id = $2) \
             ON CONFLICT (weekly_topic_id, user_id) DO UPDATE SET \
                 is_favorite = COALESCE($3, covered_topics.is_favorite), \
                 is_revised = COALESCE($4, covered_topics.is_revised) \
             RETURNING id, weekly_topic_id, user_id, is_favorite, is_revised",
        )
        .bind(input.weekly_topic_id)
        .bind(user_id)
        .bind(input.is_favorite)
        .bind(input.is_revised)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }
}
