use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::course::Course;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct WeeklyTopic {
    pub id: i64,
    pub course_id: i64,
    pub week_number: i32,
    pub topic: String,
    pub is_favorite: bool,
    pub is_done: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWeeklyTopic {
    pub week_number: i32,
    pub topic: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WeeklyTopicStatus {
    pub is_favorite: Option<bool>,
    pub is_done: Option<bool>,
}

/// Dashboard shape: a course with its topics in week order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseTopics {
    pub course_id: i64,
    pub course_name: String,
    pub code: String,
    pub weekly_topics: Vec<WeeklyTopic>,
}

/// Nest topics under their courses. Courses keep their input order; topics are
/// sorted by week, then id. Topics whose course is not in `courses` are dropped.
pub fn group_course_topics(courses: Vec<Course>, mut topics: Vec<WeeklyTopic>) -> Vec<CourseTopics> {
    topics.sort_by_key(|t| (t.week_number, t.id));

    courses
        .into_iter()
        .map(|course| {
            let weekly_topics = topics
                .iter()
                .filter(|t| t.course_id == course.id)
                .cloned()
                .collect();
            CourseTopics {
                course_id: course.id,
                course_name: course.name,
                code: course.code,
                weekly_topics,
            }
        })
        .collect()
}
