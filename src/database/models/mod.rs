pub mod course;
pub mod covered_topic;
pub mod user;
pub mod weekly_topic;

pub use course::{Course, CourseInput};
pub use covered_topic::{CoveredTopic, CoveredTopicInput, CoveredTopicStatus};
pub use user::{NewUser, User, UserCredentials, UserUpdate, UserUpdated};
pub use weekly_topic::{group_course_topics, CourseTopics, NewWeeklyTopic, WeeklyTopic, WeeklyTopicStatus};
