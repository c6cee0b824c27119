use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::models::{
    group_course_topics, Course, CourseInput, CourseTopics, CoveredTopic, CoveredTopicInput,
    CoveredTopicStatus, NewUser, NewWeeklyTopic, User, UserCredentials, UserUpdate, UserUpdated,
    WeeklyTopic, WeeklyTopicStatus,
};
use super::store::{StoreError, StudyStore};

/// Process-local store used by tests and by development runs without a database.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    users: BTreeMap<i64, StoredUser>,
    courses: BTreeMap<i64, Course>,
    topics: BTreeMap<i64, WeeklyTopic>,
    covered: BTreeMap<i64, CoveredTopic>,
}

struct StoredUser {
    user: User,
    password_hash: String,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.user.email == email && Some(u.user.id) != except)
    }

    fn owns_course(&self, user_id: i64, course_id: i64) -> bool {
        self.courses
            .get(&course_id)
            .map(|c| c.user_id == user_id)
            .unwrap_or(false)
    }

    fn owns_topic(&self, user_id: i64, topic_id: i64) -> bool {
        self.topics
            .get(&topic_id)
            .map(|t| self.owns_course(user_id, t.course_id))
            .unwrap_or(false)
    }

    fn owned_topic_mut(&mut self, user_id: i64, topic_id: i64) -> Result<&mut WeeklyTopic, StoreError> {
        if !self.owns_topic(user_id, topic_id) {
            return Err(StoreError::NotFound);
        }
        self.topics.get_mut(&topic_id).ok_or(StoreError::NotFound)
    }

    fn remove_topics_where<F>(&mut self, predicate: F)
    where
        F: Fn(&WeeklyTopic) -> bool,
    {
        let doomed: Vec<i64> = self
            .topics
            .values()
            .filter(|t| predicate(t))
            .map(|t| t.id)
            .collect();
        for id in &doomed {
            self.topics.remove(id);
        }
        self.covered.retain(|_, c| !doomed.contains(&c.weekly_topic_id));
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StudyStore for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        if state.email_taken(&user.email, None) {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }

        let id = state.next_id();
        let created = User {
            id,
            name: user.name,
            email: user.email,
            profile_pic_url: user.profile_pic_url,
            created_at: Utc::now(),
        };
        state.users.insert(
            id,
            StoredUser {
                user: created.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserCredentials>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.user.email == email)
            .map(|u| UserCredentials {
                id: u.user.id,
                name: u.user.name.clone(),
                email: u.user.email.clone(),
                password_hash: u.password_hash.clone(),
            }))
    }

    async fn get_user(&self, user_id: i64) -> Result<User, StoreError> {
        let state = self.state.read().await;
        state
            .users
            .get(&user_id)
            .map(|u| u.user.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn update_user(&self, user_id: i64, update: UserUpdate) -> Result<UserUpdated, StoreError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(StoreError::NotFound);
        }
        if let Some(email) = &update.email {
            if state.email_taken(email, Some(user_id)) {
                return Err(StoreError::Conflict("Email already in use by another user".to_string()));
            }
        }

        let stored = state.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        let previous_email = stored.user.email.clone();
        if let Some(name) = update.name {
            stored.user.name = name;
        }
        if let Some(email) = update.email {
            stored.user.email = email;
        }
        if let Some(url) = update.profile_pic_url {
            stored.user.profile_pic_url = Some(url);
        }
        if let Some(digest) = update.password_hash {
            stored.password_hash = digest;
        }

        Ok(UserUpdated {
            email_changed: stored.user.email != previous_email,
            user: stored.user.clone(),
        })
    }

    async fn delete_user(&self, user_id: i64) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.users.remove(&user_id).is_none() {
            return Err(StoreError::NotFound);
        }

        let owned: Vec<i64> = state
            .courses
            .values()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.id)
            .collect();
        state.courses.retain(|_, c| c.user_id != user_id);
        state.remove_topics_where(|t| owned.contains(&t.course_id));
        state.covered.retain(|_, c| c.user_id != user_id);
        Ok(())
    }

    async fn list_courses(&self, user_id: i64) -> Result<Vec<Course>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .courses
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_course(&self, user_id: i64, course_id: i64) -> Result<Course, StoreError> {
        let state = self.state.read().await;
        state
            .courses
            .get(&course_id)
            .filter(|c| c.user_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_course(&self, user_id: i64, input: CourseInput) -> Result<Course, StoreError> {
        let mut state = self.state.write().await;
        // A token can outlive its account
        if !state.users.contains_key(&user_id) {
            return Err(StoreError::NotFound);
        }
        let id = state.next_id();
        let course = Course {
            id,
            user_id,
            name: input.name,
            code: input.code,
            outline_file_url: input.outline_file_url,
            created_at: Utc::now(),
        };
        state.courses.insert(id, course.clone());
        Ok(course)
    }

    async fn update_course(
        &self,
        user_id: i64,
        course_id: i64,
        input: CourseInput,
    ) -> Result<Course, StoreError> {
        let mut state = self.state.write().await;
        let course = state
            .courses
            .get_mut(&course_id)
            .filter(|c| c.user_id == user_id)
            .ok_or(StoreError::NotFound)?;
        course.name = input.name;
        course.code = input.code;
        course.outline_file_url = input.outline_file_url;
        Ok(course.clone())
    }

    async fn delete_course(&self, user_id: i64, course_id: i64) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.owns_course(user_id, course_id) {
            return Err(StoreError::NotFound);
        }
        state.courses.remove(&course_id);
        state.remove_topics_where(|t| t.course_id == course_id);
        Ok(())
    }

    async fn list_course_topics(&self, user_id: i64) -> Result<Vec<CourseTopics>, StoreError> {
        let state = self.state.read().await;
        let courses: Vec<Course> = state
            .courses
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        let topics: Vec<WeeklyTopic> = state
            .topics
            .values()
            .filter(|t| state.owns_course(user_id, t.course_id))
            .cloned()
            .collect();
        Ok(group_course_topics(courses, topics))
    }

    async fn create_weekly_topic(
        &self,
        user_id: i64,
        course_id: i64,
        topic: NewWeeklyTopic,
    ) -> Result<WeeklyTopic, StoreError> {
        let mut state = self.state.write().await;
        if !state.owns_course(user_id, course_id) {
            return Err(StoreError::NotFound);
        }
        let id = state.next_id();
        let created = WeeklyTopic {
            id,
            course_id,
            week_number: topic.week_number,
            topic: topic.topic,
            is_favorite: false,
            is_done: false,
            created_at: Utc::now(),
        };
        state.topics.insert(id, created.clone());
        Ok(created)
    }

    async fn update_weekly_topic(
        &self,
        user_id: i64,
        topic_id: i64,
        topic: String,
    ) -> Result<WeeklyTopic, StoreError> {
        let mut state = self.state.write().await;
        let stored = state.owned_topic_mut(user_id, topic_id)?;
        stored.topic = topic;
        Ok(stored.clone())
    }

    async fn update_weekly_topic_status(
        &self,
        user_id: i64,
        topic_id: i64,
        status: WeeklyTopicStatus,
    ) -> Result<WeeklyTopic, StoreError> {
        let mut state = self.state.write().await;
        let stored = state.owned_topic_mut(user_id, topic_id)?;
        if let Some(favorite) = status.is_favorite {
            stored.is_favorite = favorite;
        }
        if let Some(done) = status.is_done {
            stored.is_done = done;
        }
        Ok(stored.clone())
    }

    async fn delete_weekly_topic(&self, user_id: i64, topic_id: i64) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.owns_topic(user_id, topic_id) {
            return Err(StoreError::NotFound);
        }
        state.remove_topics_where(|t| t.id == topic_id);
        Ok(())
    }

    async fn list_covered_topics(&self, user_id: i64) -> Result<Vec<CoveredTopicStatus>, StoreError> {
        let state = self.state.read().await;
        let mut rows: Vec<CoveredTopicStatus> = state
            .topics
            .values()
            .filter(|t| state.owns_course(user_id, t.course_id))
            .map(|t| {
                let covered = state
                    .covered
                    .values()
                    .find(|c| c.weekly_topic_id == t.id && c.user_id == user_id);
                CoveredTopicStatus {
                    weekly_topic_id: t.id,
                    course_id: t.course_id,
                    week_number: t.week_number,
                    topic: t.topic.clone(),
                    covered_topic_id: covered.map(|c| c.id),
                    is_favorite: covered.map(|c| c.is_favorite).unwrap_or(false),
                    is_revised: covered.map(|c| c.is_revised).unwrap_or(false),
                }
            })
            .collect();
        rows.sort_by_key(|r| (r.week_number, r.weekly_topic_id));
        Ok(rows)
    }

    async fn upsert_covered_topic(
        &self,
        user_id: i64,
        input: CoveredTopicInput,
    ) -> Result<CoveredTopic, StoreError> {
        let mut state = self.state.write().await;
        if !state.owns_topic(user_id, input.weekly_topic_id) {
            return Err(StoreError::NotFound);
        }

        let existing = state
            .covered
            .values()
            .find(|c| c.weekly_topic_id == input.weekly_topic_id && c.user_id == user_id)
            .map(|c| c.id);

        let id = match existing {
            Some(id) => id,
            None => {
                let id = state.next_id();
                state.covered.insert(
                    id,
                    CoveredTopic {
                        id,
                        weekly_topic_id: input.weekly_topic_id,
                        user_id,
                        is_favorite: false,
                        is_revised: false,
                    },
                );
                id
            }
        };

        let covered = state.covered.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(favorite) = input.is_favorite {
            covered.is_favorite = favorite;
        }
        if let Some(revised) = input.is_revised {
            covered.is_revised = revised;
        }
        Ok(covered.clone())
    }
}
