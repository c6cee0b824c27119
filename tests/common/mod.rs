#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use study_diary_api::config::AppConfig;
use study_diary_api::database::{MemoryStore, StudyStore};
use study_diary_api::server;
use study_diary_api::state::AppState;

pub const TEST_SECRET: &str = "integration-test-signing-secret";
pub const TEST_PASSWORD: &str = "correct horse battery";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

/// A signed-up and logged-in user.
pub struct Account {
    pub id: i64,
    pub email: String,
    pub token: String,
}

pub fn test_config() -> Result<AppConfig> {
    let config = AppConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some(TEST_SECRET.to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        _ => None,
    })?;
    Ok(config)
}

impl TestServer {
    /// Serve the full router over a fresh in-memory store on an unused port.
    pub async fn spawn() -> Result<Self> {
        let store: Arc<dyn StudyStore> = Arc::new(MemoryStore::new());
        let state = AppState::new(test_config()?, store)?;

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;

        let app = server::app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            port,
            base_url,
            state,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    pub fn authed(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.request(method, path).bearer_auth(token)
    }

    /// Sign up through `/signup` and log in through `/login`.
    pub async fn account(&self, name: &str) -> Result<Account> {
        let email = format!("{}-{}@uni.test", name.to_lowercase(), uuid::Uuid::new_v4());

        let res = self
            .request(Method::POST, "/signup")
            .json(&json!({ "Name": name, "Email": email, "Password": TEST_PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "signup failed: {}", res.status());

        let token = self.login(&email, TEST_PASSWORD).await?;
        let body: Value = res.json().await?;
        let id = body["data"]["id"].as_i64().context("signup response has no user id")?;

        Ok(Account { id, email, token })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let res = self
            .request(Method::POST, "/login")
            .json(&json!({ "Email": email, "Password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no token")
    }

    /// Create a course and return its id.
    pub async fn course(&self, token: &str, name: &str, code: &str) -> Result<i64> {
        let res = self
            .authed(Method::POST, "/api/courses", token)
            .json(&json!({ "Name": name, "Code": code }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create course failed: {}", res.status());
        let body: Value = res.json().await?;
        body["data"]["id"].as_i64().context("course response has no id")
    }

    /// Add a weekly topic to a course and return its id.
    pub async fn weekly_topic(&self, token: &str, course_id: i64, week: i32, topic: &str) -> Result<i64> {
        let res = self
            .authed(Method::POST, &format!("/api/weeklyTopics/{}", course_id), token)
            .json(&json!({ "WeekNumber": week, "Topic": topic }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create topic failed: {}", res.status());
        let body: Value = res.json().await?;
        body["data"]["id"].as_i64().context("topic response has no id")
    }
}
