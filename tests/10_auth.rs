mod common;

use anyhow::Result;
use chrono::{Duration, Utc};
use common::TestServer;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use study_diary_api::auth::Authenticator;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.request(Method::GET, "/health").send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn missing_authorization_is_401() -> Result<()> {
    let server = TestServer::spawn().await?;

    for path in ["/api/courses", "/api/weeklyTopics", "/api/coveredTopics", "/api/users/me"] {
        let res = server.request(Method::GET, path).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);
        let body: Value = res.json().await?;
        assert_eq!(body["success"], false);
    }
    Ok(())
}

#[tokio::test]
async fn non_bearer_scheme_is_401() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .request(Method::GET, "/api/courses")
        .basic_auth("student", Some("pw"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn malformed_and_foreign_tokens_are_403() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.authed(Method::GET, "/api/courses", "not-a-token").send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let foreign = Authenticator::new("some-other-secret", Duration::days(7))?.issue(1)?;
    let res = server.authed(Method::GET, "/api/courses", &foreign.token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Invalid token signature");
    Ok(())
}

#[tokio::test]
async fn expired_token_is_403() -> Result<()> {
    let server = TestServer::spawn().await?;
    let account = server.account("Ada").await?;

    let stale = server
        .state
        .authenticator
        .issue_at(account.id, Utc::now() - Duration::days(8))?;

    let res = server.authed(Method::GET, "/api/courses", &stale.token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Token has expired");
    Ok(())
}

#[tokio::test]
async fn tampered_payload_is_403() -> Result<()> {
    let server = TestServer::spawn().await?;
    let account = server.account("Ada").await?;

    // Swap the payload for one claiming a different user, keep the signature
    let other = server.state.authenticator.issue(account.id + 1)?;
    let mut parts: Vec<&str> = account.token.split('.').collect();
    let other_parts: Vec<&str> = other.token.split('.').collect();
    parts[1] = other_parts[1];
    let forged = parts.join(".");

    let res = server.authed(Method::GET, "/api/users/me", &forged).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn login_returns_token_and_user() -> Result<()> {
    let server = TestServer::spawn().await?;
    let account = server.account("Ada").await?;

    let res = server
        .request(Method::POST, "/login")
        .json(&json!({ "Email": account.email.to_uppercase(), "Password": common::TEST_PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["id"], account.id);
    assert_eq!(body["user"]["email"], account.email);

    let token = body["token"].as_str().unwrap_or_default();
    assert_eq!(token.split('.').count(), 3);
    let claims = server.state.authenticator.verify_token(token)?;
    assert_eq!(claims.user_id, account.id);
    assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    Ok(())
}

#[tokio::test]
async fn login_failures_do_not_reveal_which_part_was_wrong() -> Result<()> {
    let server = TestServer::spawn().await?;
    let account = server.account("Ada").await?;

    let wrong_password = server
        .request(Method::POST, "/login")
        .json(&json!({ "Email": account.email, "Password": "not the password" }))
        .send()
        .await?;
    let unknown_email = server
        .request(Method::POST, "/login")
        .json(&json!({ "Email": "nobody@uni.test", "Password": "not the password" }))
        .send()
        .await?;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    let a: Value = wrong_password.json().await?;
    let b: Value = unknown_email.json().await?;
    assert_eq!(a["message"], b["message"]);
    Ok(())
}

#[tokio::test]
async fn login_requires_both_fields() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .request(Method::POST, "/login")
        .json(&json!({ "Email": "ada@uni.test" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn signup_validates_and_rejects_duplicates() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .request(Method::POST, "/signup")
        .json(&json!({ "Name": "Ada", "Email": "ada@uni.test", "Password": "short" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .request(Method::POST, "/signup")
        .json(&json!({ "Name": "Ada", "Email": "not-an-email", "Password": common::TEST_PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let first = server
        .request(Method::POST, "/signup")
        .json(&json!({ "Name": "Ada", "Email": "ada@uni.test", "Password": common::TEST_PASSWORD }))
        .send()
        .await?;
    assert_eq!(first.status(), StatusCode::CREATED);
    let body: Value = first.json().await?;
    assert!(body["data"].get("password_hash").is_none());

    let again = server
        .request(Method::POST, "/api/users")
        .json(&json!({ "name": "Ada", "email": " ADA@uni.test ", "password": common::TEST_PASSWORD }))
        .send()
        .await?;
    assert_eq!(again.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn invalid_json_is_400_envelope() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .request(Method::POST, "/login")
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}
