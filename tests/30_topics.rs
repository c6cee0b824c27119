mod common;

use anyhow::Result;
use common::TestServer;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn weekly_topics_are_grouped_by_course() -> Result<()> {
    let server = TestServer::spawn().await?;
    let ada = server.account("Ada").await?;
    let compilers = server.course(&ada.token, "Compilers", "CS431").await?;
    let networks = server.course(&ada.token, "Networks", "CS350").await?;

    server.weekly_topic(&ada.token, compilers, 2, "Parsing").await?;
    server.weekly_topic(&ada.token, compilers, 1, "Lexing").await?;
    server.weekly_topic(&ada.token, networks, 1, "Sockets").await?;

    let res = server.authed(Method::GET, "/api/weeklyTopics", &ada.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let groups = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(groups.len(), 2);

    let compilers_group = groups
        .iter()
        .find(|g| g["course_id"] == compilers)
        .cloned()
        .unwrap_or_default();
    assert_eq!(compilers_group["code"], "CS431");
    let weeks: Vec<i64> = compilers_group["weekly_topics"]
        .as_array()
        .map(|topics| topics.iter().filter_map(|t| t["week_number"].as_i64()).collect())
        .unwrap_or_default();
    assert_eq!(weeks, vec![1, 2]);
    Ok(())
}

#[tokio::test]
async fn weekly_topic_validation() -> Result<()> {
    let server = TestServer::spawn().await?;
    let ada = server.account("Ada").await?;
    let course = server.course(&ada.token, "Compilers", "CS431").await?;
    let path = format!("/api/weeklyTopics/{}", course);

    for body in [
        json!({ "WeekNumber": 0, "Topic": "Lexing" }),
        json!({ "WeekNumber": 1, "Topic": "   " }),
        json!({ "Topic": "Lexing" }),
    ] {
        let res = server.authed(Method::POST, &path, &ada.token).json(&body).send().await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", body);
    }
    Ok(())
}

#[tokio::test]
async fn weekly_topic_edit_and_status() -> Result<()> {
    let server = TestServer::spawn().await?;
    let ada = server.account("Ada").await?;
    let course = server.course(&ada.token, "Compilers", "CS431").await?;
    let topic = server.weekly_topic(&ada.token, course, 1, "Lexing").await?;
    let path = format!("/api/weeklyTopics/{}", topic);

    let res = server
        .authed(Method::PUT, &path, &ada.token)
        .json(&json!({ "Topic": "Lexing and regular languages" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["topic"], "Lexing and regular languages");

    let res = server
        .authed(Method::PATCH, &format!("{}/status", path), &ada.token)
        .json(&json!({ "IsFavorite": true }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .authed(Method::PATCH, &path, &ada.token)
        .json(&json!({ "is_done": true }))
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["is_favorite"], true);
    assert_eq!(body["data"]["is_done"], true);

    let res = server
        .authed(Method::PATCH, &path, &ada.token)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server.authed(Method::DELETE, &path, &ada.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = server.authed(Method::DELETE, &path, &ada.token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn topics_follow_course_ownership() -> Result<()> {
    let server = TestServer::spawn().await?;
    let ada = server.account("Ada").await?;
    let bob = server.account("Bob").await?;
    let course = server.course(&ada.token, "Compilers", "CS431").await?;
    let topic = server.weekly_topic(&ada.token, course, 1, "Lexing").await?;

    // Bob cannot add to Ada's course
    let res = server
        .authed(Method::POST, &format!("/api/weeklyTopics/{}", course), &bob.token)
        .json(&json!({ "WeekNumber": 2, "Topic": "Injected" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let path = format!("/api/weeklyTopics/{}", topic);
    let put = server
        .authed(Method::PUT, &path, &bob.token)
        .json(&json!({ "Topic": "Hijacked" }))
        .send()
        .await?;
    let patch = server
        .authed(Method::PATCH, &path, &bob.token)
        .json(&json!({ "IsDone": true }))
        .send()
        .await?;
    let delete = server.authed(Method::DELETE, &path, &bob.token).send().await?;
    let covered = server
        .authed(Method::POST, "/api/coveredTopics", &bob.token)
        .json(&json!({ "WeeklyTopicId": topic, "IsRevised": true }))
        .send()
        .await?;
    for res in [put, patch, delete, covered] {
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    let res = server.authed(Method::GET, "/api/weeklyTopics", &ada.token).send().await?;
    let body: Value = res.json().await?;
    let stored = &body["data"][0]["weekly_topics"][0];
    assert_eq!(stored["topic"], "Lexing");
    assert_eq!(stored["is_done"], false);
    assert_eq!(body["data"][0]["weekly_topics"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn covered_topic_upsert_and_list() -> Result<()> {
    let server = TestServer::spawn().await?;
    let ada = server.account("Ada").await?;
    let course = server.course(&ada.token, "Compilers", "CS431").await?;
    let lexing = server.weekly_topic(&ada.token, course, 1, "Lexing").await?;
    server.weekly_topic(&ada.token, course, 2, "Parsing").await?;

    let res = server
        .authed(Method::POST, "/api/coveredTopics", &ada.token)
        .json(&json!({ "WeeklyTopicId": lexing, "IsFavorite": true }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let first: Value = res.json().await?;

    let res = server
        .authed(Method::POST, "/api/coveredTopics", &ada.token)
        .json(&json!({ "WeeklyTopicId": lexing, "IsRevised": true }))
        .send()
        .await?;
    let second: Value = res.json().await?;
    assert_eq!(first["data"]["id"], second["data"]["id"]);
    assert_eq!(second["data"]["is_favorite"], true);
    assert_eq!(second["data"]["is_revised"], true);

    let res = server.authed(Method::GET, "/api/coveredTopics", &ada.token).send().await?;
    let body: Value = res.json().await?;
    let rows = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 2);
    let lexing_row = rows
        .iter()
        .find(|r| r["weekly_topic_id"] == lexing)
        .cloned()
        .unwrap_or_default();
    assert_eq!(lexing_row["is_revised"], true);
    assert!(rows.iter().any(|r| r["covered_topic_id"].is_null()));

    let missing = server
        .authed(Method::POST, "/api/coveredTopics", &ada.token)
        .json(&json!({ "IsRevised": true }))
        .send()
        .await?;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
