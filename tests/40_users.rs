mod common;

use anyhow::Result;
use common::TestServer;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn me_returns_own_profile_without_digest() -> Result<()> {
    let server = TestServer::spawn().await?;
    let ada = server.account("Ada").await?;

    let res = server.authed(Method::GET, "/api/users/me", &ada.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["id"], ada.id);
    assert_eq!(body["data"]["email"], ada.email);
    assert!(body["data"].get("password_hash").is_none());

    let res = server
        .authed(Method::GET, &format!("/api/users/{}", ada.id), &ada.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn other_user_ids_are_not_found() -> Result<()> {
    let server = TestServer::spawn().await?;
    let ada = server.account("Ada").await?;
    let bob = server.account("Bob").await?;
    let path = format!("/api/users/{}", ada.id);

    let get = server.authed(Method::GET, &path, &bob.token).send().await?;
    let put = server
        .authed(Method::PUT, &path, &bob.token)
        .json(&json!({ "Name": "Mallory" }))
        .send()
        .await?;
    let delete = server.authed(Method::DELETE, &path, &bob.token).send().await?;
    for res in [get, put, delete] {
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    let res = server.authed(Method::GET, "/api/users/me", &ada.token).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["name"], "Ada");
    Ok(())
}

#[tokio::test]
async fn email_change_forces_relogin() -> Result<()> {
    let server = TestServer::spawn().await?;
    let ada = server.account("Ada").await?;

    let res = server
        .authed(Method::PUT, "/api/users/me", &ada.token)
        .json(&json!({ "Name": "Ada L." }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["user"]["name"], "Ada L.");
    assert_eq!(body["data"]["forceRelogin"], false);

    let new_email = format!("renamed-{}", ada.email);
    let res = server
        .authed(Method::PUT, "/api/users/me", &ada.token)
        .json(&json!({ "Email": new_email }))
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["forceRelogin"], true);
    assert_eq!(body["message"], "Profile updated");

    server.login(&new_email, common::TEST_PASSWORD).await?;
    assert!(server.login(&ada.email, common::TEST_PASSWORD).await.is_err());
    Ok(())
}

#[tokio::test]
async fn password_change_takes_effect() -> Result<()> {
    let server = TestServer::spawn().await?;
    let ada = server.account("Ada").await?;

    let res = server
        .authed(Method::PUT, "/api/users/me", &ada.token)
        .json(&json!({ "Password": "short" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .authed(Method::PUT, "/api/users/me", &ada.token)
        .json(&json!({ "Password": "a brand new passphrase" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    server.login(&ada.email, "a brand new passphrase").await?;
    assert!(server.login(&ada.email, common::TEST_PASSWORD).await.is_err());
    Ok(())
}

#[tokio::test]
async fn deleting_account_removes_its_data() -> Result<()> {
    let server = TestServer::spawn().await?;
    let ada = server.account("Ada").await?;
    server.course(&ada.token, "Compilers", "CS431").await?;

    let res = server.authed(Method::DELETE, "/api/users/me", &ada.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    // The token still verifies, but nothing is left behind it
    let res = server.authed(Method::GET, "/api/users/me", &ada.token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = server.authed(Method::GET, "/api/courses", &ada.token).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"], json!([]));

    let res = server
        .authed(Method::POST, "/api/courses", &ada.token)
        .json(&json!({ "Name": "Ghost", "Code": "GH101" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = server.authed(Method::GET, "/api/courses", &ada.token).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"], json!([]));

    assert!(server.login(&ada.email, common::TEST_PASSWORD).await.is_err());
    Ok(())
}
