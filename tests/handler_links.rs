mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use newsletter_links::domain::entities::SubscriptionTier;
use serde_json::{Value, json};

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

#[tokio::test]
async fn test_create_link_with_generated_code() {
    let app = common::create_test_app();
    let token = app.session_token(Some(SubscriptionTier::Pro)).await;

    let response = app
        .server
        .post("/api/links")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "template_id": "spring-issue" }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body = response.json::<Value>();
    let code = body["short_code"].as_str().unwrap();
    assert_eq!(code.len(), 12);
    assert_eq!(
        body["short_url"],
        format!("{}/l/{}", common::PUBLIC_BASE_URL, code)
    );
    assert!(body["id"].as_str().unwrap().starts_with("lnk_"));
    assert_eq!(body["template_id"], "spring-issue");
    assert_eq!(body["clicks"], 0);
    assert_eq!(body["utm"]["source"], "newsletter");
    assert_eq!(body["utm"]["medium"], "email");
}

#[tokio::test]
async fn test_created_link_redirects() {
    let app = common::create_test_app();
    let token = app.session_token(None).await;

    let response = app
        .server
        .post("/api/links")
        .add_header("Authorization", bearer(&token))
        .json(&json!({
            "template_id": "spring-issue",
            "custom_code": "spring-26",
            "expires_at": Utc::now() + Duration::days(30),
            "utm": { "campaign": "spring", "content": "hero" },
            "editor_context": { "section": "hero" }
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["short_code"], "spring-26");

    let redirect = app.server.get("/l/spring-26").await;
    redirect.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        redirect.header("location"),
        "/template-library/spring-issue?utm_source=newsletter&utm_medium=email&utm_campaign=spring&utm_content=hero&context=%7B%22section%22%3A%22hero%22%7D"
    );
}

#[tokio::test]
async fn test_create_link_requires_session() {
    let app = common::create_test_app();

    let missing = app
        .server
        .post("/api/links")
        .json(&json!({ "template_id": "spring-issue" }))
        .await;
    missing.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(missing.header("www-authenticate"), "Bearer");

    let invalid = app
        .server
        .post("/api/links")
        .add_header("Authorization", "Bearer not-a-session")
        .json(&json!({ "template_id": "spring-issue" }))
        .await;
    invalid.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(invalid.json::<Value>()["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn test_revoked_session_is_rejected() {
    let app = common::create_test_app();
    let (token, session) = app
        .sessions
        .issue("user-9", Some(SubscriptionTier::Business), None)
        .await
        .unwrap();
    app.sessions.revoke(session.id).await.unwrap();

    let response = app
        .server
        .post("/api/links")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "template_id": "spring-issue" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_link_validation_errors() {
    let app = common::create_test_app();
    let token = app.session_token(None).await;

    let bad_template = app
        .server
        .post("/api/links")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "template_id": "has spaces" }))
        .await;
    bad_template.assert_status(StatusCode::BAD_REQUEST);
    let body = bad_template.json::<Value>();
    assert_eq!(body["error"]["code"], "validation_error");
    assert!(body["error"]["details"]["template_id"].is_array());

    let bad_code = app
        .server
        .post("/api/links")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "template_id": "t", "custom_code": "No Caps" }))
        .await;
    bad_code.assert_status(StatusCode::BAD_REQUEST);

    let past = app
        .server
        .post("/api/links")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "template_id": "t", "expires_at": Utc::now() - Duration::hours(1) }))
        .await;
    past.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_link_rejects_reserved_code() {
    let app = common::create_test_app();
    let token = app.session_token(None).await;

    let response = app
        .server
        .post("/api/links")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "template_id": "t", "custom_code": "editor" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_link_duplicate_custom_code() {
    let app = common::create_test_app();
    app.create_simple_link("taken-code", "t").await;
    let token = app.session_token(None).await;

    let response = app
        .server
        .post("/api/links")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "template_id": "t", "custom_code": "taken-code" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["error"]["code"], "conflict");
}

#[tokio::test]
async fn test_get_link_reports_events() {
    let mut app = common::create_test_app();
    app.create_simple_link("weekly-1", "tmpl-1").await;
    let token = app.session_token(Some(SubscriptionTier::Pro)).await;

    app.server.get("/l/weekly-1").await;
    app.server
        .get("/l/weekly-1")
        .add_header("Authorization", bearer(&token))
        .await;
    app.drain_events().await;

    let response = app
        .server
        .get("/api/links/weekly-1")
        .add_header("Authorization", bearer(&token))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["short_code"], "weekly-1");
    assert_eq!(body["short_url"], "https://links.example.com/l/weekly-1");
    assert_eq!(body["clicks"], 2);
    assert!(body["last_clicked_at"].is_string());
    assert_eq!(body["events"]["clicks"], 2);
    assert_eq!(body["events"]["views"], 1);
    assert_eq!(body["events"]["edits"], 1);
}

#[tokio::test]
async fn test_get_link_not_found() {
    let app = common::create_test_app();
    let token = app.session_token(None).await;

    let response = app
        .server
        .get("/api/links/missing")
        .add_header("Authorization", bearer(&token))
        .await;

    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["error"]["code"], "not_found");
}
