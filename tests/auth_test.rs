use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::ServiceExt;

use linkvault::config::Config;
use linkvault::database::Store;
use linkvault::route::create_app;
use linkvault::state::AppState;

fn setup_test_app(api_key: Option<&str>) -> (axum::Router, NamedTempFile) {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = temp_db.path().to_str().unwrap();
    let store = Store::open(db_path).expect("Failed to initialize test database");

    let config = Config {
        api_key: api_key.map(str::to_string),
        ..Config::default()
    };
    (create_app(AppState::new(store, config)), temp_db)
}

/// Helper function to parse response body as JSON
async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

fn create_request(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/urls")
        .header("content-type", "application/json")
        .header("x-user-id", "auth_user");

    if let Some(value) = authorization {
        builder = builder.header("Authorization", value);
    }

    builder
        .body(Body::from(
            json!({ "url": "https://example.com/auth-test" }).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_auth_middleware_enabled_valid_token() {
    let (app, _temp_db) = setup_test_app(Some("secret_token"));

    let response = app
        .oneshot(create_request(Some("secret_token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_auth_middleware_enabled_invalid_token() {
    let (app, _temp_db) = setup_test_app(Some("secret_token"));

    let response = app
        .oneshot(create_request(Some("wrong_token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "unauthorized");
    assert_eq!(body["error"], "missing or invalid credentials");
}

#[tokio::test]
async fn test_auth_middleware_enabled_no_token() {
    let (app, _temp_db) = setup_test_app(Some("secret_token"));

    let response = app.oneshot(create_request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_middleware_disabled() {
    let (app, _temp_db) = setup_test_app(None);

    let response = app.oneshot(create_request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_redirect_is_public_when_api_key_set() {
    let (app, _temp_db) = setup_test_app(Some("secret_token"));

    let response = app
        .clone()
        .oneshot(create_request(Some("secret_token")))
        .await
        .unwrap();
    let body = response_json(response.into_body()).await;
    let code = body["short_code"].as_str().unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/{}", code))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
}
