mod common;

use axum::http::{header, StatusCode};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_check() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let response = app
        .oneshot(common::get_request("/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_register_starts_session() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "email": "Runner@Example.com", "password": "password123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("session="));
    assert!(set_cookie.contains("HttpOnly"));

    let body = common::body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], "runner@example.com");
    assert_eq!(body["user"]["name"], "Runner");
    assert!(body["user"].get("password_hash").is_none());

    // The new cookie authenticates follow-up requests
    let cookie = common::extract_cookie_header(&set_cookie);
    let response = app
        .oneshot(common::get_request("/auth/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["user"]["email"], "runner@example.com");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let response = app
        .oneshot(common::json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "email": "not-an-email", "password": "123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "Please correct the errors below");
    assert!(body["details"]["email"].is_array());
    assert_eq!(
        body["details"]["password"][0],
        "Password must be at least 6 characters"
    );
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let pool = common::setup_test_db();
    common::create_test_user(&pool, "taken@example.com", "password123").await;
    let app = common::create_test_app(pool);

    let response = app
        .oneshot(common::json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "email": "TAKEN@example.com", "password": "password123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(
        body["details"]["email"][0],
        "An account with this email already exists"
    );
}

#[tokio::test]
async fn test_login_valid_credentials() {
    let pool = common::setup_test_db();
    common::create_test_user(&pool, "lifter@example.com", "password123").await;
    let app = common::create_test_app(pool);

    let response = app
        .oneshot(common::json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": "lifter@example.com", "password": "password123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers().get(header::SET_COOKIE);
    assert!(set_cookie.is_some());
    assert!(set_cookie.unwrap().to_str().unwrap().contains("session="));
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let pool = common::setup_test_db();
    common::create_test_user(&pool, "lifter@example.com", "password123").await;
    let app = common::create_test_app(pool);

    let response = app
        .oneshot(common::json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": "lifter@example.com", "password": "wrongpassword" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_me_requires_auth() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let response = app
        .oneshot(common::get_request("/auth/me", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "Authentication required");
}

#[tokio::test]
async fn test_unknown_session_token_is_rejected() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let response = app
        .oneshot(common::get_request(
            "/auth/me",
            Some("session=00000000-0000-0000-0000-000000000000"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let pool = common::setup_test_db();
    let (_user, cookie) = common::login_test_user(&pool, "leaver@example.com").await;
    let app = common::create_test_app(pool);

    let response = app
        .clone()
        .oneshot(common::json_request("POST", "/auth/logout", Some(&cookie), json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("Max-Age=0"));

    let response = app
        .oneshot(common::get_request("/auth/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
