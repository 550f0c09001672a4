mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;
use tower::ServiceExt;

async fn log_workout(app: &axum::Router, cookie: &str, days_ago: i64, minutes: i64) {
    let performed_at = (Utc::now().date_naive() - Duration::days(days_ago)).to_string();
    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/workouts",
            Some(cookie),
            json!({
                "workout_type_id": 1,
                "duration_min": minutes,
                "calories": minutes * 10,
                "performed_at": performed_at
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_dashboard_requires_auth() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let response = app
        .oneshot(common::get_request("/api/dashboard", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dashboard_week_and_month_totals() {
    let pool = common::setup_test_db();
    let (_user, cookie) = common::login_test_user(&pool, "runner@example.com").await;
    let app = common::create_test_app(pool);

    log_workout(&app, &cookie, 0, 30).await;
    log_workout(&app, &cookie, 3, 40).await;
    log_workout(&app, &cookie, 20, 50).await;
    log_workout(&app, &cookie, 60, 60).await;

    let response = app
        .oneshot(common::get_request("/api/dashboard", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;

    assert_eq!(body["this_week"]["workouts"], 2);
    assert_eq!(body["this_week"]["minutes"], 70);
    assert_eq!(body["this_week"]["calories"], 700);
    assert_eq!(body["this_month"]["workouts"], 3);
    assert_eq!(body["this_month"]["minutes"], 120);
    assert_eq!(body["recent_workouts"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_trend_fills_empty_days() {
    let pool = common::setup_test_db();
    let (_user, cookie) = common::login_test_user(&pool, "runner@example.com").await;
    let app = common::create_test_app(pool);

    log_workout(&app, &cookie, 0, 30).await;
    log_workout(&app, &cookie, 0, 15).await;
    log_workout(&app, &cookie, 2, 20).await;

    let response = app
        .clone()
        .oneshot(common::get_request("/api/dashboard/trend?days=7", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;

    let points = body["points"].as_array().unwrap();
    assert_eq!(points.len(), 7);
    let last = &points[6];
    assert_eq!(last["date"], Utc::now().date_naive().to_string());
    assert_eq!(last["workouts"], 2);
    assert_eq!(last["minutes"], 45);
    assert_eq!(points[4]["minutes"], 20);
    assert_eq!(points[5]["workouts"], 0);

    // Out-of-range windows are clamped
    let response = app
        .oneshot(common::get_request("/api/dashboard/trend?days=1000", Some(&cookie)))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["days"], 90);
    assert_eq!(body["points"].as_array().unwrap().len(), 90);
}
