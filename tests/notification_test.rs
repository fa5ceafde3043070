mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::TestApp;
use rstest::rstest;
use sea_orm::{ActiveModelTrait, Set};
use storefront_api::entities::user_notification;
use uuid::Uuid;

async fn insert_notification(app: &TestApp, email: &str, subject: &str, minutes_ago: i64) -> Uuid {
    let id = Uuid::new_v4();
    user_notification::ActiveModel {
        id: Set(id),
        user_email: Set(email.to_string()),
        subject: Set(subject.to_string()),
        message: Set(format!("{} details", subject)),
        document_type: Set(Some("Quotation".to_string())),
        document_name: Set(Some("QTN-TEST".to_string())),
        is_read: Set(false),
        read_at: Set(None),
        created_at: Set(Utc::now() - Duration::minutes(minutes_ago)),
    }
    .insert(&*app.state.db)
    .await
    .unwrap();
    id
}

#[tokio::test]
async fn lists_newest_first_with_paging() {
    let app = TestApp::new().await;
    let user = app.account("reader@example.com", "9000000401").await;
    insert_notification(&app, &user.email, "Oldest", 30).await;
    insert_notification(&app, &user.email, "Middle", 20).await;
    insert_notification(&app, &user.email, "Newest", 10).await;
    insert_notification(&app, "someone@else.test", "Not mine", 5).await;

    let (status, body) = app
        .json(Method::GET, "/api/v1/notifications", None, Some(&user.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    let subjects: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["subject"].as_str().unwrap())
        .collect();
    assert_eq!(subjects, vec!["Newest", "Middle", "Oldest"]);
    assert_eq!(body["data"][0]["is_read"], false);
    assert_eq!(body["data"][0]["document_type"], "Quotation");

    let (_, body) = app
        .json(
            Method::GET,
            "/api/v1/notifications?limit=1&offset=1",
            None,
            Some(&user.token),
        )
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["subject"], "Middle");
}

#[rstest]
#[case("limit=0", "Limit must be between 1 and 100")]
#[case("limit=101", "Limit must be between 1 and 100")]
#[case("offset=-1", "Offset cannot be negative")]
#[tokio::test]
async fn paging_bounds_are_validated(#[case] query: &str, #[case] message: &str) {
    let app = TestApp::new().await;
    let user = app.account("reader@example.com", "9000000402").await;

    let (status, body) = app
        .json(
            Method::GET,
            &format!("/api/v1/notifications?{}", query),
            None,
            Some(&user.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], message);
}

#[tokio::test]
async fn marking_read_is_idempotent_and_owner_only() {
    let app = TestApp::new().await;
    let user = app.account("reader@example.com", "9000000403").await;
    let other = app.account("other@example.com", "9000000404").await;
    let id = insert_notification(&app, &user.email, "Quotation updated", 1).await;
    let path = format!("/api/v1/notifications/{}/read", id);

    let (status, body) = app.json(Method::POST, &path, None, Some(&other.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You are not allowed to access this notification");

    let (status, body) = app.json(Method::POST, &path, None, Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let (status, body) = app.json(Method::POST, &path, None, Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "already_read");

    let (_, body) = app
        .json(Method::GET, "/api/v1/notifications", None, Some(&user.token))
        .await;
    assert_eq!(body["data"][0]["is_read"], true);
    assert!(!body["data"][0]["read_at"].is_null());

    let (status, body) = app
        .json(
            Method::POST,
            &format!("/api/v1/notifications/{}/read", Uuid::new_v4()),
            None,
            Some(&user.token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Notification not found");
}

#[tokio::test]
async fn read_all_clears_the_unread_count() {
    let app = TestApp::new().await;
    let user = app.account("reader@example.com", "9000000405").await;
    let other = app.account("other@example.com", "9000000406").await;
    insert_notification(&app, &user.email, "One", 3).await;
    insert_notification(&app, &user.email, "Two", 2).await;
    insert_notification(&app, &other.email, "Theirs", 1).await;

    let (_, body) = app
        .json(Method::GET, "/api/v1/notifications/unread-count", None, Some(&user.token))
        .await;
    assert_eq!(body["unread_count"], 2);

    let (status, body) = app
        .json(Method::POST, "/api/v1/notifications/read-all", None, Some(&user.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 2);

    let (_, body) = app
        .json(Method::GET, "/api/v1/notifications/unread-count", None, Some(&user.token))
        .await;
    assert_eq!(body["unread_count"], 0);

    // The other user's notifications are untouched.
    let (_, body) = app
        .json(Method::GET, "/api/v1/notifications/unread-count", None, Some(&other.token))
        .await;
    assert_eq!(body["unread_count"], 1);
}

#[tokio::test]
async fn notifications_need_a_token() {
    let app = TestApp::new().await;
    let (status, _) = app.json(Method::GET, "/api/v1/notifications", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
