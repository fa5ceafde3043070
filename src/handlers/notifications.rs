use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ApiError,
    handlers::common::status_success,
    services::notifications::DEFAULT_LIMIT,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

#[derive(Debug, Serialize)]
struct UnreadCount {
    unread_count: u64,
}

#[derive(Debug, Serialize)]
struct MarkedAll {
    updated: u64,
}

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/:id/read", post(mark_as_read))
        .route("/notifications/read-all", post(mark_all_as_read))
        .with_auth()
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    summary = "Notifications for the signed-in user, newest first",
    params(
        ("limit" = Option<i64>, Query, description = "Maximum rows, 1 to 100"),
        ("offset" = Option<i64>, Query, description = "Rows to skip"),
    ),
    responses(
        (status = 200, description = "Notifications"),
        (status = 400, description = "Invalid limit or offset"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<NotificationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state
        .services
        .notifications
        .list(&user.email, query.limit, query.offset)
        .await?;
    Ok(status_success(serde_json::json!({ "data": notifications })))
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    tag = "Notifications",
    summary = "Number of unread notifications",
    responses(
        (status = 200, description = "Unread count"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let unread_count = state
        .services
        .notifications
        .unread_count(&user.email)
        .await?;
    Ok(status_success(UnreadCount { unread_count }))
}

/// Answers `{"status": "already_read"}` for a notification read earlier.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    tag = "Notifications",
    summary = "Mark one notification read",
    params(
        ("id" = Uuid, Path, description = "Record id"),
    ),
    responses(
        (status = 200, description = "Notification marked read"),
        (status = 403, description = "Notification belongs to another user"),
        (status = 404, description = "Notification not found"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn mark_as_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .services
        .notifications
        .mark_as_read(&user.email, id)
        .await?;
    Ok(axum::Json(serde_json::json!({ "status": outcome.as_status() })))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    tag = "Notifications",
    summary = "Mark every notification read",
    responses(
        (status = 200, description = "Notifications marked read"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn mark_all_as_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .notifications
        .mark_all_as_read(&user.email)
        .await?;
    Ok(status_success(MarkedAll { updated }))
}
