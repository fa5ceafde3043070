use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{Duration, Instant};

const CACHE_PROBE_KEY: &str = "health_probe";

/// Component health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl ComponentHealth {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>, started: Instant) -> Self {
        let latency_ms = Some(started.elapsed().as_millis() as u64);
        match result {
            Ok(()) => Self {
                status: ComponentStatus::Up,
                message: "ok".to_string(),
                latency_ms,
            },
            Err(e) => Self {
                status: ComponentStatus::Down,
                message: e.to_string(),
                latency_ms,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub version: &'static str,
    pub timestamp: String,
    pub uptime_secs: u64,
    pub database: ComponentHealth,
    pub cache: ComponentHealth,
}

static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Records process start for the uptime figure.
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

/// The database is critical; a failing cache only degrades the service.
fn overall_status(database: ComponentStatus, cache: ComponentStatus) -> ComponentStatus {
    match (database, cache) {
        (ComponentStatus::Up, ComponentStatus::Up) => ComponentStatus::Up,
        (ComponentStatus::Up, _) => ComponentStatus::Degraded,
        _ => ComponentStatus::Down,
    }
}

async fn cache_round_trip(state: &AppState) -> Result<(), crate::cache::CacheError> {
    let stamp = chrono::Utc::now().timestamp_millis().to_string();
    state
        .cache
        .set(CACHE_PROBE_KEY, &stamp, Some(Duration::from_secs(30)))
        .await?;
    match state.cache.get(CACHE_PROBE_KEY).await? {
        Some(read) if read == stamp => Ok(()),
        _ => Err(crate::cache::CacheError::OperationFailed(
            "probe value mismatch".to_string(),
        )),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    summary = "Database and cache health",
    responses(
        (status = 200, description = "Service healthy or degraded"),
        (status = 503, description = "Database unavailable"),
    ),
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let database = ComponentHealth::from_result(crate::db::check_connection(&state.db).await, started);

    let started = Instant::now();
    let cache = ComponentHealth::from_result(cache_round_trip(&state).await, started);

    let status = overall_status(database.status, cache.status);
    let code = match status {
        ComponentStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_secs: uptime_secs(),
            database,
            cache,
        }),
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "Health",
    summary = "Service name and version",
    responses(
        (status = 200, description = "Service status"),
    ),
)]
pub async fn api_status() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_secs": uptime_secs(),
    }))
}

/// `GET /health`
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// `GET /status`, nested under `/api/v1`
pub fn status_routes() -> Router<AppState> {
    Router::new().route("/status", get(api_status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ComponentStatus::Up, ComponentStatus::Up, ComponentStatus::Up)]
    #[case(ComponentStatus::Up, ComponentStatus::Down, ComponentStatus::Degraded)]
    #[case(ComponentStatus::Down, ComponentStatus::Up, ComponentStatus::Down)]
    #[case(ComponentStatus::Down, ComponentStatus::Down, ComponentStatus::Down)]
    fn database_outage_takes_the_service_down(
        #[case] database: ComponentStatus,
        #[case] cache: ComponentStatus,
        #[case] expected: ComponentStatus,
    ) {
        assert_eq!(overall_status(database, cache), expected);
    }

    #[test]
    fn component_health_carries_the_error_text() {
        let health = ComponentHealth::from_result::<String>(Err("refused".into()), Instant::now());
        assert_eq!(health.status, ComponentStatus::Down);
        assert_eq!(health.message, "refused");
        assert!(health.latency_ms.is_some());
    }
}
