//! Storefront API
//!
//! Backend for a B2B storefront: OTP based signup and login, customer
//! addresses, the Quick Order cart, catalogue reads, quotations that turn into
//! sales orders, in-app notifications and company onboarding.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod middleware_helpers;
pub mod migrator;
pub mod notifications;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{http::HeaderValue, Extension, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};

use crate::{
    auth::{AuthConfig, AuthService},
    cache::CacheBackend,
    errors::ServiceError,
    events::EventSender,
    handlers::{AppServices, ServiceDeps},
    metrics::Metrics,
    notifications::EmailSender,
    services::gst::GstClient,
};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub cache: Arc<dyn CacheBackend>,
    pub auth: Arc<AuthService>,
    pub event_sender: Arc<EventSender>,
    pub metrics: Arc<Metrics>,
    pub services: AppServices,
}

impl AppState {
    /// Wires every service over the shared connection, cache and mailer.
    pub fn new(
        config: config::AppConfig,
        db: Arc<DatabaseConnection>,
        cache: Arc<dyn CacheBackend>,
        mailer: Arc<dyn EmailSender>,
        event_sender: EventSender,
    ) -> Result<Self, ServiceError> {
        let auth = Arc::new(AuthService::new(
            AuthConfig::from_app_config(&config),
            cache.clone(),
        ));
        let event_sender = Arc::new(event_sender);
        let gst = GstClient::from_config(&config)?;
        let metrics = Arc::new(
            Metrics::new().map_err(|e| ServiceError::InternalError(e.to_string()))?,
        );

        let services = AppServices::new(
            &config,
            ServiceDeps {
                db: db.clone(),
                auth: auth.clone(),
                cache: cache.clone(),
                mailer,
                event_sender: event_sender.clone(),
                gst,
            },
        );

        Ok(Self {
            db,
            config,
            cache,
            auth,
            event_sender,
            metrics,
            services,
        })
    }
}

/// Every `/api/v1` route group.
pub fn api_v1_routes() -> Router<AppState> {
    let auth_routes = handlers::auth::public_routes().merge(handlers::auth::protected_routes());

    Router::new()
        .merge(handlers::health::status_routes())
        .nest("/auth", auth_routes)
        // Storefront
        .merge(handlers::addresses::address_routes())
        .merge(handlers::commerce::cart_routes())
        .merge(handlers::commerce::catalog_routes())
        // Quotations
        .merge(handlers::quotations::quotation_routes())
        // Per-user
        .merge(handlers::notifications::notification_routes())
        .merge(handlers::companies::company_routes())
}

fn cors_layer(config: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter_map(|origin| {
            let trimmed = origin.trim();
            if trimmed.is_empty() {
                None
            } else {
                HeaderValue::from_str(trimmed).ok()
            }
        })
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Config validation only lets this through when permissive CORS is allowed.
        CorsLayer::permissive()
    }
}

/// Full application router with its middleware stack.
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let auth = state.auth.clone();
    let http_metrics = state.metrics.clone();

    Router::new()
        .merge(handlers::health::health_routes())
        .merge(metrics::metrics_routes())
        .merge(openapi::openapi_routes())
        .nest("/api/v1", api_v1_routes())
        .layer(axum::middleware::from_fn_with_state(
            http_metrics,
            metrics::track_http_metrics,
        ))
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        // The auth middleware reads the service from request extensions
        .layer(Extension(auth))
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
