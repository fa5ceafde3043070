use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};

use storefront_api as api;
use api::{
    events::EventHandler, metrics::MetricsEventHandler,
    services::notifications::NotificationEventHandler,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config().context("failed to load configuration")?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);
    api::handlers::health::init_start_time();

    let db_pool = api::db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }
    let db = Arc::new(db_pool);

    let cache = api::cache::create_cache(&cfg)
        .await
        .context("failed to initialise the cache")?;
    let mailer = api::notifications::create_email_sender(&cfg)
        .context("failed to initialise the email sender")?;

    let (event_sender, event_rx) = api::events::channel();
    let state = api::AppState::new(cfg.clone(), db.clone(), cache, mailer, event_sender)
        .context("failed to build application state")?;

    // Events queue in the channel until the processor starts.
    let handlers: Vec<Arc<dyn EventHandler>> = vec![
        Arc::new(NotificationEventHandler::new(db)),
        Arc::new(MetricsEventHandler::new(state.metrics.clone())),
    ];
    let events_task = tokio::spawn(api::events::process_events(event_rx, handlers));
    let app = api::app_router(state);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid host/port")?;
    info!("storefront-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router owned the last senders; the processor drains what is left.
    if let Err(e) = events_task.await {
        error!("Event processor ended abnormally: {}", e);
    }
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
