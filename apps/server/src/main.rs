use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hearth_auth::CredentialVerifier;
use hearth_realtime::build_router;
use hearth_realtime::dispatcher::NotificationDispatcher;
use hearth_realtime::push::{ExpoPushClient, NoopPushGateway, PushGateway};
use hearth_realtime::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("starting Hearth realtime backend");

    let config = hearth_config::load().context("failed to load configuration")?;

    let pool = hearth_database::initialize_database(&config.database)
        .await
        .context("failed to initialize database")?;

    let gateway: Arc<dyn PushGateway> = if config.push.enabled {
        Arc::new(
            ExpoPushClient::from_config(&config.push)
                .context("failed to build push client")?,
        )
    } else {
        info!("push delivery disabled by configuration");
        Arc::new(NoopPushGateway)
    };

    let dispatcher = NotificationDispatcher::new(
        pool.clone(),
        gateway,
        Duration::from_secs(config.push.timeout_seconds),
    );
    let state = AppState::new(
        pool,
        CredentialVerifier::from_config(&config.auth),
        dispatcher,
        config.realtime.clone(),
    );
    let app = build_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hearth_realtime=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    } else {
        info!("shutdown signal received");
    }
}
