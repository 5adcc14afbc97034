//! Push Bridge Daemon - host adapter in front of the notification bridge.

mod config;

use std::sync::Arc;

use bridge_http::{HostState, HttpBackend, host_router};
use bridge_service::{ChannelAppRouter, NotificationBridge, StaticPermission, host_events};
use color_eyre::eyre::WrapErr as _;

use crate::config::Config;

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("pushbridge starting");

    let config = match Config::load() {
        Ok(c) => {
            tracing::info!(path = ?Config::config_path(), "configuration loaded");
            c
        }
        Err(e) => {
            tracing::warn!(error = %e, "using default configuration");
            Config::default()
        }
    }
    .with_env();

    let addr = config.listen_addr().wrap_err("invalid listen address")?;

    let backend = HttpBackend::new(&config.backend.base_url, config.backend_timeout())
        .wrap_err("failed to create push backend client")?;

    let (app_router, mut routed) = ChannelAppRouter::new();
    let bridge = Arc::new(NotificationBridge::new(
        backend,
        StaticPermission::new(config.permissions.granted),
        app_router,
        config.bridge_options(),
    ));

    // Stand-ins for application subscribers: token updates and tapped
    // payloads are logged.
    let mut updates = bridge.tokens().subscribe();
    tokio::spawn(async move {
        while let Some(event) = updates.recv().await {
            tracing::info!(event = event.name(), "token update published");
        }
    });

    tokio::spawn(async move {
        while let Some(payload) = routed.recv().await {
            tracing::info!(
                title = ?payload.title(),
                message_id = ?payload.message_id(),
                "routing tapped notification"
            );
        }
    });

    bridge.start().await;

    let (events, rx) = host_events(config.delivery.event_buffer);
    let runner = tokio::spawn({
        let bridge = Arc::clone(&bridge);
        async move { bridge.run(rx).await }
    });

    let app = host_router(HostState {
        events,
        tokens: bridge.tokens().clone(),
    });

    tracing::info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err("failed to bind")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("server error")?;

    // The router held the last event sender; the bridge loop drains and exits.
    runner.await.wrap_err("bridge task failed")?;

    tracing::info!("pushbridge stopped");

    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "cannot listen for SIGTERM");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for SIGINT");
            }
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM"),
        _ = tokio::signal::ctrl_c() => tracing::info!("received SIGINT"),
    }
}
