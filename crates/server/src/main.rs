mod bootstrap;
mod commands;
mod components;
mod credentials;
mod gateway;
mod health;
mod publish;
mod roles;
mod services;
mod tenants;
#[cfg(test)]
mod testing;

use std::future::IntoFuture;
use std::time::Duration;

use anyhow::Result;
use prosperity_core::config::{AppConfig, LoadOptions};
use tower_http::trace::TraceLayer;

fn init_logging(config: &AppConfig) {
    use prosperity_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging comes up before bootstrap so its events are captured.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    if app.config.discord.register_commands {
        let report = app.publish_commands().await?;
        tracing::info!(
            event_name = "system.server.commands_registered",
            correlation_id = "bootstrap",
            published = report.published.len(),
            failed = report.failed.len(),
            "startup command registration finished"
        );
    }

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let router = app.http_router().layer(TraceLayer::new_for_http());

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        primary_bot_id = %app.resolver.primary().id,
        "prosperity-server listening"
    );

    let server =
        axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).into_future();
    tokio::select! {
        result = server => result?,
        _ = drain_deadline(grace) => {
            tracing::warn!(
                event_name = "system.server.shutdown_timeout",
                correlation_id = "shutdown",
                grace_secs = grace.as_secs(),
                "in-flight requests did not finish before the shutdown deadline"
            );
        }
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "prosperity-server stopping"
    );
    app.db_pool.close().await;

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %error,
            "could not listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}

/// Resolves `grace` after the shutdown signal, bounding how long draining may take.
async fn drain_deadline(grace: Duration) {
    wait_for_shutdown().await;
    tokio::time::sleep(grace).await;
}
