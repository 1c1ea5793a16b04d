use std::net::SocketAddr;

use axum::Router;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

/// Connect, migrate and assemble the router for `cfg`.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    migration::Migrator::up(&db, None)
        .await
        .map_err(|e| StartupError::Database(format!("migrations: {e}")))?;
    info!("database schema up to date");
    Ok(routes::build_router(ServerState::new(db, cfg), build_cors()))
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await
}

async fn wait_for_signal<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            // Without a handler the server runs until killed.
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}

/// Public entry: load config, build the app and serve until Ctrl+C.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_or_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use super::wait_for_signal;

    #[tokio::test]
    async fn signal_received_resolves() {
        let done = tokio::time::timeout(Duration::from_millis(200), wait_for_signal(async { Ok(()) })).await;
        assert!(done.is_ok());
    }

    #[tokio::test]
    async fn handler_failure_keeps_serving() {
        let failed = async { Err(io::Error::new(io::ErrorKind::Other, "no signal driver")) };
        let done = tokio::time::timeout(Duration::from_millis(200), wait_for_signal(failed)).await;
        assert!(done.is_err(), "a failed Ctrl+C handler must not trigger shutdown");
    }
}
