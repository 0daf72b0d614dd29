use anyhow::{Context, Result};
use log::info;
use tokio::net::TcpListener;

use cet_recommender::server::build_router;
use cet_recommender::{AppState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = ServiceConfig::from_env()?;
    // Refuse to serve without both tables and the model.
    let state = AppState::load(&config)?;

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!("listening on {}", config.bind_addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("serving HTTP")
}
