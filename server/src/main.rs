//! jobly server: reads configuration, connects to PostgreSQL, and serves the companies and
//! jobs API.
//!
//! Run from repo root: `cargo run -p jobly-server`

use jobly::{app, AppConfig, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("jobly=info,tower_http=info")),
        )
        .init();

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    if config.tokens.is_empty() {
        tracing::warn!("API_TOKENS is empty; mutation endpoints will reject every request");
    } else {
        tracing::info!(tokens = config.tokens.len(), "loaded token table");
    }
    let state = AppState::postgres(pool, Arc::new(config.tokens.clone()));
    let router = app(state, config.max_body_bytes);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
