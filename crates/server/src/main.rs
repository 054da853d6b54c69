use std::{env, net::SocketAddr};

use anyhow::{Context, Result};
use db::{DBService, models::session::Session};
use services::services::{completion::CompletionClient, config::CompletionConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod error;
mod middleware;
mod routes;

#[derive(Clone)]
pub struct AppState {
    db: DBService,
    completion: CompletionClient,
}

impl AppState {
    pub fn new(db: DBService, completion: CompletionClient) -> Self {
        Self { db, completion }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn completion(&self) -> &CompletionClient {
        &self.completion
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = DBService::new().await.context("Failed to connect to database")?;

    match Session::purge_expired(&db.pool).await {
        Ok(purged) if purged > 0 => tracing::info!("Purged {} expired sessions", purged),
        Err(e) => tracing::warn!("Failed to purge expired sessions: {}", e),
        _ => {}
    }

    let completion = CompletionClient::new(CompletionConfig::from_env())
        .context("Failed to build completion client")?;

    let state = AppState::new(db, completion);

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("Invalid HOST/PORT")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, routes::router(state)).await?;

    Ok(())
}
