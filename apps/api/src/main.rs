mod ai_client;
mod analysis;
mod config;
mod document;
mod errors;
mod export;
mod routes;
mod session;
mod state;
#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::ai_client::GeminiClient;
use crate::analysis::flow::Pipeline;
use crate::config::Config;
use crate::document::PdfExtractor;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so RUST_LOG from it reaches the filter
    dotenvy::dotenv().ok();

    // Initialize structured logging before config so a config failure is logged
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}=info", env!("CARGO_PKG_NAME")))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {e}");
            return Err(e.into());
        }
    };

    info!("Starting JobFit v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the AI client
    let backend = GeminiClient::new(&config)?;
    let pipeline = Pipeline::new(Arc::new(backend), Arc::new(PdfExtractor));
    info!(
        "AI client initialized (model: {}, timeout: {:?})",
        pipeline.model(),
        config.ai_timeout
    );

    let state = AppState {
        pipeline,
        sessions: SessionStore::new(),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
