mod config;
mod errors;
mod llm_client;
mod routes;
mod screening;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{LlmClient, TextGenerator};
use crate::routes::build_router;
use crate::screening::embeddings::{EmbeddingClient, HttpEmbeddingTransport};
use crate::screening::pipeline::Screener;
use crate::state::AppState;

/// Per-request ceiling for outbound provider calls.
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screener v{}", env!("CARGO_PKG_VERSION"));

    // One pooled HTTP client shared by every provider
    let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

    let llm: Option<Arc<dyn TextGenerator>> = match &config.anthropic_api_key {
        Some(key) => {
            let client = LlmClient::new(http.clone(), key.clone(), config.llm_models.clone());
            info!("LLM client initialized (models: {})", client.models().join(", "));
            Some(Arc::new(client))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; using regex extraction and score-band evaluations");
            None
        }
    };

    let embedder = match &config.embedding_api_key {
        Some(key) => {
            info!(
                "Embedding client initialized (model: {})",
                config.embedding_model
            );
            EmbeddingClient::new(Arc::new(HttpEmbeddingTransport::new(
                http.clone(),
                config.embedding_api_url.clone(),
                key.clone(),
                config.embedding_model.clone(),
            )))
        }
        None => {
            warn!("EMBEDDING_API_KEY not set; similarity falls back to skill overlap");
            EmbeddingClient::disabled()
        }
    };

    let screener = Screener::new(llm, embedder, config.screening());

    let state = AppState {
        config: config.clone(),
        screener: Arc::new(screener),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
