mod analysis;
mod chat;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod questionnaire;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{FallbackGenerator, HuggingFaceClient, TextGenerator};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Talent Agent API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (optional)
    let db = match &config.database_url {
        Some(url) => Some(create_pool(url).await?),
        None => {
            warn!("DATABASE_URL not set; submissions will not be persisted");
            None
        }
    };

    // Initialize inference: hosted endpoint, then local fallback if configured
    let primary = HuggingFaceClient::new(
        "huggingface",
        config.hf_api_url.clone(),
        Some(config.hf_api_key.clone()),
        config.llm_max_retries,
    )?;
    info!("LLM client initialized ({})", primary.name());

    let fallback = match &config.fallback_inference_url {
        Some(url) => {
            let local = HuggingFaceClient::new("local", url.clone(), None, 1)?;
            info!("Fallback inference backend: {}", local.name());
            Some(Arc::new(local) as Arc<dyn TextGenerator>)
        }
        None => None,
    };
    let llm: Arc<dyn TextGenerator> = Arc::new(FallbackGenerator::new(Arc::new(primary), fallback));

    // Build app state
    let state = AppState {
        db,
        llm,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins to the questionnaire front end

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
