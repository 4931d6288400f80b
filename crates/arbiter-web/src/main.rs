//! Arbiter Web Server
//!
//! Run with: cargo run -p arbiter-web

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use arbiter_llm::backend::GeminiBackend;
use arbiter_llm::judge::JudgeEvaluator;
use arbiter_llm::orchestrator::Orchestrator;
use arbiter_web::config::ServerConfig;
use arbiter_web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ServerConfig::from_env();
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set — model calls will fail until it is provided");
    }

    info!(model = %config.model, "Starting Arbiter gateway...");

    // Create app state
    let backend = Arc::new(GeminiBackend::new(
        config.gemini_api_key.clone().unwrap_or_default(),
        config.model.clone(),
    ));
    let judge = JudgeEvaluator::new(backend.clone());
    let state = AppState::new(Orchestrator::new(backend, judge));

    // Build router
    let app = arbiter_web::router::build_router(state);

    // Bind to port
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
