//! WanderAI collection engine
//!
//! A Rust backend implementing the conversational state machine that
//! gathers trip parameters from free-form user text and hands off a
//! finalized search request.

mod api;
mod completion;
mod extract;
mod prompts;
mod search;
mod session;
mod state_machine;

use api::{create_router, AppState};
use completion::CompletionConfig;
use session::SessionManager;
use state_machine::Mode;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wanderai=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("WANDER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let mode: Mode = std::env::var("WANDER_MODE")
        .ok()
        .map(|m| m.parse())
        .transpose()?
        .unwrap_or(Mode::Scripted);

    // Completion provider (required only in model-assisted mode)
    let client = CompletionConfig::from_env().build_client();
    match (&client, mode) {
        (None, Mode::ModelAssisted) => {
            return Err("model-assisted mode requires OPENAI_API_KEY".into());
        }
        (Some(client), _) => {
            tracing::info!(model = %client.model_id(), "completion provider configured");
        }
        (None, Mode::Scripted) => {}
    }

    // Search hand-off boundary. Downstream search/results handling is a
    // separate collaborator; this consumer logs the finalized requests.
    let (search_tx, mut search_rx) = mpsc::channel::<search::SearchRequest>(8);
    tokio::spawn(async move {
        while let Some(request) = search_rx.recv().await {
            tracing::info!(
                query = %request.query,
                travelers = request.travelers,
                budget = request.budget,
                "search request received"
            );
        }
    });

    let manager = Arc::new(SessionManager::new(mode, client, search_tx));
    let state = AppState::new(manager);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(mode = ?mode, "WanderAI server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
