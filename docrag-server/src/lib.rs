//! `docrag-server` exposes the ingestion and query pipelines over HTTP.
//!
//! Two event endpoints mirror the durable functions (`ingest_pdf`,
//! `query_pdf`); the rest of the surface is health reporting. State is wired
//! once at startup from [`Settings`] and shared across handlers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use docrag_pipeline::{OpenAIChatModel, OpenAIEmbedder, QdrantStore};

pub mod functions;
pub mod logging;
pub mod routes;
pub mod settings;
pub mod state;

pub use routes::app_router;
pub use settings::Settings;
pub use state::AppState;

/// Connect the real backends and serve until interrupted.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let settings = Arc::new(settings);

    let store = QdrantStore::connect(
        &settings.qdrant_url,
        &settings.qdrant_collection,
        settings.openai_embed_dim,
        Duration::from_secs(settings.qdrant_timeout_secs),
    )
    .await?;

    let mut embedder = OpenAIEmbedder::new(
        &settings.openai_api_key,
        &settings.openai_embed_model,
        settings.openai_embed_dim,
    )?;
    let mut chat = OpenAIChatModel::new(&settings.openai_api_key, &settings.openai_chat_model)?;
    if let Some(base_url) = &settings.openai_base_url {
        embedder = embedder.with_base_url(base_url);
        chat = chat.with_base_url(base_url);
    }

    let state = AppState::new(
        Arc::clone(&settings),
        Arc::new(store),
        Arc::new(embedder),
        Arc::new(chat),
    )?;
    let app = app_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .with_context(|| format!("invalid host/port {}:{}", settings.host, settings.port))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "Starting {} in {} mode, listening on http://{}",
        settings.app_name, settings.app_env, addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Shutting down {}", settings.app_name);
    Ok(())
}

async fn shutdown_signal() {
    // Serve until the process is asked to stop; bail out of waiting if the
    // signal handler cannot be installed.
    if tokio::signal::ctrl_c().await.is_err() {
        info!("ctrl-c handler unavailable, shutting down immediately");
    }
}
