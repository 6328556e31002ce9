use std::sync::Arc;

use api_router::{api_routes, api_state::ApiState};
use axum::Router;
use common::{
    session::{ExpirySweeper, SessionStore},
    utils::{
        config::{get_config, AppConfig, VectorBackend},
        embedding::EmbeddingProvider,
    },
    vector::{InMemoryVectorStore, PineconeStore, VectorStore},
};
use ingestion_pipeline::IngestionPipeline;
use retrieval_pipeline::QaPipeline;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = get_config()?;

    let (router, sweeper) = build_app(&config).await?;
    let app = router.layer(TraceLayer::new_for_http());

    // The sweeper shares the session store with the handlers and runs until
    // shutdown is signalled.
    let shutdown = CancellationToken::new();
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown.clone()));

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;

    let signal_token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
            signal_token.cancel();
        })
        .await?;

    shutdown.cancel();
    sweeper_handle.await?;

    Ok(())
}

/// Wires the shared stores and pipelines into a router and the sweeper that
/// cleans up behind them.
async fn build_app(config: &AppConfig) -> anyhow::Result<(Router, ExpirySweeper)> {
    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    let embedder =
        Arc::new(EmbeddingProvider::from_config(config, Some(Arc::clone(&openai_client))).await?);
    info!(
        embedding_backend = embedder.backend_label(),
        embedding_dimension = embedder.dimension(),
        "Embedding provider initialized"
    );
    if embedder.dimension() != config.embedding_dimension {
        warn!(
            configured = config.embedding_dimension,
            actual = embedder.dimension(),
            "Embedding dimension differs from configuration; using the provider's value"
        );
    }

    let vectors: Arc<dyn VectorStore> = match config.vector_backend {
        VectorBackend::Pinecone => Arc::new(PineconeStore::new(
            &config.pinecone_api_key,
            &config.pinecone_index,
            &config.pinecone_cloud,
            &config.pinecone_region,
            embedder.dimension(),
        )),
        VectorBackend::Memory => {
            warn!("Using the in-memory vector store; vectors will not survive a restart");
            Arc::new(InMemoryVectorStore::new(embedder.dimension()))
        }
    };
    vectors.ensure_index().await?;

    let sessions = Arc::new(SessionStore::new(config.max_files_per_session));

    let ingestion = Arc::new(IngestionPipeline::new(
        Arc::clone(&sessions),
        Arc::clone(&vectors),
        Arc::clone(&embedder),
        config,
    ));
    let qa = Arc::new(QaPipeline::new(
        Arc::clone(&vectors),
        embedder,
        openai_client,
        config,
    ));

    let sweeper = ExpirySweeper::new(
        Arc::clone(&sessions),
        Arc::clone(&vectors),
        &config.upload_dir,
        config.session_ttl_secs,
        config.sweep_interval_secs,
    );

    let state = ApiState::new(sessions, vectors, ingestion, qa, config.clone());

    Ok((api_routes(state), sweeper))
}
