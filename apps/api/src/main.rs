mod config;
mod errors;
mod generation;
mod ingest;
mod llm_client;
mod moderation;
mod retrieval;
mod routes;
mod search;
mod state;
mod storage;
#[cfg(test)]
mod testing;
mod translation;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::search::opensearch::OpenSearchClient;
use crate::state::AppState;
use crate::storage::blob::S3BlobStore;
use crate::storage::terms::PgTermStore;

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

    info!("Starting Terminus API v{}", env!("CARGO_PKG_VERSION"));

    // Search index
    let record_store = OpenSearchClient::new(
        &config.opensearch_endpoint,
        config.opensearch_index.clone(),
        config.opensearch_credentials(),
    )?;
    info!("Search client initialized (index: {})", record_store.index());

    // Terminology table
    let terms = PgTermStore::connect(&config.database_url).await?;

    // S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let blobs = S3BlobStore::new(s3, config.s3_bucket.clone());
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Model client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (default model: {})", config.model_id);

    let state = AppState {
        record_store: Arc::new(record_store),
        llm: Arc::new(llm),
        blobs: Arc::new(blobs),
        terms: Arc::new(terms),
        config: config.clone(),
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

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "terminus-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.aws_region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
