use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

mod api;
mod config;
mod models;
mod services;
mod validation;

use config::Config;
use services::database::{PostgresExecutor, QueryExecutor};
use services::{AnalyticsService, InsightGenerator, LlmClient, Translator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Starting server on {}", config.server_address());

    // Wire up the analytics pipeline
    let llm: Arc<dyn services::ChatCompletion> = Arc::new(LlmClient::new(&config.llm)?);
    let executor: Arc<dyn QueryExecutor> = Arc::new(PostgresExecutor::new(&config.database)?);

    if let Err(e) = executor.test_connection().await {
        error!("Database connection test failed: {}", e);
    }

    let analytics = Arc::new(AnalyticsService::new(
        Translator::new(llm.clone(), config.query.row_limit, config.query.max_context_turns),
        InsightGenerator::new(llm),
        executor,
        &config.query,
    ));

    // Create router with state
    let app = api::routes::create_router_with_state(analytics);

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
