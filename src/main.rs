use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use feelog_api::app;
use feelog_api::config::Config;
use feelog_api::db::Database;
use feelog_api::services::analysis::OpenRouterClient;
use feelog_api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feelog_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    let db = Database::connect(&config).await?;
    db.migrate().await?;
    tracing::info!(backend = db.backend_name(), env = ?config.environment, "Database migrations applied");

    let analyzer = Arc::new(OpenRouterClient::from_config(&config)?);
    if config.openrouter_api_key.is_none() {
        tracing::warn!("OPENROUTER_API_KEY is not set, diary analysis will fail");
    }

    let state = AppState::new(db, config.clone(), analyzer);
    app::spawn_rate_limit_cleanup(&state);

    let router = app::router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
