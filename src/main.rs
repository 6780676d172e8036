use anyhow::Context;
use grocerylist::domain::default_samples;
use grocerylist::{api, config::Config, db::init_db, HttpListSource, ListCoordinator, Repository};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;

    let pool = init_db(&config.database_path)
        .await
        .with_context(|| format!("Failed to initialize database at {}", config.database_path))?;
    let repo = Arc::new(Repository::new(pool));

    if config.seed_samples {
        let seeded = repo
            .seed_if_empty(&default_samples())
            .await
            .context("Failed to seed sample items")?;
        if seeded > 0 {
            tracing::info!("Seeded {} sample items", seeded);
        }
    }

    let source = Arc::new(HttpListSource::new(
        config.import_url.clone(),
        config.import_max_elapsed,
    ));
    let mut coordinator = ListCoordinator::new(repo.clone(), source);
    if let Err(e) = coordinator.load().await {
        tracing::warn!("Initial load failed, starting with an empty list: {}", e);
    }

    let app = api::create_router(api::AppState::new(repo, coordinator));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
