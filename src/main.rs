use anyhow::Context;
use scoreboard::{
    config::{Config, StorageBackend},
    repository::{
        HostedTableRepository, InMemoryScoreboardRepository, PostgresScoreboardRepository,
        ScoreboardRepository,
    },
    router, AppState,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scoreboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting team scoreboard server");

    let config = Config::from_env()?;
    let weights = Arc::new(config.load_weights()?);
    info!(
        policy = ?config.scoring_policy,
        weights_file = ?config.weights_file,
        "Scoring weights loaded"
    );

    let repository: Arc<dyn ScoreboardRepository + Send + Sync> = match &config.storage {
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            Arc::new(InMemoryScoreboardRepository::new())
        }
        StorageBackend::Postgres { database_url } => {
            let pool = sqlx::PgPool::connect(database_url)
                .await
                .context("Failed to connect to database")?;
            let repository = PostgresScoreboardRepository::new(pool);
            repository.run_migrations().await?;
            info!("Using PostgreSQL storage");
            Arc::new(repository)
        }
        StorageBackend::Hosted(hosted) => {
            info!(base_url = %hosted.base_url, "Using hosted table storage");
            Arc::new(HostedTableRepository::new(hosted.clone())?)
        }
    };

    let app_state = AppState::new(repository, weights);

    let app = router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let address = config.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on http://{address}");
    axum::serve(listener, app).await?;

    Ok(())
}
