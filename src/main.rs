use anyhow::Context;
use recession_api::{
    api::{self, AppState},
    config::Config,
    features::FEATURE_COUNT,
    model::ArtifactStore,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_env();
    tracing::info!("loading artifacts: {:?}", cfg.artifacts);

    let store = ArtifactStore::load(&cfg.artifacts);
    match &store {
        ArtifactStore::Loaded { .. } => {
            tracing::info!("loaded model; {} features", FEATURE_COUNT);
        }
        ArtifactStore::Unloaded { reason } => {
            tracing::warn!("starting without a model, /predict will fail: {}", reason);
        }
    }

    let mut state = AppState::new(store);
    state.log_pred = cfg.log_pred;
    let app = api::router(state);

    let addr = std::net::SocketAddr::new(cfg.host, cfg.port);
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}
