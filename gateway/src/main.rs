use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use travira_gateway::{
    create_router,
    seed::{apply_seed, load_seed},
    AppState, GatewayConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "travira_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env();
    let state = AppState::new(&config).context("Failed to create service clients")?;

    if let Some(path) = &config.seed_path {
        let seed = load_seed(path).with_context(|| format!("Failed to load seed {:?}", path))?;
        let mut store = state.store.write().await;
        apply_seed(&mut store, seed);
    } else {
        tracing::info!("   No seed file configured, starting empty");
    }

    tracing::info!("   Safety score service: {}", config.endpoints.safety_score_url);
    tracing::info!("   Case report service: {}", config.endpoints.case_report_url);
    tracing::info!("   Blockchain service: {}", config.endpoints.blockchain_url);

    let app = create_router(state);

    let addr = config.bind_addr();
    tracing::info!("Travira Gateway starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
