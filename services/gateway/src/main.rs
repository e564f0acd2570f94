mod error;
mod handlers;
mod models;
mod router;
mod settings;
mod state;

use order_pipeline::OrderPipeline;
use router::create_router;
use settings::AppConfig;
use state::AppState;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,gateway=debug,order_pipeline=debug")),
        )
        .init();

    tracing::info!("Starting Flower Exchange gateway");

    let config = AppConfig::load()?;
    tracing::info!(
        project_root = %config.pipeline.project_root.display(),
        engine = %config.pipeline.engine_program().display(),
        "Pipeline configured"
    );

    let state = AppState::new(OrderPipeline::from_config(config.pipeline));
    let app = create_router(state);

    // Bind and serve
    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
