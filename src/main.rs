mod config;

use chat_relay::{AppState, build_metrics_layer_and_handle, build_metrics_router, build_router};
use clap::Parser as _;
use config::Config;
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

#[tokio::main]
#[instrument]
pub async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse().validate()?;
    info!("Starting chat relay with config: {:?}", config);

    if config.openai_api_key.as_deref().is_none_or(str::is_empty) {
        warn!("OPENAI_API_KEY is not set; upstream calls will be rejected");
    }
    if config.access_token.as_deref().is_none_or(str::is_empty) {
        warn!("ACCESS_TOKEN is not set; /api/chat is open to any caller");
    }

    let app_state = AppState::new(config.upstream(), config.access_token.clone(), config.pool())
        .with_max_body_bytes(config.max_body_bytes);
    let mut router = build_router(app_state);

    if config.metrics {
        let (prometheus_layer, handle) =
            build_metrics_layer_and_handle(config.metrics_prefix.clone());
        router = router.layer(prometheus_layer);

        let metrics_addr = format!("{}:{}", config.bind, config.metrics_port);
        let metrics_listener = TcpListener::bind(&metrics_addr).await?;
        info!("Metrics endpoint listening on {}", metrics_addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(metrics_listener, build_metrics_router(handle)).await {
                tracing::error!("Metrics server failed: {}", e);
            }
        });
    }

    let bind_addr = format!("{}:{}", config.bind, config.port);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Chat relay listening on {}", bind_addr);

    axum::serve(listener, router).await?;

    Ok(())
}
