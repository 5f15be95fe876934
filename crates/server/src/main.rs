use std::net::SocketAddr;

use server::{app, config::ServerConfig, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set; /api/generate will fail");
    }
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let router = app(AppState::with_gemini(config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await
}
