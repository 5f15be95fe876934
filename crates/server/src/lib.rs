use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod ai;
pub mod config;
pub mod error;
pub mod error_log;
pub mod rate_limit;
pub mod routes;

use ai::{CodeGenerator, GeminiClient};
use config::ServerConfig;
use rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub generator: Arc<dyn CodeGenerator>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: ServerConfig, generator: Arc<dyn CodeGenerator>) -> Self {
        let limiter = RateLimiter::new(config.rate_limit_max, config.rate_limit_window);
        Self {
            config: Arc::new(config),
            generator,
            limiter: Arc::new(limiter),
        }
    }

    /// State backed by the Gemini client configured from `config`.
    pub fn with_gemini(config: ServerConfig) -> Self {
        let client = GeminiClient::new(config.gemini_api_key.clone(), config.gemini_model.clone());
        Self::new(config, Arc::new(client))
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/api/generate", post(routes::generate))
        .route("/api/log/error", post(routes::log_error))
        .route("/api/check", post(routes::check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
