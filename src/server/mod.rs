//! HTTP pose service.
//!
//! - `GET  /health`
//! - `POST /predict`        multipart `file` image, returns landmarks
//! - `POST /cheat-check`    multipart `file` image, returns a quality verdict
//! - `POST /synthesize-tts` text to MP3 through Google Cloud TTS
//! - `POST /feedback`       test summary to an LLM report through OpenRouter
//! - `POST /analyze-video`  multipart `file` video, returns a set summary

pub mod dto;
pub mod error;
pub mod handlers;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::{ApiError, ApiResult};
pub use state::{AppState, AppStateBuilder};

pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.server_config().max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .route("/cheat-check", post(handlers::cheat_check))
        .route("/synthesize-tts", post(handlers::synthesize_tts))
        .route("/feedback", post(handlers::feedback))
        .route("/analyze-video", post(handlers::analyze_video))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
