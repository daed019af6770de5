use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rep_sentinel::inference::OnnxPoseDetector;
use rep_sentinel::server::{create_router, AppState};
use rep_sentinel::Config;

/// HTTP pose service: landmarks, snapshot checks, TTS, feedback, video scoring.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "REP_SENTINEL_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides `server.bind_addr`
    #[arg(long)]
    bind: Option<String>,

    /// Pose landmark ONNX model
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into()))
        .init();

    let args = Args::parse();
    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    if let Some(model) = args.model {
        config.model_path = model;
    }

    let detector = OnnxPoseDetector::new(
        Path::new(&config.model_path),
        config.model_input_size,
        config.model_layout,
        config.min_detection_confidence,
    )
    .with_context(|| format!("loading pose model {}", config.model_path))?;

    let bind_addr = config.server.bind_addr.clone();
    let builder = AppState::builder(Arc::new(detector), config);
    #[cfg(feature = "camera")]
    let builder = builder.video_decoder(Arc::new(rep_sentinel::camera::OpenCvVideoDecoder));
    let state = builder.build()?;

    if state.video_decoder().is_none() {
        warn!("built without the camera feature, /analyze-video will answer 503");
    }
    if state.feedback_api_key().is_none() {
        warn!("no OpenRouter key configured, /feedback is disabled");
    }
    if state.tts_api_key().is_none() {
        warn!("no Google TTS key configured, /synthesize-tts is disabled");
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!("pose service listening on {bind_addr}");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("pose service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
