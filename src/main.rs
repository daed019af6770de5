use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rep_sentinel::trainer::Trainer;
use rep_sentinel::Config;

/// Webcam personal trainer that counts curls, squats and push-ups.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "REP_SENTINEL_CONFIG")]
    config: Option<PathBuf>,

    /// Camera device index
    #[arg(long)]
    camera: Option<i32>,

    /// Pose landmark ONNX model
    #[arg(long)]
    model: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(camera) = args.camera {
        config.camera_id = camera;
    }
    if let Some(model) = args.model {
        config.model_path = model;
    }

    info!("rep-sentinel {} starting", env!("CARGO_PKG_VERSION"));
    let mut trainer = Trainer::from_config(&config)?;
    trainer.run();
    Ok(())
}
