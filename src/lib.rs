//! Pose-based exercise rep counting.
//!
//! The core (`angle`, `exercise`, `classifier`, `workout`) is pure and works on
//! landmarks from any source. Detection backends sit behind the `onnx` and
//! `camera` features; the HTTP pose service in [`server`] only needs a
//! [`PoseDetector`] to be injected.

pub mod angle;
pub mod classifier;
pub mod config;
pub mod error;
pub mod exercise;
pub mod inference;
pub mod overlay;
pub mod pose;
pub mod quality;
pub mod server;
pub mod trainer;
pub mod video;
pub mod workout;

#[cfg(feature = "camera")]
pub mod camera;

pub use angle::calculate_angle;
pub use classifier::{AngleHistory, ExerciseClassifier};
pub use config::Config;
pub use error::{VisionError, VisionResult};
pub use exercise::{ExerciseDefinition, ExerciseKind, ExerciseTracker, Stage};
pub use inference::PoseDetector;
pub use pose::{Joint, Landmark, Pose};
pub use workout::{FrameReport, WorkoutSession};
