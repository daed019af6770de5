//! Live frame loop: capture, detect, count, draw.
//!
//! The loop is generic over where frames come from and where the annotated
//! frames go, so the OpenCV camera and HighGUI window are just one pairing.

use anyhow::Result;
use image::RgbImage;
use tracing::{debug, info, warn};

use crate::error::VisionResult;
use crate::inference::PoseDetector;
use crate::overlay::{self, Directive};
use crate::workout::{FrameReport, WorkoutSession};

/// Produces frames in the backend's native format.
pub trait FrameSource {
    type Frame;

    fn read_frame(&mut self) -> Result<Self::Frame>;

    fn to_rgb(&self, frame: &Self::Frame) -> VisionResult<RgbImage>;
}

/// Draws onto frames and displays them.
pub trait FrameSink<F> {
    fn draw(&mut self, frame: &mut F, directives: &[Directive]) -> Result<()>;

    fn show(&mut self, frame: &F) -> Result<()>;

    /// Pumps UI events; true once the user asked to stop.
    fn quit_requested(&mut self) -> Result<bool>;
}

pub struct Trainer<S, K, D> {
    source: S,
    sink: K,
    detector: D,
    session: WorkoutSession,
}

impl<S, K, D> Trainer<S, K, D>
where
    S: FrameSource,
    K: FrameSink<S::Frame>,
    D: PoseDetector,
{
    pub fn new(source: S, sink: K, detector: D, session: WorkoutSession) -> Self {
        Self {
            source,
            sink,
            detector,
            session,
        }
    }

    /// Runs until the sink reports a quit request. Per-frame failures are
    /// logged and the loop carries on.
    pub fn run(&mut self) {
        info!("trainer started, press 'q' to quit");

        loop {
            self.step();

            match self.sink.quit_requested() {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => warn!(error = %e, "polling window events failed"),
            }
        }

        for tracker in self.session.trackers() {
            info!(exercise = %tracker.kind(), reps = tracker.reps(), "session total");
        }
    }

    /// Reads, processes, draws and shows one frame.
    pub fn step(&mut self) -> Option<FrameReport> {
        let mut frame = match self.source.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "camera read failed, frame skipped");
                return None;
            }
        };

        let report = self.annotate(&mut frame);
        if let Err(e) = self.sink.show(&frame) {
            warn!(error = %e, "frame display failed");
        }
        report
    }

    fn annotate(&mut self, frame: &mut S::Frame) -> Option<FrameReport> {
        let rgb = match self.source.to_rgb(frame) {
            Ok(rgb) => rgb,
            Err(e) => {
                warn!(error = %e, "frame conversion failed, frame skipped");
                return None;
            }
        };

        let pose = match self.detector.detect(&rgb) {
            Ok(Some(pose)) => pose,
            Ok(None) => {
                debug!("no person in frame");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "pose detection failed, frame skipped");
                return None;
            }
        };

        let report = self.session.process(&pose);

        let (width, height) = rgb.dimensions();
        let mut directives = overlay::skeleton(&pose, width, height);
        if let Some(report) = &report {
            directives.extend(overlay::hud(report, width, height));
        }
        if let Err(e) = self.sink.draw(frame, &directives) {
            warn!(error = %e, "overlay drawing failed");
        }
        report
    }

    pub fn session(&self) -> &WorkoutSession {
        &self.session
    }
}

#[cfg(feature = "camera")]
mod webcam {
    use std::path::Path;

    use anyhow::{Context, Result};

    use super::Trainer;
    use crate::camera::Camera;
    use crate::config::Config;
    use crate::inference::OnnxPoseDetector;
    use crate::overlay::OverlayWindow;

    impl Trainer<Camera, OverlayWindow, OnnxPoseDetector> {
        pub fn from_config(config: &Config) -> Result<Self> {
            let camera =
                Camera::new(config.camera_id).with_context(|| format!("opening camera {}", config.camera_id))?;
            let detector = OnnxPoseDetector::new(
                Path::new(&config.model_path),
                config.model_input_size,
                config.model_layout,
                config.min_detection_confidence,
            )
            .with_context(|| format!("loading pose model {}", config.model_path))?;
            let session = config.workout_session()?;
            let window = OverlayWindow::new(&config.window_title)?;

            Ok(Self::new(camera, window, detector, session))
        }
    }
}
