//! Whole-video workout analysis.

use image::RgbImage;
use serde::Serialize;

use crate::error::VisionResult;
use crate::exercise::ExerciseKind;
use crate::pose::Pose;
use crate::workout::WorkoutSession;

/// Turns an encoded video into decoded frames.
pub trait VideoDecoder: Send + Sync {
    /// Calls `on_frame` for every frame in order; returns the frame count.
    fn for_each_frame(&self, video: &[u8], on_frame: &mut dyn FnMut(RgbImage)) -> VisionResult<usize>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMetrics {
    pub reps: u32,
    pub form_consistency: f32,
    pub range_of_motion: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoReport {
    pub score: u8,
    pub metrics: VideoMetrics,
    pub ai_confidence: f32,
    pub feedback: String,
}

#[derive(Debug, Clone, Copy)]
struct AngleSpan {
    frames: u32,
    min: f32,
    max: f32,
}

impl Default for AngleSpan {
    fn default() -> Self {
        Self {
            frames: 0,
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
        }
    }
}

/// Feeds decoded poses through a workout session and summarizes the set.
pub struct VideoAnalyzer {
    session: WorkoutSession,
    frames: u32,
    detected: u32,
    visibility_sum: f32,
    spans: [AngleSpan; 3],
}

impl VideoAnalyzer {
    pub fn new(session: WorkoutSession) -> Self {
        Self {
            session,
            frames: 0,
            detected: 0,
            visibility_sum: 0.0,
            spans: [AngleSpan::default(); 3],
        }
    }

    pub fn observe(&mut self, pose: Option<&Pose>) {
        self.frames += 1;
        let Some(pose) = pose else {
            return;
        };
        self.detected += 1;
        self.visibility_sum += pose.mean_visibility();

        let Some(active) = self.session.process(pose).and_then(|report| report.active) else {
            return;
        };
        if let Some(angle) = active.angle {
            let span = &mut self.spans[active.kind.slot()];
            span.frames += 1;
            span.min = span.min.min(angle);
            span.max = span.max.max(angle);
        }
    }

    pub fn finish(self) -> VideoReport {
        let form_consistency = ratio(self.detected, self.frames);
        let ai_confidence = if self.detected == 0 {
            0.0
        } else {
            self.visibility_sum / self.detected as f32
        };
        let range_of_motion = self.range_of_motion();

        let score = (100.0 * (0.4 * form_consistency + 0.4 * range_of_motion + 0.2 * ai_confidence))
            .round()
            .clamp(0.0, 100.0) as u8;

        VideoReport {
            score,
            metrics: VideoMetrics {
                reps: self.session.total_reps(),
                form_consistency,
                range_of_motion,
            },
            ai_confidence,
            feedback: feedback_for(score).to_string(),
        }
    }

    /// Angle span of the most tracked exercise relative to its threshold band.
    fn range_of_motion(&self) -> f32 {
        let Some(kind) = ExerciseKind::ALL
            .into_iter()
            .filter(|kind| self.spans[kind.slot()].frames > 0)
            .max_by_key(|kind| self.spans[kind.slot()].frames)
        else {
            return 0.0;
        };

        let span = self.spans[kind.slot()];
        let def = self.session.tracker(kind).definition();
        let band = def.up_threshold() - def.down_threshold();
        ((span.max - span.min) / band).clamp(0.0, 1.0)
    }
}

fn ratio(part: u32, whole: u32) -> f32 {
    if whole == 0 {
        0.0
    } else {
        part as f32 / whole as f32
    }
}

fn feedback_for(score: u8) -> &'static str {
    match score {
        80..=100 => "Great job! You maintained good form throughout the exercise. Keep the same range of motion on the next set.",
        50..=79 => "Solid effort. Keep your whole body in frame and work through the full range of motion on each rep.",
        _ => "We could not track much of this set. Make sure you are fully visible and well lit, then try again.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::tests::pose_with_angles;

    #[test]
    fn test_empty_video() {
        let report = VideoAnalyzer::new(WorkoutSession::default()).finish();
        assert_eq!(report.score, 0);
        assert_eq!(report.metrics.reps, 0);
        assert_eq!(report.metrics.form_consistency, 0.0);
        assert_eq!(report.ai_confidence, 0.0);
    }

    #[test]
    fn test_squat_set_summary() {
        let mut analyzer = VideoAnalyzer::new(WorkoutSession::default());
        analyzer.observe(None);
        for knee in [175.0, 175.0, 160.0, 170.0, 100.0, 65.0, 170.0, 60.0] {
            analyzer.observe(Some(&pose_with_angles(170.0, knee, 0.8)));
        }
        analyzer.observe(None);

        let report = analyzer.finish();
        assert_eq!(report.metrics.reps, 2);
        assert!((report.metrics.form_consistency - 0.8).abs() < 1e-6);
        // tracked knee span 60..170 covers the whole 70..160 band
        assert_eq!(report.metrics.range_of_motion, 1.0);
        assert!((report.ai_confidence - 0.8).abs() < 1e-4);
        assert_eq!(report.score, 88);
        assert!(report.feedback.starts_with("Great job"));
    }

    #[test]
    fn test_report_json_shape() {
        let report = VideoAnalyzer::new(WorkoutSession::default()).finish();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("aiConfidence").is_some());
        assert!(json["metrics"].get("form_consistency").is_some());
        assert!(json["metrics"].get("range_of_motion").is_some());
    }
}
