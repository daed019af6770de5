use tracing::{debug, trace};

use crate::classifier::{AngleHistory, ExerciseClassifier};
use crate::exercise::{ExerciseDefinition, ExerciseKind, ExerciseTracker, Stage};
use crate::pose::{Point2, Pose};

/// Outcome of one processed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub active: Option<ActiveExercise>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveExercise {
    pub kind: ExerciseKind,
    /// `None` when the tracker was not updated this frame.
    pub angle: Option<f32>,
    /// Joint vertex in normalized image coordinates.
    pub vertex: Point2,
    pub reps: u32,
    pub stage: Stage,
    pub rep_completed: bool,
}

/// Frame-by-frame workout state: one tracker per exercise plus the
/// auto-detection of which exercise is being performed.
pub struct WorkoutSession {
    trackers: [ExerciseTracker; 3],
    history: AngleHistory,
    classifier: ExerciseClassifier,
    active: Option<ExerciseKind>,
    min_visibility: f32,
}

impl Default for WorkoutSession {
    fn default() -> Self {
        Self::new(
            [
                ExerciseDefinition::bicep_curl(),
                ExerciseDefinition::squat(),
                ExerciseDefinition::push_up(),
            ],
            ExerciseClassifier::default(),
            0.0,
        )
    }
}

impl WorkoutSession {
    /// `definitions` must be given in [`ExerciseKind::ALL`] order.
    pub fn new(definitions: [ExerciseDefinition; 3], classifier: ExerciseClassifier, min_visibility: f32) -> Self {
        debug_assert!(definitions
            .iter()
            .zip(ExerciseKind::ALL)
            .all(|(def, kind)| def.kind() == kind));

        Self {
            trackers: definitions.map(ExerciseTracker::new),
            history: AngleHistory::new(),
            classifier,
            active: None,
            min_visibility,
        }
    }

    /// Runs classification and rep counting for one detected pose.
    ///
    /// Returns `None` when the frame is skipped because one of the measured
    /// joint triples is degenerate.
    pub fn process(&mut self, pose: &Pose) -> Option<FrameReport> {
        if let Some(tracker) = self.trackers.iter().find(|t| t.definition().joints().is_degenerate(pose)) {
            debug!(exercise = %tracker.kind(), "degenerate joint geometry, skipping frame");
            return None;
        }

        let angles = self.trackers.each_ref().map(|t| t.definition().joints().angle(pose));
        let deltas = self.history.observe(angles);

        let selected = self.classifier.classify(&deltas, self.active);
        if selected != self.active {
            debug!(from = ?self.active, to = ?selected, "active exercise changed");
        }
        self.active = selected;

        let Some(kind) = selected else {
            return Some(FrameReport { active: None });
        };

        let min_visibility = self.min_visibility;
        let tracker = &mut self.trackers[kind.slot()];
        let joints = tracker.definition().joints();

        let (angle, rep_completed) = if joints.min_visibility(pose) >= min_visibility {
            let before = tracker.reps();
            let angle = tracker.update(pose);
            (Some(angle), tracker.reps() > before)
        } else {
            trace!(exercise = %kind, "joints below visibility floor, tracker not updated");
            (None, false)
        };

        Some(FrameReport {
            active: Some(ActiveExercise {
                kind,
                angle,
                vertex: pose.point(joints.vertex),
                reps: tracker.reps(),
                stage: tracker.stage(),
                rep_completed,
            }),
        })
    }

    pub fn active(&self) -> Option<ExerciseKind> {
        self.active
    }

    pub fn tracker(&self, kind: ExerciseKind) -> &ExerciseTracker {
        &self.trackers[kind.slot()]
    }

    pub fn trackers(&self) -> &[ExerciseTracker; 3] {
        &self.trackers
    }

    pub fn total_reps(&self) -> u32 {
        self.trackers.iter().map(ExerciseTracker::reps).sum()
    }
}
