use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::angle::{calculate_angle, is_degenerate};
use crate::pose::{Joint, Pose};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    BicepCurl,
    Squat,
    PushUp,
}

impl ExerciseKind {
    /// Classifier priority order.
    pub const ALL: [ExerciseKind; 3] = [Self::BicepCurl, Self::Squat, Self::PushUp];

    pub fn name(self) -> &'static str {
        match self {
            Self::BicepCurl => "Bicep Curl",
            Self::Squat => "Squat",
            Self::PushUp => "Push-Up",
        }
    }

    pub fn family(self) -> RepFamily {
        match self {
            Self::BicepCurl | Self::PushUp => RepFamily::CurlLike,
            Self::Squat => RepFamily::SquatLike,
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            Self::BicepCurl => 0,
            Self::Squat => 1,
            Self::PushUp => 2,
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which stage is the resting position and which one completes a rep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepFamily {
    /// Extended limb rests in `Down`; the rep lands on contraction into `Up`.
    CurlLike,
    /// Standing rests in `Up`; the rep lands on descent into `Down`.
    SquatLike,
}

impl RepFamily {
    fn rest(self) -> Stage {
        match self {
            Self::CurlLike => Stage::Down,
            Self::SquatLike => Stage::Up,
        }
    }

    fn active(self) -> Stage {
        match self {
            Self::CurlLike => Stage::Up,
            Self::SquatLike => Stage::Down,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Unknown,
    Up,
    Down,
}

impl Stage {
    /// Overlay label; empty until the first transition.
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointTriple {
    pub proximal: Joint,
    pub vertex: Joint,
    pub distal: Joint,
}

impl JointTriple {
    pub const fn new(proximal: Joint, vertex: Joint, distal: Joint) -> Self {
        Self { proximal, vertex, distal }
    }

    pub fn angle(&self, pose: &Pose) -> f32 {
        calculate_angle(pose.point(self.proximal), pose.point(self.vertex), pose.point(self.distal))
    }

    pub fn is_degenerate(&self, pose: &Pose) -> bool {
        is_degenerate(pose.point(self.proximal), pose.point(self.vertex), pose.point(self.distal))
    }

    /// Lowest visibility among the three joints.
    pub fn min_visibility(&self, pose: &Pose) -> f32 {
        pose[self.proximal]
            .visibility
            .min(pose[self.vertex].visibility)
            .min(pose[self.distal].visibility)
    }
}

const ARM: JointTriple = JointTriple::new(Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist);
const LEG: JointTriple = JointTriple::new(Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle);

#[derive(Debug, Error, PartialEq)]
pub enum ExerciseError {
    #[error("{exercise}: up threshold {up} must be greater than down threshold {down}")]
    InvalidThresholds {
        exercise: ExerciseKind,
        up: f32,
        down: f32,
    },

    #[error("angle change threshold {threshold} must be a finite, non-negative number of degrees")]
    InvalidChangeThreshold { threshold: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseDefinition {
    kind: ExerciseKind,
    joints: JointTriple,
    up_threshold: f32,
    down_threshold: f32,
}

impl ExerciseDefinition {
    pub fn new(
        kind: ExerciseKind,
        joints: JointTriple,
        up_threshold: f32,
        down_threshold: f32,
    ) -> Result<Self, ExerciseError> {
        // also rejects NaN thresholds
        if !(up_threshold > down_threshold) {
            return Err(ExerciseError::InvalidThresholds {
                exercise: kind,
                up: up_threshold,
                down: down_threshold,
            });
        }
        Ok(Self {
            kind,
            joints,
            up_threshold,
            down_threshold,
        })
    }

    pub fn bicep_curl() -> Self {
        Self::builtin(ExerciseKind::BicepCurl)
    }

    pub fn squat() -> Self {
        Self::builtin(ExerciseKind::Squat)
    }

    pub fn push_up() -> Self {
        Self::builtin(ExerciseKind::PushUp)
    }

    pub fn builtin(kind: ExerciseKind) -> Self {
        let (joints, up_threshold, down_threshold) = match kind {
            ExerciseKind::BicepCurl => (ARM, 160.0, 30.0),
            ExerciseKind::Squat => (LEG, 160.0, 70.0),
            ExerciseKind::PushUp => (ARM, 160.0, 90.0),
        };
        Self {
            kind,
            joints,
            up_threshold,
            down_threshold,
        }
    }

    /// Built-in joints for `kind` with custom thresholds.
    pub fn with_thresholds(
        kind: ExerciseKind,
        up_threshold: f32,
        down_threshold: f32,
    ) -> Result<Self, ExerciseError> {
        Self::new(kind, Self::builtin(kind).joints, up_threshold, down_threshold)
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    pub fn joints(&self) -> JointTriple {
        self.joints
    }

    pub fn up_threshold(&self) -> f32 {
        self.up_threshold
    }

    pub fn down_threshold(&self) -> f32 {
        self.down_threshold
    }
}

/// Edge-triggered rep counter for one exercise.
#[derive(Debug, Clone)]
pub struct ExerciseTracker {
    definition: ExerciseDefinition,
    stage: Stage,
    reps: u32,
}

impl ExerciseTracker {
    pub fn new(definition: ExerciseDefinition) -> Self {
        Self {
            definition,
            stage: Stage::Unknown,
            reps: 0,
        }
    }

    /// Measures the exercise angle on `pose` and advances the stage machine.
    /// Returns the measured angle.
    pub fn update(&mut self, pose: &Pose) -> f32 {
        let angle = self.definition.joints.angle(pose);
        self.observe_angle(angle);
        angle
    }

    /// Advances the stage machine with an already measured angle. Returns
    /// true when this angle completed a rep.
    pub fn observe_angle(&mut self, angle: f32) -> bool {
        let family = self.definition.kind.family();

        if angle > self.definition.up_threshold {
            self.stage = family.rest();
        }
        if self.stage == family.rest() && angle < self.definition.down_threshold {
            self.stage = family.active();
            self.reps += 1;
            info!(exercise = %self.definition.kind, reps = self.reps, "rep completed");
            return true;
        }
        false
    }

    pub fn definition(&self) -> &ExerciseDefinition {
        &self.definition
    }

    pub fn kind(&self) -> ExerciseKind {
        self.definition.kind
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn reps(&self) -> u32 {
        self.reps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(kind: ExerciseKind, up: f32, down: f32) -> ExerciseTracker {
        ExerciseTracker::new(ExerciseDefinition::with_thresholds(kind, up, down).unwrap())
    }

    fn reps_after(tracker: &mut ExerciseTracker, angles: &[f32]) -> Vec<u32> {
        angles
            .iter()
            .map(|&angle| {
                tracker.observe_angle(angle);
                tracker.reps()
            })
            .collect()
    }

    #[test]
    fn test_curl_counts_on_contraction() {
        let mut curl = tracker(ExerciseKind::BicepCurl, 160.0, 30.0);
        assert_eq!(reps_after(&mut curl, &[170.0, 150.0, 20.0, 170.0]), vec![0, 0, 1, 1]);
        assert_eq!(curl.stage(), Stage::Down);
    }

    #[test]
    fn test_squat_counts_on_descent() {
        let mut squat = tracker(ExerciseKind::Squat, 160.0, 70.0);
        assert_eq!(reps_after(&mut squat, &[170.0, 65.0, 170.0]), vec![0, 1, 1]);
        assert_eq!(squat.stage(), Stage::Up);
    }

    #[test]
    fn test_no_double_count_while_contracted() {
        let mut curl = tracker(ExerciseKind::BicepCurl, 160.0, 30.0);
        assert_eq!(reps_after(&mut curl, &[170.0, 20.0, 25.0, 170.0]), vec![0, 1, 1, 1]);
    }

    #[test]
    fn test_no_rep_before_rest_position_seen() {
        let mut curl = tracker(ExerciseKind::BicepCurl, 160.0, 30.0);
        assert_eq!(reps_after(&mut curl, &[20.0, 10.0, 100.0]), vec![0, 0, 0]);
        assert_eq!(curl.stage(), Stage::Unknown);
    }

    #[test]
    fn test_deadband_neither_triggers_nor_resets() {
        let mut push_up = tracker(ExerciseKind::PushUp, 160.0, 90.0);
        assert_eq!(
            reps_after(&mut push_up, &[170.0, 80.0, 120.0, 85.0, 165.0, 60.0]),
            vec![0, 1, 1, 1, 1, 2]
        );
    }

    #[test]
    fn test_nan_angle_is_ignored() {
        let mut squat = tracker(ExerciseKind::Squat, 160.0, 70.0);
        squat.observe_angle(170.0);
        assert!(!squat.observe_angle(f32::NAN));
        assert_eq!(squat.stage(), Stage::Up);
        assert_eq!(squat.reps(), 0);
    }

    #[test]
    fn test_thresholds_must_leave_a_band() {
        let err = ExerciseDefinition::with_thresholds(ExerciseKind::Squat, 70.0, 160.0).unwrap_err();
        assert_eq!(
            err,
            ExerciseError::InvalidThresholds {
                exercise: ExerciseKind::Squat,
                up: 70.0,
                down: 160.0
            }
        );
        assert!(ExerciseDefinition::with_thresholds(ExerciseKind::Squat, 90.0, 90.0).is_err());
        assert!(ExerciseDefinition::with_thresholds(ExerciseKind::Squat, f32::NAN, 90.0).is_err());
    }

    #[test]
    fn test_builtin_catalogue() {
        let curl = ExerciseDefinition::bicep_curl();
        assert_eq!(curl.joints().vertex, Joint::LeftElbow);
        assert_eq!((curl.up_threshold(), curl.down_threshold()), (160.0, 30.0));

        let squat = ExerciseDefinition::squat();
        assert_eq!(squat.joints().vertex, Joint::LeftKnee);
        assert_eq!((squat.up_threshold(), squat.down_threshold()), (160.0, 70.0));

        let push_up = ExerciseDefinition::push_up();
        assert_eq!(push_up.joints(), curl.joints());
        assert_eq!(push_up.down_threshold(), 90.0);
    }

    #[test]
    fn test_update_measures_pose_angle() {
        use crate::pose::{Landmark, LANDMARK_COUNT};

        let mut landmarks = [Landmark::new(0.5, 0.5, 0.0, 1.0); LANDMARK_COUNT];
        landmarks[Joint::LeftShoulder.index()] = Landmark::new(0.5, 0.2, 0.0, 1.0);
        landmarks[Joint::LeftElbow.index()] = Landmark::new(0.5, 0.4, 0.0, 1.0);
        landmarks[Joint::LeftWrist.index()] = Landmark::new(0.5, 0.6, 0.0, 1.0);
        let pose = Pose::new(landmarks);

        let mut curl = ExerciseTracker::new(ExerciseDefinition::bicep_curl());
        let angle = curl.update(&pose);
        assert!((angle - 180.0).abs() < 1e-3);
        assert_eq!(curl.stage(), Stage::Down);
    }
}
