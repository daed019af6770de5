//! Heuristic exercise auto-detection from per-frame angle changes.

use serde::Serialize;

use crate::exercise::{ExerciseError, ExerciseKind};

pub const DEFAULT_ANGLE_CHANGE_THRESHOLD: f32 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AngleDelta {
    pub previous: f32,
    pub current: f32,
    pub delta: f32,
}

/// Angle change of every tracked exercise for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AngleDeltas {
    slots: [AngleDelta; 3],
}

impl AngleDeltas {
    #[cfg(test)]
    pub(crate) fn from_deltas(bicep_curl: f32, squat: f32, push_up: f32) -> Self {
        let slot = |delta| AngleDelta {
            previous: 0.0,
            current: delta,
            delta,
        };
        Self {
            slots: [slot(bicep_curl), slot(squat), slot(push_up)],
        }
    }

    pub fn get(&self, kind: ExerciseKind) -> AngleDelta {
        self.slots[kind.slot()]
    }

    pub fn delta(&self, kind: ExerciseKind) -> f32 {
        self.get(kind).delta
    }
}

/// Remembers last frame's angles and turns each new frame into deltas.
#[derive(Debug, Clone, Default)]
pub struct AngleHistory {
    previous: [f32; 3],
}

impl AngleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// `angles` is indexed in [`ExerciseKind::ALL`] order.
    pub fn observe(&mut self, angles: [f32; 3]) -> AngleDeltas {
        let mut slots = [AngleDelta::default(); 3];
        for kind in ExerciseKind::ALL {
            let i = kind.slot();
            slots[i] = AngleDelta {
                previous: self.previous[i],
                current: angles[i],
                delta: angles[i] - self.previous[i],
            };
        }
        self.previous = angles;
        AngleDeltas { slots }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExerciseClassifier {
    threshold: f32,
}

impl Default for ExerciseClassifier {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ANGLE_CHANGE_THRESHOLD,
        }
    }
}

impl ExerciseClassifier {
    /// `threshold` is in degrees per frame and must be finite and non-negative.
    pub fn new(threshold: f32) -> Result<Self, ExerciseError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ExerciseError::InvalidChangeThreshold { threshold });
        }
        Ok(Self { threshold })
    }

    /// Picks the exercise whose angle alone moved by more than the threshold.
    /// When no exercise or several exercises moved, `previous` is kept.
    pub fn classify(&self, deltas: &AngleDeltas, previous: Option<ExerciseKind>) -> Option<ExerciseKind> {
        let moved = |kind: ExerciseKind| deltas.delta(kind).abs() > self.threshold;

        let detected = ExerciseKind::ALL.into_iter().find(|&candidate| {
            moved(candidate)
                && ExerciseKind::ALL
                    .into_iter()
                    .filter(|&other| other != candidate)
                    .all(|other| !moved(other))
        });

        detected.or(previous)
    }
}
