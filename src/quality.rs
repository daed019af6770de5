//! Image-quality heuristics that flag snapshots unlikely to show a real,
//! in-frame athlete.

use image::GrayImage;
use imageproc::filter::laplacian_filter;
use serde::{Deserialize, Serialize};

use crate::pose::Pose;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheatThresholds {
    /// Minimum normalized area of the landmark bounding box.
    pub min_bbox_area: f32,
    /// Minimum variance of the Laplacian of the grayscale image.
    pub min_sharpness: f64,
    pub min_avg_visibility: f32,
}

impl Default for CheatThresholds {
    fn default() -> Self {
        Self {
            min_bbox_area: 0.02,
            min_sharpness: 10.0,
            min_avg_visibility: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheatReason {
    NoPersonDetected,
    SmallBbox,
    LowSharpness,
    LowVisibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub avg_visibility: f32,
    pub bbox_area: f32,
    pub sharpness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheatVerdict {
    pub cheat: bool,
    pub reasons: Vec<CheatReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<QualityMetrics>,
}

impl CheatVerdict {
    pub fn no_person() -> Self {
        Self {
            cheat: true,
            reasons: vec![CheatReason::NoPersonDetected],
            metrics: None,
        }
    }
}

/// Normalized area of the axis-aligned box around every landmark.
pub fn bbox_area(pose: &Pose) -> f32 {
    let (mut min_x, mut max_x) = (f32::INFINITY, f32::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f32::INFINITY, f32::NEG_INFINITY);
    for lm in pose.landmarks() {
        min_x = min_x.min(lm.x);
        max_x = max_x.max(lm.x);
        min_y = min_y.min(lm.y);
        max_y = max_y.max(lm.y);
    }
    ((max_x - min_x) * (max_y - min_y)).max(0.0)
}

/// Variance of the 4-neighbour Laplacian response.
pub fn sharpness(gray: &GrayImage) -> f64 {
    let laplacian = laplacian_filter(gray);
    let n = laplacian.len() as f64;
    if n == 0.0 {
        return 0.0;
    }

    let mean = laplacian.pixels().map(|p| p[0] as f64).sum::<f64>() / n;
    laplacian
        .pixels()
        .map(|p| {
            let d = p[0] as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n
}

pub fn assess(pose: Option<&Pose>, gray: &GrayImage, thresholds: &CheatThresholds) -> CheatVerdict {
    let Some(pose) = pose else {
        return CheatVerdict::no_person();
    };

    let metrics = QualityMetrics {
        avg_visibility: pose.mean_visibility(),
        bbox_area: bbox_area(pose),
        sharpness: sharpness(gray),
    };

    let mut reasons = Vec::new();
    if metrics.bbox_area < thresholds.min_bbox_area {
        reasons.push(CheatReason::SmallBbox);
    }
    if metrics.sharpness < thresholds.min_sharpness {
        reasons.push(CheatReason::LowSharpness);
    }
    if metrics.avg_visibility < thresholds.min_avg_visibility {
        reasons.push(CheatReason::LowVisibility);
    }

    CheatVerdict {
        cheat: !reasons.is_empty(),
        reasons,
        metrics: Some(metrics),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Landmark, LANDMARK_COUNT};
    use image::Luma;
    use pretty_assertions::assert_eq;

    fn spread_pose(visibility: f32, scale: f32) -> Pose {
        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        for (i, lm) in landmarks.iter_mut().enumerate() {
            let t = i as f32 / (LANDMARK_COUNT - 1) as f32;
            *lm = Landmark::new(0.5 + scale * (t - 0.5), 0.5 + scale * (0.5 - t), 0.0, visibility);
        }
        Pose::new(landmarks)
    }

    fn checkerboard() -> GrayImage {
        GrayImage::from_fn(64, 64, |x, y| if (x / 8 + y / 8) % 2 == 0 { Luma([0]) } else { Luma([255]) })
    }

    #[test]
    fn test_bbox_area() {
        let pose = spread_pose(1.0, 0.6);
        assert!((bbox_area(&pose) - 0.36).abs() < 1e-4);
    }

    #[test]
    fn test_flat_image_has_no_sharpness() {
        let flat = GrayImage::from_pixel(32, 32, Luma([128]));
        assert_eq!(sharpness(&flat), 0.0);
        assert!(sharpness(&checkerboard()) > 1000.0);
    }

    #[test]
    fn test_clean_snapshot_passes() {
        let verdict = assess(Some(&spread_pose(0.9, 0.6)), &checkerboard(), &CheatThresholds::default());
        assert!(!verdict.cheat);
        assert!(verdict.reasons.is_empty());
        assert!(verdict.metrics.is_some());
    }

    #[test]
    fn test_every_failed_heuristic_is_reported() {
        let flat = GrayImage::from_pixel(32, 32, Luma([128]));
        let verdict = assess(Some(&spread_pose(0.1, 0.1)), &flat, &CheatThresholds::default());
        assert!(verdict.cheat);
        assert_eq!(
            verdict.reasons,
            vec![CheatReason::SmallBbox, CheatReason::LowSharpness, CheatReason::LowVisibility]
        );
    }

    #[test]
    fn test_missing_person_is_cheat() {
        let verdict = assess(None, &checkerboard(), &CheatThresholds::default());
        assert_eq!(verdict, CheatVerdict::no_person());
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json, serde_json::json!({"cheat": true, "reasons": ["no_person_detected"]}));
    }
}
