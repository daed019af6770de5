//! Joint angle calculation
//!
//! Measures the angle at a vertex from the directions of the two rays
//! vertex→proximal and vertex→distal.

use crate::pose::Point2;

/// Included angle at `b` in degrees, always within [0, 180].
///
/// Non-finite inputs yield NaN. Coincident points fall back to the `atan2`
/// convention for a zero-length ray and produce a finite but meaningless
/// value; callers that care check [`is_degenerate`] first.
pub fn calculate_angle(a: Point2, b: Point2, c: Point2) -> f32 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let angle = radians.to_degrees().abs();

    let angle = if angle > 180.0 { 360.0 - angle } else { angle };
    // f32 rounding near a full turn can land a hair outside the range
    angle.clamp(0.0, 180.0)
}

const MIN_RAY_LENGTH: f32 = 1e-6;

/// True when either ray has no direction or any coordinate is non-finite.
pub fn is_degenerate(a: Point2, b: Point2, c: Point2) -> bool {
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return true;
    }
    a.distance(b) < MIN_RAY_LENGTH || c.distance(b) < MIN_RAY_LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(x: f32, y: f32) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn test_straight_arm() {
        let angle = calculate_angle(p(0.0, 0.0), p(0.5, 0.0), p(1.0, 0.0));
        assert!((angle - 180.0).abs() < 1e-3);
    }

    #[test]
    fn test_bent_arm() {
        let angle = calculate_angle(p(0.0, 0.0), p(0.5, 0.0), p(0.5, 0.5));
        assert!((angle - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_reflex_side_is_folded_back() {
        // Raw difference is 270 degrees; the included angle is 90.
        let angle = calculate_angle(p(0.0, -1.0), p(0.0, 0.0), p(-1.0, 0.0));
        assert!((angle - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_nan_propagates() {
        let angle = calculate_angle(p(f32::NAN, 0.0), p(0.0, 0.0), p(1.0, 0.0));
        assert!(angle.is_nan());
    }

    #[test]
    fn test_coincident_points_do_not_panic() {
        let angle = calculate_angle(p(0.3, 0.3), p(0.3, 0.3), p(0.3, 0.3));
        assert!(angle.is_finite());
        assert!(is_degenerate(p(0.3, 0.3), p(0.3, 0.3), p(0.3, 0.3)));
    }

    #[test]
    fn test_degenerate_detection() {
        assert!(!is_degenerate(p(0.0, 0.0), p(0.5, 0.0), p(0.5, 0.5)));
        assert!(is_degenerate(p(0.5, 0.0), p(0.5, 0.0), p(0.5, 0.5)));
        assert!(is_degenerate(p(0.0, 0.0), p(0.5, f32::INFINITY), p(0.5, 0.5)));
    }

    fn coord() -> impl Strategy<Value = f32> {
        -10.0f32..10.0
    }

    proptest! {
        #[test]
        fn prop_collinear_with_vertex_between_is_straight(
            bx in coord(), by in coord(),
            dx in 0.1f32..5.0, dy in 0.1f32..5.0,
            s in 0.1f32..5.0, t in 0.1f32..5.0,
        ) {
            let b = p(bx, by);
            let a = p(bx - dx * s, by - dy * s);
            let c = p(bx + dx * t, by + dy * t);
            prop_assert!((calculate_angle(a, b, c) - 180.0).abs() < 0.05);
        }

        #[test]
        fn prop_perpendicular_rays_are_right_angle(
            bx in coord(), by in coord(),
            dx in 0.1f32..5.0, dy in 0.1f32..5.0,
            s in 0.1f32..5.0, t in 0.1f32..5.0,
        ) {
            let b = p(bx, by);
            let a = p(bx + dx * s, by + dy * s);
            let c = p(bx - dy * t, by + dx * t);
            prop_assert!((calculate_angle(a, b, c) - 90.0).abs() < 0.05);
        }

        #[test]
        fn prop_symmetric_in_endpoints(
            ax in coord(), ay in coord(),
            bx in coord(), by in coord(),
            cx in coord(), cy in coord(),
        ) {
            let (a, b, c) = (p(ax, ay), p(bx, by), p(cx, cy));
            prop_assume!(!is_degenerate(a, b, c));
            let forward = calculate_angle(a, b, c);
            let backward = calculate_angle(c, b, a);
            prop_assert!((forward - backward).abs() < 1e-3);
        }

        #[test]
        fn prop_output_within_half_turn(
            ax in coord(), ay in coord(),
            bx in coord(), by in coord(),
            cx in coord(), cy in coord(),
        ) {
            let (a, b, c) = (p(ax, ay), p(bx, by), p(cx, cy));
            prop_assume!(!is_degenerate(a, b, c));
            let angle = calculate_angle(a, b, c);
            prop_assert!((0.0..=180.0).contains(&angle));
        }
    }
}
