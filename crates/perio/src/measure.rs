//! Bone-loss measurement from a detected landmark triple.
//!
//! The bone crest is projected onto the CEJ→apex axis. The projected
//! fraction of the axis length is the bone-loss ratio.

use nalgebra::Vector2;
use perio_landmarks::LandmarkTriple;
use serde::{Deserialize, Serialize};

/// Axes shorter than this (px) cannot be measured.
const MIN_AXIS_LENGTH: f32 = 1e-3;

/// Bone level relative to the root, in pixels and optionally millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneLossMeasurement {
    /// CEJ to apex distance.
    pub root_length_px: f32,
    /// CEJ to the bone crest projected onto the root axis, clamped to the root.
    pub bone_depth_px: f32,
    /// Perpendicular distance of the bone crest from the root axis.
    pub lateral_offset_px: f32,
    /// `100 × bone_depth / root_length`, in `[0, 100]`.
    pub percent: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_length_mm: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bone_depth_mm: Option<f32>,
}

impl BoneLossMeasurement {
    /// Measure a triple. Returns `None` when CEJ and apex coincide.
    ///
    /// `mm_per_pixel` is ignored unless it is finite and positive.
    pub fn from_triple(triple: &LandmarkTriple, mm_per_pixel: Option<f32>) -> Option<Self> {
        let cej = triple.cej.to_point2();
        let axis: Vector2<f32> = triple.apex.to_point2() - cej;
        let root_length_px = axis.norm();
        if !root_length_px.is_finite() || root_length_px < MIN_AXIS_LENGTH {
            return None;
        }
        let dir = axis / root_length_px;
        let rel = triple.bone.to_point2() - cej;

        let t = (rel.dot(&dir) / root_length_px).clamp(0.0, 1.0);
        let lateral_offset_px = (rel.x * dir.y - rel.y * dir.x).abs();
        let bone_depth_px = t * root_length_px;

        let scale = mm_per_pixel.filter(|s| s.is_finite() && *s > 0.0);
        Some(Self {
            root_length_px,
            bone_depth_px,
            lateral_offset_px,
            percent: 100.0 * t,
            root_length_mm: scale.map(|s| root_length_px * s),
            bone_depth_mm: scale.map(|s| bone_depth_px * s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use perio_core::PixelPoint;

    fn triple(c: (i32, i32), b: (i32, i32), a: (i32, i32)) -> LandmarkTriple {
        LandmarkTriple {
            cej: PixelPoint::from(c),
            bone: PixelPoint::from(b),
            apex: PixelPoint::from(a),
        }
    }

    #[test]
    fn vertical_root_measures_straight_fraction() {
        let m = BoneLossMeasurement::from_triple(&triple((100, 50), (100, 80), (100, 150)), None)
            .expect("measurable");
        assert_relative_eq!(m.root_length_px, 100.0);
        assert_relative_eq!(m.bone_depth_px, 30.0);
        assert_relative_eq!(m.percent, 30.0);
        assert_relative_eq!(m.lateral_offset_px, 0.0);
        assert!(m.root_length_mm.is_none());
    }

    #[test]
    fn offset_crest_is_projected_onto_axis() {
        let m = BoneLossMeasurement::from_triple(&triple((0, 0), (6, 40), (0, 100)), Some(0.1))
            .expect("measurable");
        assert_relative_eq!(m.percent, 40.0, epsilon = 1e-4);
        assert_relative_eq!(m.lateral_offset_px, 6.0, epsilon = 1e-4);
        assert_relative_eq!(m.root_length_mm.expect("mm"), 10.0, epsilon = 1e-4);
        assert_relative_eq!(m.bone_depth_mm.expect("mm"), 4.0, epsilon = 1e-4);
    }

    #[test]
    fn crest_beyond_the_root_is_clamped() {
        let above = BoneLossMeasurement::from_triple(&triple((0, 50), (0, 20), (0, 150)), None)
            .expect("measurable");
        assert_relative_eq!(above.percent, 0.0);
        let below = BoneLossMeasurement::from_triple(&triple((0, 50), (0, 200), (0, 150)), None)
            .expect("measurable");
        assert_relative_eq!(below.percent, 100.0);
    }

    #[test]
    fn degenerate_axis_and_bad_scale() {
        assert!(
            BoneLossMeasurement::from_triple(&triple((5, 5), (5, 9), (5, 5)), None).is_none()
        );
        let m = BoneLossMeasurement::from_triple(&triple((0, 0), (0, 5), (0, 10)), Some(-1.0))
            .expect("measurable");
        assert!(m.bone_depth_mm.is_none());
    }
}
