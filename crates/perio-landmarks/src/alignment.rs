//! Geometric plausibility check for a CEJ / bone crest / apex triple.

use std::fmt;

use perio_core::PixelPoint;
use serde::{Deserialize, Serialize};

use crate::landmarks::LandmarkTriple;

/// Alignment validator settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentParams {
    /// Minimum vertical gap between consecutive landmarks, fraction of span.
    pub gap_frac: f32,
    /// Upper bound of that gap, px.
    pub gap_floor_px: f32,
    /// Horizontal tolerance as a fraction of the max tooth width.
    pub x_tolerance_width_frac: f32,
    /// Horizontal tolerance as a fraction of the span.
    pub x_tolerance_span_frac: f32,
    /// CEJ→bone must be shorter than this fraction of the span.
    pub max_cej_to_bone: f32,
    /// CEJ→bone must be longer than this fraction of the span.
    pub min_cej_to_bone: f32,
    /// Bone→apex must be longer than this fraction of the span.
    pub min_bone_to_apex: f32,
}

impl Default for AlignmentParams {
    fn default() -> Self {
        Self {
            gap_frac: 0.15,
            gap_floor_px: 10.0,
            x_tolerance_width_frac: 0.4,
            x_tolerance_span_frac: 0.25,
            max_cej_to_bone: 0.7,
            min_cej_to_bone: 0.1,
            min_bone_to_apex: 0.2,
        }
    }
}

/// Why a triple was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlignmentRejection {
    /// Landmarks are not top-to-bottom with the minimum gap.
    Ordering { min_gap: f32 },
    /// A landmark strays too far from the triple's mean x.
    HorizontalAlignment { max_deviation: f32, tolerance: f32 },
    /// Spacing ratios are outside normal anatomy.
    Proportions {
        cej_to_bone_ratio: f32,
        bone_to_apex_ratio: f32,
    },
}

impl fmt::Display for AlignmentRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordering { min_gap } => write!(
                f,
                "landmarks are not ordered CEJ above bone above apex (min gap {min_gap:.1} px)"
            ),
            Self::HorizontalAlignment {
                max_deviation,
                tolerance,
            } => write!(
                f,
                "landmarks are not vertically aligned (deviation {max_deviation:.1} px > {tolerance:.1} px)"
            ),
            Self::Proportions {
                cej_to_bone_ratio,
                bone_to_apex_ratio,
            } => write!(
                f,
                "implausible landmark spacing (CEJ-bone {cej_to_bone_ratio:.2}, bone-apex {bone_to_apex_ratio:.2} of span)"
            ),
        }
    }
}

/// Distances used by the validator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TripleSpans {
    pub total: f32,
    pub cej_to_bone: f32,
    pub bone_to_apex: f32,
}

impl TripleSpans {
    pub fn of(triple: &LandmarkTriple) -> Self {
        Self {
            total: triple.cej.distance(triple.apex),
            cej_to_bone: triple.cej.distance(triple.bone),
            bone_to_apex: triple.bone.distance(triple.apex),
        }
    }
}

/// `min(gap_frac × total, gap_floor_px)`.
pub fn min_vertical_gap(total: f32, params: &AlignmentParams) -> f32 {
    (params.gap_frac * total).min(params.gap_floor_px)
}

/// Check ordering, horizontal co-linearity and proportions, in that order.
pub fn check_alignment(
    triple: &LandmarkTriple,
    max_tooth_width: f32,
    params: &AlignmentParams,
) -> Result<TripleSpans, AlignmentRejection> {
    let spans = TripleSpans::of(triple);
    let LandmarkTriple { cej, bone, apex } = *triple;

    let min_gap = min_vertical_gap(spans.total, params);
    let (cy, by, ay) = (cej.y as f32, bone.y as f32, apex.y as f32);
    if !(cy + min_gap < by && by + min_gap < ay) {
        return Err(AlignmentRejection::Ordering { min_gap });
    }

    let tolerance = (params.x_tolerance_width_frac * max_tooth_width)
        .min(params.x_tolerance_span_frac * spans.total);
    let max_deviation = max_x_deviation(&[cej, bone, apex]);
    if max_deviation > tolerance {
        return Err(AlignmentRejection::HorizontalAlignment {
            max_deviation,
            tolerance,
        });
    }

    let cej_to_bone_ratio = spans.cej_to_bone / spans.total;
    let bone_to_apex_ratio = spans.bone_to_apex / spans.total;
    if !(cej_to_bone_ratio < params.max_cej_to_bone
        && cej_to_bone_ratio > params.min_cej_to_bone
        && bone_to_apex_ratio > params.min_bone_to_apex)
    {
        return Err(AlignmentRejection::Proportions {
            cej_to_bone_ratio,
            bone_to_apex_ratio,
        });
    }

    Ok(spans)
}

/// Boolean form of [`check_alignment`].
pub fn is_plausible(triple: &LandmarkTriple, max_tooth_width: f32, params: &AlignmentParams) -> bool {
    check_alignment(triple, max_tooth_width, params).is_ok()
}

fn max_x_deviation(points: &[PixelPoint]) -> f32 {
    let mean = points.iter().map(|p| p.x as f32).sum::<f32>() / points.len().max(1) as f32;
    points
        .iter()
        .map(|p| (p.x as f32 - mean).abs())
        .fold(0.0, f32::max)
}
