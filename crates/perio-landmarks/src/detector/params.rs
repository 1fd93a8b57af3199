use serde::{Deserialize, Serialize};

use crate::alignment::AlignmentParams;
use crate::edges::EdgeParams;
use crate::enhance::EnhanceParams;
use crate::landmarks::LandmarkSearchParams;
use crate::segments::SegmentParams;
use crate::tooth_column::ToothColumnParams;
use crate::vertical_filter::VerticalFilterParams;

/// Configuration for the landmark detector.
///
/// Every multiplier in the pipeline is exposed here so it can be recalibrated
/// per imaging device. Missing JSON fields fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkDetectorParams {
    /// Images with a side shorter than this are rejected up front.
    pub min_image_side: usize,
    /// Edge-point cap; noisier images are reported as a shortfall instead of
    /// spending quadratic time in the neighbour searches.
    pub max_edge_points: usize,
    /// Keep intermediate point sets in the result for overlays.
    pub collect_debug: bool,
    pub enhance: EnhanceParams,
    pub edges: EdgeParams,
    pub vertical: VerticalFilterParams,
    pub segments: SegmentParams,
    pub columns: ToothColumnParams,
    pub landmarks: LandmarkSearchParams,
    pub alignment: AlignmentParams,
}

impl Default for LandmarkDetectorParams {
    fn default() -> Self {
        Self {
            min_image_side: 16,
            max_edge_points: 60_000,
            collect_debug: false,
            enhance: EnhanceParams::default(),
            edges: EdgeParams::default(),
            vertical: VerticalFilterParams::default(),
            segments: SegmentParams::default(),
            columns: ToothColumnParams::default(),
            landmarks: LandmarkSearchParams::default(),
            alignment: AlignmentParams::default(),
        }
    }
}

impl LandmarkDetectorParams {
    /// Defaults with debug collection switched on.
    pub fn with_debug() -> Self {
        Self {
            collect_debug: true,
            ..Self::default()
        }
    }
}
