use perio_core::PixelPoint;
use serde::{Deserialize, Serialize};

use crate::alignment::TripleSpans;
use crate::landmarks::{LandmarkCandidates, LandmarkTriple};
use crate::tooth_column::ToothColumn;

/// Warning appended to every failed detection.
pub const MANUAL_MARKING_WARNING: &str =
    "Could not detect valid landmarks. Please mark them manually.";

/// Intermediate point sets, kept for visual overlays.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkDebug {
    /// Accepted edge points.
    pub edges: Vec<PixelPoint>,
    /// Edge points surviving the vertical-structure filter.
    pub vertical: Vec<PixelPoint>,
    /// Merged segment clusters.
    pub clusters: Vec<Vec<PixelPoint>>,
    /// Selected tooth column.
    pub column: Option<ToothColumn>,
}

/// Output of a successful detection run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkDetection {
    pub landmarks: LandmarkTriple,
    /// Scores of the selected candidates.
    pub candidates: LandmarkCandidates,
    pub spans: TripleSpans,
    /// Image size the coordinates refer to.
    pub width: usize,
    pub height: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<LandmarkDebug>,
}
