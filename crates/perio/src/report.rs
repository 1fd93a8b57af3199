use perio_landmarks::LandmarkReport;
use serde::{Deserialize, Serialize};

use crate::measure::BoneLossMeasurement;

/// Landmark report enriched with the bone-loss measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageReport {
    #[serde(flatten)]
    pub report: LandmarkReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bone_loss: Option<BoneLossMeasurement>,
}

impl ImageReport {
    /// Attach a measurement when the report carries landmarks.
    pub fn new(report: LandmarkReport, mm_per_pixel: Option<f32>) -> Self {
        let bone_loss = report
            .landmarks
            .as_ref()
            .and_then(|t| BoneLossMeasurement::from_triple(t, mm_per_pixel));
        Self { report, bone_loss }
    }

    pub fn is_detected(&self) -> bool {
        self.report.is_detected()
    }
}
