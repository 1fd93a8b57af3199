//! JSON configuration and report helpers for landmark detection.

use crate::alignment::AlignmentRejection;
use crate::detector::{
    DetectError, LandmarkDebug, LandmarkDetection, LandmarkDetector, LandmarkDetectorParams,
    MANUAL_MARKING_WARNING,
};
use crate::landmarks::LandmarkTriple;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum LandmarkIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Configuration for a single config-driven detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkDetectConfig {
    pub image_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub overlay_path: Option<String>,
    /// Physical pixel spacing; enables millimetre measurements.
    #[serde(default)]
    pub mm_per_pixel: Option<f32>,
    #[serde(default)]
    pub params: LandmarkDetectorParams,
}

impl LandmarkDetectConfig {
    pub fn new(image_path: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            output_path: None,
            overlay_path: None,
            mm_per_pixel: None,
            params: LandmarkDetectorParams::default(),
        }
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, LandmarkIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), LandmarkIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("landmark_report.json"))
    }

    pub fn build_detector(&self) -> LandmarkDetector {
        LandmarkDetector::new(self.params.clone())
    }
}

/// Per-image outcome in the shape downstream consumers read.
///
/// Exactly one of `landmarks` and a non-empty `warnings` list is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkReport {
    pub image_path: String,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub landmarks: Option<LandmarkTriple>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<AlignmentRejection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<LandmarkDebug>,
}

impl LandmarkReport {
    /// Empty report for an image; no landmarks, no warnings yet.
    pub fn new(image_path: impl Into<String>, width: usize, height: usize) -> Self {
        Self {
            image_path: image_path.into(),
            width,
            height,
            landmarks: None,
            warnings: Vec::new(),
            rejection: None,
            debug: None,
        }
    }

    /// Build a report from a detector outcome.
    pub fn from_result(
        image_path: impl Into<String>,
        width: usize,
        height: usize,
        result: Result<LandmarkDetection, DetectError>,
    ) -> Self {
        let mut report = Self::new(image_path, width, height);
        match result {
            Ok(det) => report.set_detection(det),
            Err(err) => report.set_error(err),
        }
        report
    }

    /// Populate report fields from a successful detection.
    pub fn set_detection(&mut self, det: LandmarkDetection) {
        self.landmarks = Some(det.landmarks);
        self.debug = det.debug;
        self.warnings.clear();
        self.rejection = None;
    }

    /// Record a detection shortfall and the manual-marking notice.
    pub fn set_error(&mut self, err: DetectError) {
        self.landmarks = None;
        if let DetectError::Rejected(reason) = &err {
            self.rejection = Some(*reason);
        }
        self.warnings.push(err.to_string());
        self.warnings.push(MANUAL_MARKING_WARNING.to_string());
    }

    /// Record an arbitrary failure, such as an unreadable image.
    pub fn set_failure(&mut self, message: impl Into<String>) {
        self.landmarks = None;
        self.warnings.push(message.into());
        self.warnings.push(MANUAL_MARKING_WARNING.to_string());
    }

    pub fn is_detected(&self) -> bool {
        self.landmarks.is_some()
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, LandmarkIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), LandmarkIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_report_ends_with_manual_marking_notice() {
        let report = LandmarkReport::from_result("a.png", 10, 10, Err(DetectError::NoEdges));
        assert!(!report.is_detected());
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.warnings[0], "no edges found");
        assert_eq!(report.warnings.last().map(String::as_str), Some(MANUAL_MARKING_WARNING));
    }

    #[test]
    fn rejection_reason_is_kept() {
        let reason = AlignmentRejection::Ordering { min_gap: 10.0 };
        let report =
            LandmarkReport::from_result("a.png", 200, 256, Err(DetectError::Rejected(reason)));
        assert_eq!(report.rejection, Some(reason));
    }

    #[test]
    fn config_defaults_when_fields_are_missing() {
        let cfg: LandmarkDetectConfig =
            serde_json::from_str(r#"{ "image_path": "x.png" }"#).expect("parse");
        assert_eq!(cfg.params, LandmarkDetectorParams::default());
        assert_eq!(cfg.output_path(), PathBuf::from("landmark_report.json"));
        assert!(cfg.mm_per_pixel.is_none());
    }
}
