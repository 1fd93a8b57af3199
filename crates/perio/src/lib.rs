//! High-level facade for the `perio-*` workspace.
//!
//! This crate provides:
//! - re-exports of the core buffer types and the landmark detector
//! - bone-loss measurement from a detected CEJ / bone crest / apex triple
//! - (feature `image`) helpers that run the detector on `image` crate types
//!   and render debug overlays
//! - (feature `rayon`) parallel batch reports
//!
//! ## Quickstart
//!
//! ```no_run
//! use perio::detect;
//! use perio::landmarks::LandmarkDetector;
//! use std::path::Path;
//!
//! let detector = LandmarkDetector::default();
//! let report = detect::report_path(Path::new("tooth.png"), &detector, Some(0.04));
//! match &report.bone_loss {
//!     Some(m) => println!("bone loss {:.1}%", m.percent),
//!     None => println!("{}", report.report.warnings.join("; ")),
//! }
//! ```
//!
//! ## API map
//! - `perio::core`: pixel buffers, points, spatial index, logger setup.
//! - `perio::landmarks`: the detection pipeline, its stages and diagnostics.
//! - `perio::measure`: bone-loss measurement.
//! - `perio::detect` (feature `image`): end-to-end helpers from decoded images.
//! - `perio::overlay` (feature `image`): overlay rendering.

pub use perio_core as core;
pub use perio_landmarks as landmarks;

pub use perio_core::{PixelBuffer, PixelFormat, PixelPoint};
pub use perio_landmarks::{
    DetectError, LandmarkDetection, LandmarkDetector, LandmarkDetectorParams, LandmarkReport,
    LandmarkTriple,
};

pub mod batch;
mod error;
pub mod measure;
mod report;

pub use error::PerioError;
pub use measure::BoneLossMeasurement;
pub use report::ImageReport;

#[cfg(feature = "image")]
pub mod detect;
#[cfg(feature = "image")]
pub mod overlay;
