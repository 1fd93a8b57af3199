//! Landmark detection pipeline.
//!
//! This module wires the seven stages together: contrast enhancement, edge
//! detection, vertical-structure filtering, segment growing, tooth column
//! selection, landmark search and alignment validation.

mod error;
mod params;
mod pipeline;
mod result;

pub use error::DetectError;
pub use params::LandmarkDetectorParams;
pub use pipeline::LandmarkDetector;
pub use result::{LandmarkDebug, LandmarkDetection, MANUAL_MARKING_WARNING};
