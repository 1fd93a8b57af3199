//! Classical CEJ / bone crest / apex detector for dental radiographs.
//!
//! ## Quickstart
//!
//! ```
//! use perio_core::PixelBuffer;
//! use perio_landmarks::{LandmarkDetector, LandmarkDetectorParams, LandmarkReport};
//!
//! let (w, h) = (64usize, 64usize);
//! let pixels = vec![0u8; w * h];
//! let image = PixelBuffer::gray(w, h, &pixels).unwrap();
//!
//! let detector = LandmarkDetector::new(LandmarkDetectorParams::default());
//! let report = LandmarkReport::from_result("blank.png", w, h, detector.detect(&image));
//! assert!(report.landmarks.is_none());
//! assert!(!report.warnings.is_empty());
//! ```
//!
//! Pipeline, one image at a time:
//! 1. Grayscale conversion, histogram equalization and contrast stretch.
//! 2. Sobel magnitude with non-maximum suppression and dual thresholds.
//! 3. Keep edge points with vertical neighbours inside the central band.
//! 4. Grow vertical segments, keep the best few and merge nearby ones.
//! 5. Partition the pooled points into tooth columns and pick the best.
//! 6. Search the column for the CEJ, bone crest and apex at fixed heights.
//! 7. Reject triples that are out of order, misaligned or badly proportioned.
//!
//! Any stage that comes up short yields a [`DetectError`], which
//! [`LandmarkReport`] turns into a warning list for manual marking.

pub mod alignment;
pub mod diagnostics;
pub mod edges;
pub mod enhance;
pub mod landmarks;
pub mod segments;
pub mod tooth_column;
pub mod vertical_filter;

mod detector;
mod io;

pub use alignment::{check_alignment, AlignmentParams, AlignmentRejection, TripleSpans};
pub use detector::{
    DetectError, LandmarkDebug, LandmarkDetection, LandmarkDetector, LandmarkDetectorParams,
    MANUAL_MARKING_WARNING,
};
pub use diagnostics::{DetectEvent, DiagnosticSink, LogSink, NullSink, RecordingSink, Tee};
pub use io::{LandmarkDetectConfig, LandmarkIoError, LandmarkReport};
pub use landmarks::{LandmarkCandidates, LandmarkKind, LandmarkTriple, ScoredPoint};
pub use tooth_column::ToothColumn;

pub use perio_core::{PixelBuffer, PixelFormat, PixelPoint};
